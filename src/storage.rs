//! Trajectory files and the reference ("best path") store.
//!
//! Trajectories are stored as CSV with a fixed column order, raw channels
//! first and derived channels after:
//!
//! ```text
//! ax,ay,az,gx,gy,gz,ax_m,ay_m,az_m,vx,vy,vz,px,py,pz
//! ```
//!
//! Files whose name ends in `.gz` are gzip-compressed transparently.
//! Reading locates columns by header name, so files written by other tools
//! with extra or reordered columns still load; writing always uses the order
//! above.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{info, warn};

use crate::error::{CoachError, Result};
use crate::types::{Point3, RawSample, Trajectory, TrajectoryPoint};

pub const COLUMNS: [&str; 15] = [
    "ax", "ay", "az", "gx", "gy", "gz", "ax_m", "ay_m", "az_m", "vx", "vy", "vz", "px", "py", "pz",
];

pub const REFERENCE_FILE: &str = "best_path.csv";

fn is_gzip(path: &Path) -> bool {
    path.extension().map(|e| e == "gz").unwrap_or(false)
}

fn point_row(p: &TrajectoryPoint) -> [f64; 15] {
    let r = &p.raw;
    [
        r.ax, r.ay, r.az, r.gx, r.gy, r.gz,
        p.accel.x, p.accel.y, p.accel.z,
        p.velocity.x, p.velocity.y, p.velocity.z,
        p.position.x, p.position.y, p.position.z,
    ]
}

fn row_point(row: &[f64; 15]) -> TrajectoryPoint {
    TrajectoryPoint {
        raw: RawSample::new(row[0], row[1], row[2], row[3], row[4], row[5]),
        accel: Point3::new(row[6], row[7], row[8]),
        velocity: Point3::new(row[9], row[10], row[11]),
        position: Point3::new(row[12], row[13], row[14]),
    }
}

pub fn write_trajectory_csv<W: Write>(mut writer: W, trajectory: &Trajectory) -> Result<()> {
    writeln!(writer, "{}", COLUMNS.join(","))?;
    for point in trajectory.points() {
        let cells: Vec<String> = point_row(point).iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{}", cells.join(","))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_trajectory_csv<R: BufRead>(reader: R) -> Result<Trajectory> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(CoachError::storage("empty trajectory file")),
    };

    let positions: HashMap<&str, usize> = header
        .trim()
        .split(',')
        .enumerate()
        .map(|(i, name)| (name.trim(), i))
        .collect();
    let mut column_index = [0usize; 15];
    for (slot, name) in column_index.iter_mut().zip(COLUMNS.iter()) {
        *slot = *positions
            .get(name)
            .ok_or_else(|| CoachError::storage(format!("missing column {}", name)))?;
    }

    let mut points = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').collect();
        let mut row = [0.0; 15];
        for (value, (&idx, name)) in row.iter_mut().zip(column_index.iter().zip(COLUMNS.iter())) {
            let cell = cells.get(idx).ok_or_else(|| {
                CoachError::storage(format!("line {}: missing {} cell", line_no + 2, name))
            })?;
            *value = cell.trim().parse::<f64>().map_err(|e| {
                CoachError::storage(format!(
                    "line {}: bad {} value {:?}: {}",
                    line_no + 2,
                    name,
                    cell,
                    e
                ))
            })?;
        }
        points.push(row_point(&row));
    }

    if points.is_empty() {
        return Err(CoachError::storage("trajectory file has no rows"));
    }
    Trajectory::from_points(points)
}

/// Write a trajectory to disk, gzip-compressed for `*.gz` paths
pub fn save_trajectory(path: impl AsRef<Path>, trajectory: &Trajectory) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_trajectory_csv(&mut encoder, trajectory)?;
        encoder.finish()?.flush()?;
    } else {
        write_trajectory_csv(BufWriter::new(file), trajectory)?;
    }
    Ok(())
}

pub fn load_trajectory(path: impl AsRef<Path>) -> Result<Trajectory> {
    let path = path.as_ref();
    let file = File::open(path)?;
    if is_gzip(path) {
        read_trajectory_csv(BufReader::new(GzDecoder::new(file)))
    } else {
        read_trajectory_csv(BufReader::new(file))
    }
}

/// Data folder holding every saved throw plus the current reference
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    dir: PathBuf,
}

impl ReferenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn reference_path(&self) -> PathBuf {
        self.dir.join(REFERENCE_FILE)
    }

    pub fn has_reference(&self) -> bool {
        self.reference_path().exists()
    }

    /// `Ok(None)` when no reference has been accepted yet
    pub fn load_reference(&self) -> Result<Option<Trajectory>> {
        let path = self.reference_path();
        if !path.exists() {
            return Ok(None);
        }
        let trajectory = load_trajectory(&path)?;
        info!("loaded reference {} ({} samples)", path.display(), trajectory.len());
        Ok(Some(trajectory))
    }

    /// Replace the reference. Written to a temp file first so a crash never
    /// leaves a half-written reference behind.
    pub fn promote(&self, trajectory: &Trajectory) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.reference_path();
        let tmp = self.dir.join(format!("{}.tmp", REFERENCE_FILE));
        save_trajectory(&tmp, trajectory)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            warn!("could not move {} into place: {}", tmp.display(), e);
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!("reference updated ({} samples)", trajectory.len());
        Ok(path)
    }

    pub fn throw_path(&self, timestamp: &DateTime<Local>) -> PathBuf {
        self.dir
            .join(format!("throw_{}.csv", timestamp.format("%Y%m%d_%H%M%S")))
    }

    pub fn save_throw(
        &self,
        trajectory: &Trajectory,
        timestamp: &DateTime<Local>,
    ) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.throw_path(timestamp);
        save_trajectory(&path, trajectory)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoachConfig;
    use crate::reconstruction::reconstruct_trajectory;
    use crate::types::RawSequence;
    use chrono::TimeZone;
    use std::io::Cursor;

    fn sample_trajectory() -> Trajectory {
        let mut samples = vec![RawSample::new(0.0, 0.0, 1.0, 0.1, 0.2, 0.3); 10];
        for i in 0..20 {
            samples.push(RawSample::new(0.1 * i as f64, -0.05, 1.2, 1.0, 2.0, 3.0));
        }
        let sequence = RawSequence::new(samples).unwrap();
        reconstruct_trajectory(&sequence, &CoachConfig::default()).unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("bowling_coach_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_header_order() {
        let mut out = Vec::new();
        write_trajectory_csv(&mut out, &sample_trajectory()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "ax,ay,az,gx,gy,gz,ax_m,ay_m,az_m,vx,vy,vz,px,py,pz"
        );
        assert_eq!(text.lines().count(), 31);
    }

    #[test]
    fn test_csv_round_trip_is_exact() {
        let traj = sample_trajectory();
        let mut out = Vec::new();
        write_trajectory_csv(&mut out, &traj).unwrap();
        let back = read_trajectory_csv(Cursor::new(out)).unwrap();
        assert_eq!(back, traj);
    }

    #[test]
    fn test_reads_reordered_columns_with_extras() {
        let text = "pz,py,px,note,vz,vy,vx,az_m,ay_m,ax_m,gz,gy,gx,az,ay,ax\n\
                    3,2,1,0,0,0,0,0,0,0,0,0,0,1,0,0\n";
        let traj = read_trajectory_csv(Cursor::new(text)).unwrap();
        assert_eq!(traj.len(), 1);
        assert_eq!(traj.points()[0].position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(traj.points()[0].raw.az, 1.0);
    }

    #[test]
    fn test_missing_column_rejected() {
        let text = "ax,ay,az,gx,gy,gz,ax_m,ay_m,az_m,vx,vy,vz,px,py\n0,0,0,0,0,0,0,0,0,0,0,0,0,0\n";
        let err = read_trajectory_csv(Cursor::new(text)).unwrap_err();
        assert!(err.to_string().contains("pz"));
    }

    #[test]
    fn test_bad_cell_and_empty_file_rejected() {
        let bad = format!("{}\n0,0,0,0,0,0,0,0,0,0,0,0,0,oops,0\n", COLUMNS.join(","));
        let err = read_trajectory_csv(Cursor::new(bad)).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        assert!(read_trajectory_csv(Cursor::new("")).is_err());
        assert!(read_trajectory_csv(Cursor::new(format!("{}\n", COLUMNS.join(",")))).is_err());
    }

    #[test]
    fn test_gzip_round_trip() {
        let dir = scratch_dir("gz");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("throw.csv.gz");
        let traj = sample_trajectory();
        save_trajectory(&path, &traj).unwrap();
        assert_eq!(load_trajectory(&path).unwrap(), traj);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_reference_store_promote_replaces() {
        let store = ReferenceStore::new(scratch_dir("store"));
        assert!(store.load_reference().unwrap().is_none());

        let first = sample_trajectory();
        store.promote(&first).unwrap();
        assert!(store.has_reference());
        assert_eq!(store.load_reference().unwrap().unwrap(), first);

        let second = Trajectory::from_points(first.points()[..12].to_vec()).unwrap();
        store.promote(&second).unwrap();
        assert_eq!(store.load_reference().unwrap().unwrap().len(), 12);
        assert!(!store.dir().join("best_path.csv.tmp").exists());

        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_throw_path_format() {
        let store = ReferenceStore::new("bowling_data");
        let ts = Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(
            store.throw_path(&ts),
            PathBuf::from("bowling_data").join("throw_20250314_092653.csv")
        );
    }
}
