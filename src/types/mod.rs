pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};

use crate::error::{CoachError, Result};

/// One line of IMU output: acceleration in g-units, angular rate in sensor units
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
}

impl RawSample {
    pub fn new(ax: f64, ay: f64, az: f64, gx: f64, gy: f64, gz: f64) -> Self {
        Self {
            ax,
            ay,
            az,
            gx,
            gy,
            gz,
        }
    }

    /// Accelerometer-only sample with a silent gyro
    pub fn accel_only(ax: f64, ay: f64, az: f64) -> Self {
        Self::new(ax, ay, az, 0.0, 0.0, 0.0)
    }

    pub fn from_fields(fields: [f64; 6]) -> Self {
        let [ax, ay, az, gx, gy, gz] = fields;
        Self::new(ax, ay, az, gx, gy, gz)
    }

    pub fn fields(&self) -> [f64; 6] {
        [self.ax, self.ay, self.az, self.gx, self.gy, self.gz]
    }

    pub fn accel(&self) -> Point3 {
        Point3::new(self.ax, self.ay, self.az)
    }

    pub fn gyro(&self) -> Point3 {
        Point3::new(self.gx, self.gy, self.gz)
    }
}

/// Ordered samples of one recorded throw at a fixed sampling interval.
/// Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSequence {
    samples: Vec<RawSample>,
}

impl RawSequence {
    pub fn new(samples: Vec<RawSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(CoachError::insufficient_data(1, 0));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawSample> {
        self.samples.iter()
    }
}

/// All channels derived for one sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectoryPoint {
    pub raw: RawSample,
    /// Bias-corrected acceleration in m/s² (ax_m, ay_m, az_m)
    pub accel: Point3,
    pub velocity: Point3,
    pub position: Point3,
}

/// Reconstructed motion of one throw, one point per raw sample.
///
/// Built in one go by the reconstructor or the storage loader; there is no
/// way to grow or edit it afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn from_points(points: Vec<TrajectoryPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(CoachError::insufficient_data(1, 0));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position channel (px, py, pz)
    pub fn positions(&self) -> Vec<Point3> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// First `n` positions (or all of them if shorter)
    pub fn leading_positions(&self, n: usize) -> Vec<Point3> {
        self.points.iter().take(n).map(|p| p.position).collect()
    }

    pub fn final_position(&self) -> Point3 {
        self.points
            .last()
            .map(|p| p.position)
            .unwrap_or_else(Point3::zeros)
    }

    /// Sum of straight-line distances between consecutive positions
    pub fn path_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].position - w[0].position).norm())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(x: f64) -> TrajectoryPoint {
        TrajectoryPoint {
            raw: RawSample::accel_only(0.0, 0.0, 1.0),
            accel: Point3::zeros(),
            velocity: Point3::zeros(),
            position: Point3::new(x, 0.0, 0.0),
        }
    }

    #[test]
    fn test_sample_fields_round_trip() {
        let sample = RawSample::new(0.1, -0.2, 1.0, 3.0, 4.0, 5.0);
        assert_eq!(RawSample::from_fields(sample.fields()), sample);
        assert_eq!(sample.accel(), Point3::new(0.1, -0.2, 1.0));
        assert_eq!(sample.gyro(), Point3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert!(RawSequence::new(Vec::new()).is_err());
        let seq = RawSequence::new(vec![RawSample::accel_only(0.0, 0.0, 1.0)]).unwrap();
        assert_eq!(seq.len(), 1);
        assert!(!seq.is_empty());
    }

    #[test]
    fn test_empty_trajectory_rejected() {
        assert!(Trajectory::from_points(Vec::new()).is_err());
    }

    #[test]
    fn test_positions_and_path_length() {
        let points = vec![point_at(0.0), point_at(1.0), point_at(3.0)];
        let traj = Trajectory::from_points(points).unwrap();
        assert_eq!(traj.positions().len(), 3);
        assert_eq!(traj.leading_positions(2).len(), 2);
        assert_eq!(traj.leading_positions(10).len(), 3);
        assert_eq!(traj.final_position(), Point3::new(3.0, 0.0, 0.0));
        assert!((traj.path_length() - 3.0).abs() < 1e-12);
    }
}
