use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{error, info, warn};

use bowling_coach_rs::config::CoachConfig;
use bowling_coach_rs::error::CoachError;
use bowling_coach_rs::recording::{RecordingEvent, RecordingParser};
use bowling_coach_rs::session::{Session, ThrowAnalysis};
use bowling_coach_rs::storage::ReferenceStore;
use bowling_coach_rs::types::RawSequence;

#[derive(Parser, Debug)]
#[command(name = "bowling_coach")]
#[command(about = "IMU bowling coach - compare each throw against your best one")]
struct Args {
    /// Recorded sensor stream (START_RECORDING/STOP_RECORDING framed). Reads stdin if omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Folder for saved throws and the reference (best_path.csv)
    #[arg(long, default_value = "bowling_data")]
    data_dir: PathBuf,

    /// JSON config file (missing keys fall back to defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Accept every analysed throw as the new reference
    #[arg(long, default_value_t = false)]
    accept: bool,

    /// Ask after each throw whether to accept it (needs --input)
    #[arg(long, default_value_t = false, conflicts_with = "accept", requires = "input")]
    interactive: bool,

    /// Print one JSON summary per throw instead of the text report
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Lateral (X) deviation threshold
    #[arg(long)]
    threshold_x: Option<f64>,

    /// Vertical (Z) deviation threshold
    #[arg(long)]
    threshold_z: Option<f64>,

    /// Sample interval in seconds
    #[arg(long)]
    dt: Option<f64>,

    /// Write a Rerun recording of every throw to this .rrd file
    #[cfg(feature = "viz")]
    #[arg(long)]
    rerun: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = build_config(&args)?;
    let store = ReferenceStore::new(&args.data_dir);
    store
        .ensure_dir()
        .with_context(|| format!("creating {}", args.data_dir.display()))?;

    let reference = match store.load_reference() {
        Ok(reference) => reference,
        Err(e) => {
            warn!("ignoring unreadable reference {}: {}", store.reference_path().display(), e);
            None
        }
    };
    if reference.is_none() {
        info!("no reference yet, the first accepted throw becomes the reference");
    }
    let mut session = Session::new(config, reference);

    #[cfg(feature = "viz")]
    let viz = match &args.rerun {
        Some(path) => Some(bowling_coach_rs::rerun_logger::RerunLogger::new(
            &path.to_string_lossy(),
        )?),
        None => None,
    };

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let source = args
        .input
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdin".into());
    info!("waiting for {} ...", source);

    let mut parser = RecordingParser::from_config(session.config());
    let mut throws = 0usize;
    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        let event = match parser.feed_line(&line) {
            Some(event) => event,
            None => continue,
        };
        let sequence = match event {
            RecordingEvent::Complete { sequence, .. } => sequence,
            RecordingEvent::TooShort { lines } => {
                warn!("recording too short ({} lines), skipped", lines);
                continue;
            }
            RecordingEvent::Empty { malformed } => {
                warn!("recording had no valid samples ({} malformed lines), skipped", malformed);
                continue;
            }
        };

        throws += 1;
        let analysis = match handle_throw(&mut session, &store, &sequence, &args) {
            Ok(analysis) => analysis,
            Err(e) => {
                if is_recoverable(&e) {
                    warn!("throw {} skipped: {:#}", throws, e);
                } else {
                    error!("throw {} failed: {:#}", throws, e);
                }
                continue;
            }
        };

        #[cfg(feature = "viz")]
        if let Some(viz) = &viz {
            viz.set_throw(throws as i64);
            if let Err(e) = viz.log_analysis(&analysis) {
                warn!("rerun logging failed: {}", e);
            }
        }
        #[cfg(not(feature = "viz"))]
        let _ = analysis;
    }

    if parser.is_recording() {
        warn!("input ended mid-recording, {} lines discarded", parser.buffered());
    }
    info!("processed {} throws", throws);
    Ok(())
}

fn build_config(args: &Args) -> Result<CoachConfig> {
    let mut config = match &args.config {
        Some(path) => CoachConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CoachConfig::default(),
    };
    if let Some(dt) = args.dt {
        config = config.with_dt(dt);
    }
    if args.threshold_x.is_some() || args.threshold_z.is_some() {
        let x = args.threshold_x.unwrap_or(config.threshold_x);
        let z = args.threshold_z.unwrap_or(config.threshold_z);
        config = config.with_thresholds(x, z);
    }
    config.validate()?;
    Ok(config)
}

fn handle_throw(
    session: &mut Session,
    store: &ReferenceStore,
    sequence: &RawSequence,
    args: &Args,
) -> Result<ThrowAnalysis> {
    let analysis = session.analyze(sequence)?;
    let saved = store.save_throw(&analysis.trajectory, &Local::now())?;
    info!("saved {}", saved.display());

    if args.json {
        println!("{}", serde_json::to_string(&analysis.summary())?);
    } else {
        print_report(&analysis);
    }

    let accept = if args.accept {
        true
    } else if args.interactive {
        prompt_accept()?
    } else {
        false
    };
    if accept {
        store.promote(&analysis.trajectory)?;
        session.accept(analysis.trajectory.clone());
    }
    Ok(analysis)
}

/// Pipeline errors on a single bad throw; anything else (disk, config) is not
fn is_recoverable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<CoachError>()
        .map(CoachError::is_recoverable)
        .unwrap_or(false)
}

fn print_report(analysis: &ThrowAnalysis) {
    let traj = &analysis.trajectory;
    let end = traj.final_position();
    println!(
        "Throw: {} samples, path {:.2} m, end ({:.2}, {:.2}, {:.2})",
        traj.len(),
        traj.path_length(),
        end.x,
        end.y,
        end.z
    );
    match &analysis.comparison {
        Some(c) => {
            if c.alignment.outcome.is_failure() {
                println!("Score: {:.1} (alignment failed)", c.alignment.score());
            } else {
                println!(
                    "Score (MSE): {:.4} over {} samples",
                    c.alignment.score(),
                    c.alignment.len()
                );
            }
            println!("{}", c.report);
        }
        None => println!("No reference throw yet"),
    }
}

fn prompt_accept() -> Result<bool> {
    print!("Save this as your new best throw? [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
