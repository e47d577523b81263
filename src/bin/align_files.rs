use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use bowling_coach_rs::alignment::AlignmentScorer;
use bowling_coach_rs::coaching::CoachingAnalyzer;
use bowling_coach_rs::config::CoachConfig;
use bowling_coach_rs::storage::load_trajectory;
use bowling_coach_rs::types::point_to_array;

/// Align a saved throw onto a saved reference and print score and advisories
#[derive(Parser, Debug)]
struct Args {
    /// Throw CSV (.csv or .csv.gz)
    current: PathBuf,

    /// Reference CSV, usually bowling_data/best_path.csv
    reference: PathBuf,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CoachConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CoachConfig::default(),
    };
    let current = load_trajectory(&args.current)
        .with_context(|| format!("reading {}", args.current.display()))?;
    let reference = load_trajectory(&args.reference)
        .with_context(|| format!("reading {}", args.reference.display()))?;

    let alignment = AlignmentScorer::new(&config).score(&current, &reference);
    let report = CoachingAnalyzer::new(&config)
        .analyze(&alignment.aligned_current, &alignment.truncated_reference)?;

    if args.json {
        let out = json!({
            "current": args.current.display().to_string(),
            "reference": args.reference.display().to_string(),
            "compared_samples": alignment.len(),
            "score": alignment.outcome,
            "translation": alignment.transform.as_ref().map(|t| point_to_array(&t.translation)),
            "rotation_deg": alignment.transform.as_ref().map(|t| t.rotation_angle().to_degrees()),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("current:   {} ({} samples)", args.current.display(), current.len());
    println!("reference: {} ({} samples)", args.reference.display(), reference.len());
    match &alignment.transform {
        Some(t) => println!(
            "rotation {:.2}°, translation ({:.3}, {:.3}, {:.3})",
            t.rotation_angle().to_degrees(),
            t.translation.x,
            t.translation.y,
            t.translation.z
        ),
        None => println!("alignment failed, comparing unaligned paths"),
    }
    println!("score: {:.4} over {} samples", alignment.score(), alignment.len());
    println!("{}", report);
    Ok(())
}
