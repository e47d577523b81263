use anyhow::Result;
use rerun::{
    archetypes::{LineStrips3D, Points3D, Scalar},
    Color, RecordingStreamBuilder,
};

use crate::session::ThrowAnalysis;
use crate::types::Point3;

fn current_color() -> Color {
    Color::from_rgb(230, 80, 60)
}

fn reference_color() -> Color {
    Color::from_rgb(60, 140, 230)
}

/// Rerun 3D visualization of throws against the reference
/// Supports Rerun v0.15+ API with archetype-based logging
pub struct RerunLogger {
    rec: rerun::RecordingStream,
}

impl RerunLogger {
    /// Initialize Rerun recording to file
    /// Takes output path (e.g., "bowling_data/throw_20250314_092653.rrd")
    pub fn new(output_path: &str) -> Result<Self> {
        let rec = RecordingStreamBuilder::new("bowling_coach")
            .save(output_path)
            .map_err(|e| anyhow::anyhow!("Failed to create Rerun recording: {}", e))?;

        log::info!("rerun recording initialized to {}", output_path);

        Ok(RerunLogger { rec })
    }

    /// Set the throw index for all subsequent logs
    pub fn set_throw(&self, index: i64) {
        self.rec.set_time_sequence("throw", index);
    }

    pub fn log_scalar(&self, path: &str, value: f64) {
        let _ = self.rec.log(path, &Scalar::new(value));
    }

    /// Log a 3D path as a line strip with its endpoints marked
    pub fn log_trajectory(&self, path: &str, positions: &[Point3], color: Color) -> Result<()> {
        if positions.is_empty() {
            return Ok(());
        }
        let strip: Vec<[f32; 3]> = positions
            .iter()
            .map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect();
        let endpoints = [strip[0], strip[strip.len() - 1]];

        self.rec
            .log(path, &LineStrips3D::new([strip]).with_colors([color]))
            .map_err(|e| anyhow::anyhow!("rerun log {}: {}", path, e))?;
        self.rec
            .log(
                format!("{}/endpoints", path),
                &Points3D::new(endpoints).with_colors([color]).with_radii([0.05_f32]),
            )
            .map_err(|e| anyhow::anyhow!("rerun log {}/endpoints: {}", path, e))?;
        Ok(())
    }

    /// Log a throw, its reference overlay and its score
    pub fn log_analysis(&self, analysis: &ThrowAnalysis) -> Result<()> {
        self.log_trajectory("throw/current", &analysis.plot_positions(), current_color())?;
        if let Some(comparison) = &analysis.comparison {
            self.log_trajectory(
                "throw/reference",
                &comparison.alignment.truncated_reference,
                reference_color(),
            )?;
            self.log_scalar("score/mse", comparison.alignment.score());
            self.log_scalar("score/advisories", comparison.report.advisory_count() as f64);
        }
        Ok(())
    }
}
