use log::{debug, info};
use serde::Serialize;

use crate::alignment::{AlignmentResult, AlignmentScorer, ScoreOutcome};
use crate::coaching::{AdvisoryReport, CoachingAnalyzer};
use crate::config::CoachConfig;
use crate::error::Result;
use crate::reconstruction::TrajectoryReconstructor;
use crate::types::{point_to_array, Point3, RawSequence, Trajectory};

/// Alignment plus coaching for one throw against the reference
#[derive(Debug, Clone)]
pub struct Comparison {
    pub alignment: AlignmentResult,
    pub report: AdvisoryReport,
}

/// Everything produced for one recorded throw
#[derive(Debug, Clone)]
pub struct ThrowAnalysis {
    pub trajectory: Trajectory,
    /// `None` when no reference has been accepted yet
    pub comparison: Option<Comparison>,
}

impl ThrowAnalysis {
    /// Positions to draw: the aligned prefix when compared, else the raw path
    pub fn plot_positions(&self) -> Vec<Point3> {
        match &self.comparison {
            Some(c) => c.alignment.aligned_current.clone(),
            None => self.trajectory.positions(),
        }
    }

    pub fn summary(&self) -> ThrowSummary {
        ThrowSummary {
            samples: self.trajectory.len(),
            path_length: self.trajectory.path_length(),
            final_position: point_to_array(&self.trajectory.final_position()),
            compared_samples: self.comparison.as_ref().map(|c| c.alignment.len()),
            score: self.comparison.as_ref().map(|c| c.alignment.outcome),
            report: self.comparison.as_ref().map(|c| c.report.clone()),
        }
    }
}

/// Serializable digest of a [`ThrowAnalysis`]
#[derive(Debug, Clone, Serialize)]
pub struct ThrowSummary {
    pub samples: usize,
    pub path_length: f64,
    pub final_position: [f64; 3],
    pub compared_samples: Option<usize>,
    pub score: Option<ScoreOutcome>,
    pub report: Option<AdvisoryReport>,
}

/// Coaching session: the configured pipeline plus the current reference.
///
/// Throws are analysed independently against whichever reference was most
/// recently accepted. Accepting a throw swaps the reference wholesale.
pub struct Session {
    config: CoachConfig,
    reconstructor: TrajectoryReconstructor,
    scorer: AlignmentScorer,
    analyzer: CoachingAnalyzer,
    reference: Option<Trajectory>,
}

impl Session {
    pub fn new(config: CoachConfig, reference: Option<Trajectory>) -> Self {
        Self {
            reconstructor: TrajectoryReconstructor::new(&config),
            scorer: AlignmentScorer::new(&config),
            analyzer: CoachingAnalyzer::new(&config),
            config,
            reference,
        }
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn reference(&self) -> Option<&Trajectory> {
        self.reference.as_ref()
    }

    /// Reconstruct a throw and, if a reference exists, score and coach it.
    ///
    /// A failed alignment does not fail the call: the comparison carries a
    /// [`ScoreOutcome::Failed`] and the coaching runs on the unaligned path.
    pub fn analyze(&self, sequence: &RawSequence) -> Result<ThrowAnalysis> {
        let trajectory = self.reconstructor.reconstruct(sequence)?;
        debug!("reconstructed {} samples", trajectory.len());

        let comparison = match &self.reference {
            Some(reference) => {
                let alignment = self.scorer.score(&trajectory, reference);
                let report = self
                    .analyzer
                    .analyze(&alignment.aligned_current, &alignment.truncated_reference)?;
                info!(
                    "compared {} samples, score {:.4}{}",
                    alignment.len(),
                    alignment.score(),
                    if alignment.outcome.is_failure() { " (alignment failed)" } else { "" }
                );
                Some(Comparison { alignment, report })
            }
            None => None,
        };

        Ok(ThrowAnalysis {
            trajectory,
            comparison,
        })
    }

    /// Make `trajectory` the new reference, returning the one it replaces
    pub fn accept(&mut self, trajectory: Trajectory) -> Option<Trajectory> {
        info!("accepting {}-sample throw as reference", trajectory.len());
        self.reference.replace(trajectory)
    }
}
