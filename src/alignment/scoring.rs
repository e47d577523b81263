use log::warn;
use serde::{Deserialize, Serialize};

use super::kabsch::{kabsch, RigidTransform};
use crate::config::CoachConfig;
use crate::error::CoachError;
use crate::types::{Point3, Trajectory};

/// Score of one comparison: a real MSE, or the sentinel stand-in after a
/// failed alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "score", rename_all = "snake_case")]
pub enum ScoreOutcome {
    Computed(f64),
    Failed(f64),
}

impl ScoreOutcome {
    pub fn value(&self) -> f64 {
        match self {
            ScoreOutcome::Computed(v) | ScoreOutcome::Failed(v) => *v,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ScoreOutcome::Failed(_))
    }
}

/// Output of comparing a throw against the reference.
///
/// Both point lists have length `min(len(current), len(reference))`.
/// On failure `aligned_current` is the truncated current trajectory, unmoved,
/// and `transform` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub outcome: ScoreOutcome,
    pub transform: Option<RigidTransform>,
    pub aligned_current: Vec<Point3>,
    pub truncated_reference: Vec<Point3>,
}

impl AlignmentResult {
    pub fn score(&self) -> f64 {
        self.outcome.value()
    }

    pub fn len(&self) -> usize {
        self.aligned_current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligned_current.is_empty()
    }
}

/// Mean over points of the squared Euclidean distance
pub fn mean_squared_error(a: &[Point3], b: &[Point3]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(pa, pb)| (pa - pb).norm_squared())
        .sum();
    sum_sq / n as f64
}

/// Truncates both trajectories to their common prefix, aligns current onto
/// reference and reduces the residual to an MSE.
///
/// Correspondence is by sample index: no resampling or time warping, so the
/// two throws are assumed to be sampled comparably from the button press on.
#[derive(Clone, Debug)]
pub struct AlignmentScorer {
    sentinel_score: f64,
}

impl AlignmentScorer {
    pub fn new(config: &CoachConfig) -> Self {
        Self {
            sentinel_score: config.sentinel_score,
        }
    }

    pub fn score(&self, current: &Trajectory, reference: &Trajectory) -> AlignmentResult {
        let n = current.len().min(reference.len());
        self.score_positions(&current.leading_positions(n), &reference.leading_positions(n))
    }

    /// Same as [`score`](Self::score) on bare position lists. Never fails:
    /// alignment errors come back as [`ScoreOutcome::Failed`].
    pub fn score_positions(&self, current: &[Point3], reference: &[Point3]) -> AlignmentResult {
        let n = current.len().min(reference.len());
        let current = &current[..n];
        let reference = &reference[..n];

        let aligned = kabsch(current, reference).and_then(|transform| {
            let aligned_current = transform.apply_all(current);
            let mse = mean_squared_error(&aligned_current, reference);
            if mse.is_finite() {
                Ok((transform, aligned_current, mse))
            } else {
                Err(CoachError::alignment(format!("non-finite residual {}", mse)))
            }
        });

        match aligned {
            Ok((transform, aligned_current, mse)) => AlignmentResult {
                outcome: ScoreOutcome::Computed(mse),
                transform: Some(transform),
                aligned_current,
                truncated_reference: reference.to_vec(),
            },
            Err(e) => {
                warn!("alignment failed over {} samples: {}", n, e);
                AlignmentResult {
                    outcome: ScoreOutcome::Failed(self.sentinel_score),
                    transform: None,
                    aligned_current: current.to_vec(),
                    truncated_reference: reference.to_vec(),
                }
            }
        }
    }
}

/// Convenience wrapper around [`AlignmentScorer::score`]
pub fn align_and_score(
    current: &Trajectory,
    reference: &Trajectory,
    config: &CoachConfig,
) -> AlignmentResult {
    AlignmentScorer::new(config).score(current, reference)
}
