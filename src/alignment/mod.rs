/// Trajectory alignment
///
/// Rigid (rotation + translation, no scale) superposition of a recorded throw
/// onto the reference, and the MSE score of what is left over.

pub mod kabsch;
pub mod scoring;

pub use kabsch::{centroid, cross_covariance, kabsch, RigidTransform};
pub use scoring::{
    align_and_score, mean_squared_error, AlignmentResult, AlignmentScorer, ScoreOutcome,
};
