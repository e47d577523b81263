//! Bowling throw coach.
//!
//! Reconstructs the 3D path of a throw from a body-worn IMU, rigidly aligns
//! it onto an accepted "best" throw (Kabsch), scores the residual as a mean
//! squared error and turns per-phase deviations into coaching advisories.
//!
//! ```text
//! lines ──► recording ──► reconstruction ──► alignment ──► coaching
//!                               │                │
//!                               └──► storage ◄───┘ (reference)
//! ```
//!
//! [`session::Session`] ties the stages together; the `bowling_coach` binary
//! drives it from a file or stdin.

pub mod alignment;
pub mod coaching;
pub mod config;
pub mod error;
pub mod reconstruction;
pub mod recording;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(feature = "viz")]
pub mod rerun_logger;

pub use alignment::{
    align_and_score, kabsch, AlignmentResult, AlignmentScorer, RigidTransform, ScoreOutcome,
};
pub use coaching::{Advisory, AdvisoryReport, CoachingAnalyzer, FollowThrough, Phase};
pub use config::CoachConfig;
pub use error::{CoachError, Result};
pub use reconstruction::{reconstruct_trajectory, TrajectoryReconstructor};
pub use recording::{RecordingEvent, RecordingParser};
pub use session::{Session, ThrowAnalysis};
pub use storage::ReferenceStore;
pub use types::{Point3, RawSample, RawSequence, Trajectory, TrajectoryPoint};
