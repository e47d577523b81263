use thiserror::Error;

/// Coaching pipeline error types
#[derive(Error, Debug)]
pub enum CoachError {
    #[error("Insufficient data: need at least {min} samples, got {actual}")]
    InsufficientData { min: usize, actual: usize },

    #[error("Malformed sample: {0}")]
    MalformedSample(String),

    #[error("Alignment failed: {0}")]
    AlignmentFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for coaching operations
pub type Result<T> = std::result::Result<T, CoachError>;

impl CoachError {
    pub fn insufficient_data(min: usize, actual: usize) -> Self {
        Self::InsufficientData { min, actual }
    }

    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::AlignmentFailure(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// True for failures the session loop should shrug off and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoachError::InsufficientData { .. }
                | CoachError::MalformedSample(_)
                | CoachError::AlignmentFailure(_)
        )
    }
}
