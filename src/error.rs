use std::fmt;
use thiserror::Error;

/// Which half of a remote task reported the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Creation,
    Generation,
}

impl FailureStage {
    pub fn default_reason(&self) -> &'static str {
        match self {
            FailureStage::Creation => "Task creation failed",
            FailureStage::Generation => "Image generation failed",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Creation => write!(f, "creation"),
            FailureStage::Generation => write!(f, "generation"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Submission error: {0}")]
    SubmissionError(String),

    /// Transient: the poll loop logs it and keeps going.
    #[error("Failed to check task status: {0}")]
    TransportError(String),

    #[error("Task {stage} failed: {reason}")]
    TaskFailed { stage: FailureStage, reason: String },

    #[error("No image URL found in completed task {0}")]
    EmptyResult(String),

    #[error("Image generation timed out after {waited_ms}ms (task {task_id}). Please try again later.")]
    Timeout { task_id: String, waited_ms: u64 },

    /// `task_id` is `None` when cancellation came before submission.
    #[error("Generation cancelled{}", task_suffix(.task_id))]
    Cancelled { task_id: Option<String> },

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl GenerationError {
    /// True when polling may safely continue after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::TransportError(_))
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_transient()
    }
}

fn task_suffix(task_id: &Option<String>) -> String {
    task_id
        .as_deref()
        .map(|id| format!(" (task {})", id))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, GenerationError>;
