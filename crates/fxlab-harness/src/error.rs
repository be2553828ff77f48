//! Harness error types.

use thiserror::Error;

/// Errors returned to the caller of a harness operation.
///
/// A busy orchestrator is not an error (see
/// [`Submission::Busy`](crate::Submission::Busy)), and neither is a failed
/// job: job outcomes travel to the presentation adapter.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Filter index missing or outside the enumerated filter list.
    #[error("invalid filter index {}: {available} filters available", display_index(.index))]
    InvalidFilter {
        index: Option<usize>,
        available: usize,
    },

    /// Work-group dimensions must both be at least 1.
    #[error("invalid work-group shape {x}x{y}: both dimensions must be at least 1")]
    InvalidWorkGroup { x: u32, y: u32 },

    /// The worker thread is gone.
    #[error("worker thread is not running")]
    WorkerGone,

    /// The worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker thread panicked outside a job.
    #[error("worker thread panicked")]
    WorkerPanicked,
}

fn display_index(index: &Option<usize>) -> String {
    index.map_or_else(|| "none".to_string(), |i| i.to_string())
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_message() {
        let err = HarnessError::InvalidFilter {
            index: None,
            available: 5,
        };
        assert_eq!(err.to_string(), "invalid filter index none: 5 filters available");
        let err = HarnessError::InvalidFilter {
            index: Some(7),
            available: 5,
        };
        assert_eq!(err.to_string(), "invalid filter index 7: 5 filters available");
    }
}
