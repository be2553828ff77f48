//! Message types for interactive thread <-> worker communication.
//!
//! The interactive thread sends commands in order, the worker sends events
//! back in order. Configuration commands are applied between jobs, never
//! during one.

use std::sync::Arc;

use fxlab_compute::Backend;
use fxlab_core::RgbaImage;

/// Monotonic job identifier.
pub type JobId = u64;

/// A filter run captured at submission time.
#[derive(Debug)]
pub struct Job {
    pub id: JobId,
    pub backend: Backend,
    pub filter_index: usize,
    /// Shared read-only with the interactive thread.
    pub input: Arc<RgbaImage>,
    /// Moved in for the duration of the job and moved back with the outcome.
    pub output: RgbaImage,
}

/// Messages from the interactive thread to the worker.
#[derive(Debug)]
pub enum HarnessMsg {
    /// Execute a job.
    Run(Job),

    /// Enable or disable verification.
    SetVerification(bool),

    /// Set the work-group shape; (0, 0) means unspecified.
    SetWorkGroupShape { x: u32, y: u32 },

    /// Set timed iterations.
    SetIterations(u32),

    /// Drop cached reference results.
    ClearCache,

    /// Stop the worker.
    Shutdown,
}

/// Terminal result of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Ran and passed (or verification was off).
    Success,
    /// Ran, but the output did not match the reference.
    VerificationFailure,
    /// Could not run at all.
    ExecutionError(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Events from the worker to the interactive thread.
#[derive(Debug)]
pub enum HarnessEvent {
    /// Progress text emitted by the boundary.
    Status { job: JobId, text: String },

    /// The job is done; `output` is handed back.
    Finished {
        job: JobId,
        outcome: JobOutcome,
        output: RgbaImage,
    },
}
