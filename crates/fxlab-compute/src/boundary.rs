//! The processing boundary contract.
//!
//! [`ProcessingBoundary`] is the single seam between the orchestration core
//! and whatever actually runs filters. The harness only ever talks to this
//! trait, which lets tests substitute a recording mock for
//! [`NativeProcessor`](crate::NativeProcessor).

use std::fmt;

use fxlab_core::RgbaImage;
use tracing::debug;

use crate::{Backend, ComputeResult};

/// Pass/fail result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Output passed verification, or verification was disabled.
    Pass,
    /// Output did not match the reference within tolerance.
    Fail,
}

impl Verdict {
    /// True for [`Verdict::Pass`].
    pub fn is_pass(self) -> bool {
        self == Self::Pass
    }
}

impl From<bool> for Verdict {
    fn from(passed: bool) -> Self {
        if passed { Self::Pass } else { Self::Fail }
    }
}

/// Explicit work-group (local size) shape.
///
/// Both dimensions are at least 1. The boundary receives `(0, 0)` to mean
/// "unspecified, let the backend choose", which can never collide with a
/// valid shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkGroupShape {
    pub x: u32,
    pub y: u32,
}

impl WorkGroupShape {
    /// Sizes offered for each dimension.
    pub const OFFERED: [u32; 11] = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024];

    /// Returns `None` if either dimension is zero.
    pub fn new(x: u32, y: u32) -> Option<Self> {
        (x > 0 && y > 0).then_some(Self { x, y })
    }

    /// Work-items per group.
    pub fn invocations(self) -> u64 {
        self.x as u64 * self.y as u64
    }

    /// `(x, y)` as passed across the boundary, with `(0, 0)` for `None`.
    pub fn to_raw(shape: Option<Self>) -> (u32, u32) {
        shape.map_or((0, 0), |s| (s.x, s.y))
    }
}

impl fmt::Display for WorkGroupShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Receives progress messages emitted during a run.
///
/// Wraps the caller's sink so every message is also traced.
pub struct StatusReporter<'a> {
    sink: &'a mut dyn FnMut(String),
}

impl<'a> StatusReporter<'a> {
    pub fn new(sink: &'a mut dyn FnMut(String)) -> Self {
        Self { sink }
    }

    /// Emits one progress message.
    pub fn report(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        debug!(status = %msg, "progress");
        (self.sink)(msg);
    }
}

/// Native processing contract consumed by the harness.
///
/// Implementations are owned by a single worker thread, so methods take
/// `&mut self` and only `Send` is required.
pub trait ProcessingBoundary: Send {
    /// Filter names. The order defines the filter index space.
    fn list_filters(&self) -> Vec<String>;

    /// Runs `filter_index` on `backend`, writing into `output`.
    ///
    /// `output` must have the same dimensions as `input`. Returns a verdict
    /// when the backend ran, or an error when it could not run at all. No
    /// reference to either buffer is kept after returning.
    fn run(
        &mut self,
        input: &RgbaImage,
        output: &mut RgbaImage,
        filter_index: usize,
        backend: Backend,
        status: &mut StatusReporter<'_>,
    ) -> ComputeResult<Verdict>;

    /// Enables or disables verification for subsequent runs.
    fn set_verification_enabled(&mut self, enabled: bool);

    /// Current verification setting.
    fn verification_enabled(&self) -> bool;

    /// Sets the work-group shape; `(0, 0)` restores the backend default.
    fn set_work_group_shape(&mut self, x: u32, y: u32);

    /// Explicit work-group shape, or `None` when unspecified.
    fn work_group_shape(&self) -> Option<WorkGroupShape>;

    /// Sets the number of timed iterations (at least 1).
    fn set_iterations(&mut self, iterations: u32);

    /// Current iteration count.
    fn iterations(&self) -> u32;

    /// Drops cached reference results tied to the previous image.
    fn clear_cache(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_shape_is_unspecified() {
        assert_eq!(WorkGroupShape::new(0, 4), None);
        assert_eq!(WorkGroupShape::new(4, 0), None);
        assert_eq!(WorkGroupShape::to_raw(None), (0, 0));
        let s = WorkGroupShape::new(16, 8).unwrap();
        assert_eq!(WorkGroupShape::to_raw(Some(s)), (16, 8));
        assert_eq!(s.to_string(), "16x8");
    }

    #[test]
    fn offered_sizes_are_positive() {
        assert!(WorkGroupShape::OFFERED.iter().all(|&v| v >= 1));
    }

    #[test]
    fn reporter_forwards_messages() {
        let mut seen = Vec::new();
        let mut sink = |m: String| seen.push(m);
        let mut status = StatusReporter::new(&mut sink);
        status.report("uploading");
        status.report(String::from("running kernel"));
        drop(status);
        assert_eq!(seen, vec!["uploading", "running kernel"]);
    }
}
