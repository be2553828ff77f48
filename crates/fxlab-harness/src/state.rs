//! Configuration and image state.
//!
//! Both live on the interactive thread. The worker never sees them directly:
//! jobs carry copies of what they need.

use std::sync::Arc;

use fxlab_compute::processor::DEFAULT_ITERATIONS;
use fxlab_compute::{Backend, WorkGroupShape};
use fxlab_core::RgbaImage;

/// User-selected run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigState {
    /// Selected filter, `None` when nothing is selected.
    pub filter_index: Option<usize>,
    /// Backend used by [`Harness::run_selected`](crate::Harness::run_selected).
    pub backend: Backend,
    /// Verify non-reference output against the reference.
    pub verification_enabled: bool,
    /// Explicit work-group shape, `None` when unspecified.
    pub work_group: Option<WorkGroupShape>,
    /// Timed iterations per non-reference run.
    pub iterations: u32,
}

impl Default for ConfigState {
    fn default() -> Self {
        Self {
            filter_index: Some(0),
            backend: Backend::Reference,
            verification_enabled: true,
            work_group: None,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Current input image and its output buffer.
#[derive(Debug)]
pub struct ImageState {
    input: Arc<RgbaImage>,
    /// `None` while a job holds the buffer.
    output: Option<RgbaImage>,
}

impl ImageState {
    pub fn new(input: RgbaImage) -> Self {
        let output = input.blank_like();
        Self {
            input: Arc::new(input),
            output: Some(output),
        }
    }

    pub fn input(&self) -> &Arc<RgbaImage> {
        &self.input
    }

    /// Output buffer, unless a job is holding it.
    pub fn output(&self) -> Option<&RgbaImage> {
        self.output.as_ref()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.input.dimensions()
    }

    /// Takes the output buffer for a job.
    ///
    /// A fresh buffer is allocated if none is present.
    pub(crate) fn take_output(&mut self) -> RgbaImage {
        self.output
            .take()
            .filter(|out| out.same_dimensions(&self.input))
            .unwrap_or_else(|| self.input.blank_like())
    }

    /// Hands the output buffer back after a job.
    ///
    /// Ignored when the buffer no longer matches the input.
    pub(crate) fn restore_output(&mut self, output: RgbaImage) {
        if output.same_dimensions(&self.input) {
            self.output = Some(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_matches_input() {
        let state = ImageState::new(RgbaImage::new(6, 4).unwrap());
        assert_eq!(state.dimensions(), (6, 4));
        assert_eq!(state.output().map(RgbaImage::dimensions), Some((6, 4)));
    }

    #[test]
    fn take_and_restore() {
        let mut state = ImageState::new(RgbaImage::new(2, 2).unwrap());
        let out = state.take_output();
        assert!(state.output().is_none());
        state.restore_output(out);
        assert!(state.output().is_some());

        state.take_output();
        state.restore_output(RgbaImage::new(3, 3).unwrap());
        assert!(state.output().is_none());
        assert_eq!(state.take_output().dimensions(), (2, 2));
    }

    #[test]
    fn config_defaults() {
        let config = ConfigState::default();
        assert!(config.verification_enabled);
        assert_eq!(config.work_group, None);
        assert_eq!(config.iterations, 8);
    }
}
