//! # fxlab-harness
//!
//! Single-flight job orchestration for the fxlab filter harness.
//!
//! The [`Harness`] runs on the interactive thread and owns the user-facing
//! state. A dedicated worker thread owns the [`ProcessingBoundary`] and
//! executes at most one job at a time. Progress and outcomes come back over
//! an ordered channel and reach the [`PresentationAdapter`] only when the
//! interactive thread calls [`Harness::pump`] or [`Harness::wait`].
//!
//! # Quick Start
//!
//! ```ignore
//! use fxlab_compute::{Backend, NativeProcessor};
//! use fxlab_core::SampleImage;
//! use fxlab_harness::{Harness, NullPresenter};
//!
//! let image = SampleImage::Baboon.render(512, 512)?;
//! let mut harness = Harness::new(NativeProcessor::new(), NullPresenter, image)?;
//! harness.select_filter(Some(2))?;
//! harness.run(Backend::CompiledCpu)?;
//! let outcome = harness.wait();
//! ```
//!
//! # Threading
//!
//! | Thread | Owns |
//! |--------|------|
//! | interactive | [`ConfigState`], [`ImageState`], presenter |
//! | worker | boundary, reference cache |
//!
//! The input image is shared as an `Arc`; the output buffer is moved into
//! the job and moved back with the outcome.
//!
//! [`ProcessingBoundary`]: fxlab_compute::ProcessingBoundary

#![warn(clippy::all)]

mod channel;
mod error;
mod handler;
mod harness;
pub mod launch;
mod messages;
mod presentation;
mod state;

pub use channel::DEFAULT_CAPACITY;
pub use error::{HarnessError, Result};
pub use harness::{Harness, JobState, Submission};
pub use launch::{LaunchParams, LaunchPlan};
pub use messages::{JobId, JobOutcome};
pub use presentation::{NullPresenter, PresentationAdapter};
pub use state::{ConfigState, ImageState};
