//! Job orchestrator.
//!
//! [`Harness`] lives on the interactive thread. It owns configuration and
//! image state plus the presentation adapter, and drives one worker thread
//! that owns the processing boundary.
//!
//! ```text
//! interactive thread                      worker thread
//! ------------------                      -------------
//! submit() --HarnessMsg::Run(job)-------> JobHandler::execute
//! set_*()  --HarnessMsg::Set*-----------> boundary.set_*
//! pump()   <-HarnessEvent::Status-------- StatusReporter
//!          <-HarnessEvent::Finished------
//! ```
//!
//! At most one job is in flight. The flag is set at submission and cleared
//! only after the terminal outcome has been delivered to the presenter.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};

use fxlab_compute::{Backend, ProcessingBoundary, WorkGroupShape};
use fxlab_core::RgbaImage;
use tracing::{debug, info, trace, warn};

use crate::channel::{DEFAULT_CAPACITY, event_channel};
use crate::error::{HarnessError, Result};
use crate::handler::JobHandler;
use crate::launch::LaunchPlan;
use crate::messages::{HarnessEvent, HarnessMsg, Job, JobId, JobOutcome};
use crate::presentation::PresentationAdapter;
use crate::state::{ConfigState, ImageState};

/// Result of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// A job was created and handed to the worker.
    Started(JobId),
    /// A job is already running; nothing was created.
    Busy,
}

/// Lifecycle of the single job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running(JobId),
}

/// Single-flight job orchestrator.
pub struct Harness<B: ProcessingBoundary + 'static, P: PresentationAdapter> {
    /// Commands to the worker.
    tx: Sender<HarnessMsg>,
    /// Events from the worker.
    rx: Receiver<HarnessEvent>,
    /// Worker thread handle (Option for Drop and shutdown).
    worker: Option<JoinHandle<B>>,

    presenter: P,
    filters: Vec<String>,
    config: ConfigState,
    image: ImageState,

    in_flight: AtomicBool,
    running: Option<JobId>,
    next_job: JobId,
    last_outcome: Option<JobOutcome>,
    /// Image selected while a job was running.
    deferred_image: Option<RgbaImage>,
}

impl<B: ProcessingBoundary + 'static, P: PresentationAdapter> Harness<B, P> {
    /// Starts the worker with default configuration.
    pub fn new(boundary: B, presenter: P, image: RgbaImage) -> Result<Self> {
        Self::with_config(boundary, presenter, image, ConfigState::default())
    }

    /// Starts the worker and pushes `config` to the boundary.
    pub fn with_config(
        boundary: B,
        presenter: P,
        image: RgbaImage,
        config: ConfigState,
    ) -> Result<Self> {
        // Queried before the boundary moves to the worker.
        let filters = boundary.list_filters();

        let (tx_to_worker, rx_in_worker) = channel();
        let (events, rx_from_worker) = event_channel(DEFAULT_CAPACITY);

        let worker = thread::Builder::new()
            .name("fxlab-worker".into())
            .spawn(move || JobHandler::new(rx_in_worker, events, boundary).run())?;

        let mut harness = Self {
            tx: tx_to_worker,
            rx: rx_from_worker,
            worker: Some(worker),
            presenter,
            filters,
            config: ConfigState {
                filter_index: None,
                ..config
            },
            image: ImageState::new(image),
            in_flight: AtomicBool::new(false),
            running: None,
            next_job: 1,
            last_outcome: None,
            deferred_image: None,
        };

        if let Some(index) = config.filter_index {
            if let Err(e) = harness.select_filter(Some(index)) {
                warn!(error = %e, "initial filter ignored");
            }
        }
        harness.sync_boundary()?;
        harness.presenter.show_image(harness.image.input());
        harness.presenter.set_controls_enabled(true);
        info!(filters = harness.filters.len(), "harness ready");
        Ok(harness)
    }

    fn send(&self, msg: HarnessMsg) -> Result<()> {
        self.tx.send(msg).map_err(|_| HarnessError::WorkerGone)
    }

    /// Pushes the whole configuration to the boundary.
    fn sync_boundary(&self) -> Result<()> {
        let (x, y) = WorkGroupShape::to_raw(self.config.work_group);
        self.send(HarnessMsg::SetVerification(self.config.verification_enabled))?;
        self.send(HarnessMsg::SetWorkGroupShape { x, y })?;
        self.send(HarnessMsg::SetIterations(self.config.iterations))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Filter names in index order.
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn config(&self) -> &ConfigState {
        &self.config
    }

    pub fn image(&self) -> &ImageState {
        &self.image
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn job_state(&self) -> JobState {
        match self.running {
            Some(id) if self.is_running() => JobState::Running(id),
            _ => JobState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Outcome of the most recently delivered job.
    pub fn last_outcome(&self) -> Option<&JobOutcome> {
        self.last_outcome.as_ref()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Selects the filter used by [`run`](Self::run). `None` clears the
    /// selection.
    pub fn select_filter(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(i) = index {
            self.check_filter(Some(i))?;
        }
        self.config.filter_index = index;
        debug!(?index, "filter selected");
        Ok(())
    }

    /// Sets the backend used by [`run_selected`](Self::run_selected).
    pub fn select_backend(&mut self, backend: Backend) {
        self.config.backend = backend;
        debug!(%backend, "backend selected");
    }

    /// Replaces the input image and invalidates cached reference results.
    ///
    /// While a job is running the switch is deferred until its outcome has
    /// been delivered.
    pub fn select_image(&mut self, image: RgbaImage) -> Result<()> {
        if self.is_running() {
            debug!("image switch deferred until the running job completes");
            self.deferred_image = Some(image);
            return Ok(());
        }
        self.apply_image(image)
    }

    fn apply_image(&mut self, image: RgbaImage) -> Result<()> {
        info!(width = image.width(), height = image.height(), "image selected");
        self.image = ImageState::new(image);
        self.send(HarnessMsg::ClearCache)?;
        self.presenter.show_image(self.image.input());
        Ok(())
    }

    /// Forwarded to the boundary before the next job.
    pub fn set_verification(&mut self, enabled: bool) -> Result<()> {
        self.config.verification_enabled = enabled;
        self.send(HarnessMsg::SetVerification(enabled))
    }

    /// Sets an explicit work-group shape. Both dimensions must be at least 1.
    pub fn set_work_group_shape(&mut self, x: u32, y: u32) -> Result<()> {
        let shape = WorkGroupShape::new(x, y).ok_or(HarnessError::InvalidWorkGroup { x, y })?;
        self.config.work_group = Some(shape);
        self.send(HarnessMsg::SetWorkGroupShape { x, y })
    }

    /// Returns the boundary to "unspecified".
    pub fn clear_work_group_shape(&mut self) -> Result<()> {
        self.config.work_group = None;
        self.send(HarnessMsg::SetWorkGroupShape { x: 0, y: 0 })
    }

    /// Timed iterations for non-reference backends (at least 1).
    pub fn set_iterations(&mut self, iterations: u32) -> Result<()> {
        let iterations = iterations.max(1);
        self.config.iterations = iterations;
        self.send(HarnessMsg::SetIterations(iterations))
    }

    /// Applies resolved launch parameters. Starts a run when the plan asks
    /// for one.
    pub fn apply_launch(&mut self, plan: &LaunchPlan) -> Result<Option<Submission>> {
        self.select_filter(Some(plan.filter_index))?;
        if let Some(backend) = plan.backend {
            self.select_backend(backend);
        }
        self.set_verification(plan.verify)?;
        match plan.work_group {
            Some(shape) => self.set_work_group_shape(shape.x, shape.y)?,
            None => self.clear_work_group_shape()?,
        }
        if let Some(n) = plan.iterations {
            self.set_iterations(n)?;
        }

        match plan.backend {
            Some(backend) if plan.auto_run => self.run(backend).map(Some),
            _ => Ok(None),
        }
    }

    // =========================================================================
    // Jobs
    // =========================================================================

    fn check_filter(&self, index: Option<usize>) -> Result<usize> {
        index
            .filter(|&i| i < self.filters.len())
            .ok_or(HarnessError::InvalidFilter {
                index,
                available: self.filters.len(),
            })
    }

    /// Submits a job for `filter_index` on `backend`.
    ///
    /// Returns [`Submission::Busy`] without side effects while another job
    /// is running.
    pub fn submit(&mut self, backend: Backend, filter_index: Option<usize>) -> Result<Submission> {
        let filter_index = self.check_filter(filter_index)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(%backend, filter_index, "busy, submission ignored");
            return Ok(Submission::Busy);
        }

        let id = self.next_job;
        self.next_job += 1;
        let job = Job {
            id,
            backend,
            filter_index,
            input: Arc::clone(self.image.input()),
            output: self.image.take_output(),
        };

        self.presenter.set_controls_enabled(false);
        if let Err(e) = self.send(HarnessMsg::Run(job)) {
            self.in_flight.store(false, Ordering::Release);
            self.presenter.set_controls_enabled(true);
            return Err(e);
        }

        self.running = Some(id);
        info!(job = id, %backend, filter = %self.filters[filter_index], "job submitted");
        Ok(Submission::Started(id))
    }

    /// Submits the selected filter on `backend`.
    pub fn run(&mut self, backend: Backend) -> Result<Submission> {
        self.submit(backend, self.config.filter_index)
    }

    /// Submits the selected filter on the selected backend.
    pub fn run_selected(&mut self) -> Result<Submission> {
        self.run(self.config.backend)
    }

    /// Delivers pending events without blocking. Returns how many were
    /// delivered.
    ///
    /// A worker that has gone away ends the running job with
    /// [`JobOutcome::ExecutionError`].
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.deliver(event);
                    delivered += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.is_running() {
                        self.worker_lost();
                        delivered += 1;
                    }
                    break;
                }
            }
        }
        delivered
    }

    /// Blocks until the running job's outcome has been delivered.
    ///
    /// Returns `None` when no job was running.
    pub fn wait(&mut self) -> Option<JobOutcome> {
        if !self.is_running() {
            self.pump();
            return None;
        }
        loop {
            match self.rx.recv() {
                Ok(event) => {
                    if let Some(outcome) = self.deliver(event) {
                        return Some(outcome);
                    }
                }
                Err(_) => return Some(self.worker_lost()),
            }
        }
    }

    /// Completes the running job after the worker disappeared.
    fn worker_lost(&mut self) -> JobOutcome {
        warn!(job = ?self.running, "worker thread terminated");
        let outcome = JobOutcome::ExecutionError("worker thread terminated".into());
        self.complete(self.running.unwrap_or_default(), outcome.clone(), None);
        outcome
    }

    /// Delivers one event; returns the outcome if it was terminal.
    fn deliver(&mut self, event: HarnessEvent) -> Option<JobOutcome> {
        match event {
            HarnessEvent::Status { job, text } => {
                if self.running == Some(job) {
                    self.presenter.show_status(&text);
                } else {
                    trace!(job, "stale status dropped");
                }
                None
            }
            HarnessEvent::Finished {
                job,
                outcome,
                output,
            } => {
                self.complete(job, outcome.clone(), Some(output));
                Some(outcome)
            }
        }
    }

    fn complete(&mut self, job: JobId, outcome: JobOutcome, output: Option<RgbaImage>) {
        match &outcome {
            JobOutcome::Success | JobOutcome::VerificationFailure => {
                if let Some(output) = &output {
                    self.presenter.show_image(output);
                }
                self.presenter.show_outcome(outcome.is_success());
            }
            JobOutcome::ExecutionError(msg) => {
                self.presenter.show_error(msg);
                self.presenter.show_outcome(false);
            }
        }
        if let Some(output) = output {
            self.image.restore_output(output);
        }

        self.presenter.set_controls_enabled(true);
        self.running = None;
        self.last_outcome = Some(outcome);
        self.in_flight.store(false, Ordering::Release);
        debug!(job, "job slot cleared");

        if let Some(image) = self.deferred_image.take() {
            if let Err(e) = self.apply_image(image) {
                warn!(error = %e, "deferred image switch failed");
            }
        }
    }

    /// Waits for any running job, stops the worker and returns the boundary.
    pub fn shutdown(mut self) -> Result<B> {
        self.wait();
        let worker = self.worker.take().ok_or(HarnessError::WorkerGone)?;
        let _ = self.tx.send(HarnessMsg::Shutdown);
        worker.join().map_err(|_| HarnessError::WorkerPanicked)
    }
}

impl<B: ProcessingBoundary + 'static, P: PresentationAdapter> Drop for Harness<B, P> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            // Drain first so the worker never blocks on a full channel.
            self.wait();
            let _ = self.tx.send(HarnessMsg::Shutdown);
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::NullPresenter;
    use fxlab_compute::{ComputeResult, StatusReporter, Verdict};
    use std::sync::mpsc::sync_channel;

    /// Holds every run until its gate sender is dropped.
    struct Gated(Receiver<()>);

    impl ProcessingBoundary for Gated {
        fn list_filters(&self) -> Vec<String> {
            vec!["Copy".to_string()]
        }

        fn run(
            &mut self,
            _input: &RgbaImage,
            _output: &mut RgbaImage,
            _filter_index: usize,
            _backend: Backend,
            _status: &mut StatusReporter<'_>,
        ) -> ComputeResult<Verdict> {
            let _ = self.0.recv();
            Ok(Verdict::Pass)
        }

        fn set_verification_enabled(&mut self, _enabled: bool) {}
        fn verification_enabled(&self) -> bool {
            true
        }
        fn set_work_group_shape(&mut self, _x: u32, _y: u32) {}
        fn work_group_shape(&self) -> Option<WorkGroupShape> {
            None
        }
        fn set_iterations(&mut self, _iterations: u32) {}
        fn iterations(&self) -> u32 {
            1
        }
        fn clear_cache(&mut self) {}
    }

    #[test]
    fn pump_ends_job_when_worker_disconnects() {
        let (release, gate) = channel();
        let image = RgbaImage::new(4, 4).unwrap();
        let mut h = Harness::new(Gated(gate), NullPresenter, image).unwrap();
        assert!(matches!(h.submit(Backend::Reference, Some(0)).unwrap(), Submission::Started(_)));

        // Event side hangs up while the job is in flight.
        let (_, dead) = sync_channel(1);
        h.rx = dead;

        assert_eq!(h.pump(), 1);
        assert_eq!(h.job_state(), JobState::Idle);
        assert!(matches!(h.last_outcome(), Some(JobOutcome::ExecutionError(_))));
        assert_eq!(h.pump(), 0);

        drop(release);
    }
}
