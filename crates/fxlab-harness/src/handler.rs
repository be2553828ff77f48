//! Worker thread handler.
//!
//! Owns the processing boundary for its whole lifetime and executes jobs
//! and configuration commands strictly in the order they were sent.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Receiver;

use fxlab_compute::{ProcessingBoundary, StatusReporter, Verdict};
use tracing::{debug, info, warn};

use crate::channel::StatusSender;
use crate::messages::{HarnessEvent, HarnessMsg, Job, JobOutcome};

/// Worker thread handler.
pub struct JobHandler<B> {
    rx: Receiver<HarnessMsg>,
    events: StatusSender,
    boundary: B,
}

impl<B: ProcessingBoundary> JobHandler<B> {
    pub fn new(rx: Receiver<HarnessMsg>, events: StatusSender, boundary: B) -> Self {
        Self {
            rx,
            events,
            boundary,
        }
    }

    /// Main loop. Returns the boundary when told to stop or when the
    /// interactive side hangs up.
    pub fn run(mut self) -> B {
        while let Ok(msg) = self.rx.recv() {
            match msg {
                HarnessMsg::Shutdown => break,
                HarnessMsg::Run(job) => self.execute(job),
                other => self.configure(other),
            }
        }

        debug!(coalesced = self.events.coalesced(), "worker shutdown");
        self.boundary
    }

    /// Applies a configuration command. A panicking setter is logged and
    /// the worker keeps serving.
    fn configure(&mut self, msg: HarnessMsg) {
        let boundary = &mut self.boundary;
        let result = panic::catch_unwind(AssertUnwindSafe(|| match msg {
            HarnessMsg::SetVerification(enabled) => boundary.set_verification_enabled(enabled),
            HarnessMsg::SetWorkGroupShape { x, y } => boundary.set_work_group_shape(x, y),
            HarnessMsg::SetIterations(n) => boundary.set_iterations(n),
            HarnessMsg::ClearCache => boundary.clear_cache(),
            HarnessMsg::Run(_) | HarnessMsg::Shutdown => {}
        }));
        if let Err(payload) = result {
            warn!(panic = panic_message(payload.as_ref()), "boundary command panicked");
        }
    }

    fn execute(&mut self, job: Job) {
        let Job {
            id,
            backend,
            filter_index,
            input,
            mut output,
        } = job;
        info!(job = id, %backend, filter_index, "job started");

        let events = &mut self.events;
        let boundary = &mut self.boundary;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut sink = |text: String| events.status(id, text);
            let mut status = StatusReporter::new(&mut sink);
            boundary.run(&input, &mut output, filter_index, backend, &mut status)
        }));

        let outcome = match result {
            Ok(Ok(Verdict::Pass)) => JobOutcome::Success,
            Ok(Ok(Verdict::Fail)) => JobOutcome::VerificationFailure,
            Ok(Err(e)) => {
                warn!(job = id, %backend, error = %e, "job failed");
                JobOutcome::ExecutionError(e.to_string())
            }
            Err(payload) => {
                let msg = format!("backend panicked: {}", panic_message(payload.as_ref()));
                warn!(job = id, %backend, "{msg}");
                JobOutcome::ExecutionError(msg)
            }
        };
        info!(job = id, ?outcome, "job finished");

        self.events.finish(HarnessEvent::Finished {
            job: id,
            outcome,
            output,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads() {
        let p: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(p.as_ref()), "boom");
        let p: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(p.as_ref()), "bang");
        let p: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(p.as_ref()), "unknown panic");
    }
}
