//! Bounded, ordered event channel with status coalescing.
//!
//! Progress is sent with `try_send`. When the interactive thread falls
//! behind and the channel is full, the newest status is parked and replaces
//! any status already parked, so the worker never blocks on progress and the
//! most recent message always gets through. The terminal event is sent with
//! a blocking send after the parked status, which keeps emission order.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use tracing::trace;

use crate::messages::{HarnessEvent, JobId};

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 64;

/// Creates an event channel with room for `capacity` undelivered events.
pub fn event_channel(capacity: usize) -> (StatusSender, Receiver<HarnessEvent>) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (StatusSender::new(tx), rx)
}

/// Worker side of the event channel.
pub struct StatusSender {
    tx: SyncSender<HarnessEvent>,
    parked: Option<HarnessEvent>,
    coalesced: u64,
}

impl StatusSender {
    fn new(tx: SyncSender<HarnessEvent>) -> Self {
        Self {
            tx,
            parked: None,
            coalesced: 0,
        }
    }

    /// Queues a progress message without blocking.
    pub fn status(&mut self, job: JobId, text: String) {
        self.flush_parked();
        let event = HarnessEvent::Status { job, text };
        if self.parked.is_some() {
            self.coalesced += 1;
            trace!(job, "status coalesced");
            self.parked = Some(event);
            return;
        }
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => self.parked = Some(event),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Sends the terminal event, blocking until there is room.
    ///
    /// Any parked status goes first.
    pub fn finish(&mut self, event: HarnessEvent) {
        if let Some(parked) = self.parked.take() {
            let _ = self.tx.send(parked);
        }
        let _ = self.tx.send(event);
    }

    /// Number of status messages replaced before delivery.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    fn flush_parked(&mut self) {
        if let Some(parked) = self.parked.take() {
            match self.tx.try_send(parked) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(parked)) => self.parked = Some(parked),
            }
        }
    }
}
