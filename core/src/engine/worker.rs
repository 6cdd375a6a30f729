use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use crossbeam::channel::Receiver;
use tracing::{debug, error, warn};

use crate::compression::CodecError;

use super::dispatcher::{Relay, SessionCell};
use super::types::{Completion, JobResult};

/// Single pool worker loop: drain every session handed over until the
/// dispatcher drops the run-queue sender.
pub(crate) fn run_worker(index: usize, ready_rx: Receiver<Arc<SessionCell>>, relay: Arc<Relay>) {
    debug!(worker = index, "codec worker started");
    while let Ok(cell) = ready_rx.recv() {
        drain_session(&cell, &relay);
    }
    debug!(worker = index, "run queue closed, codec worker exiting");
}

/// Pop and execute jobs until the session queue is observed empty under the lock.
///
/// The codec session is moved out of the cell for the whole drain, so no other
/// thread can reach it; it is put back in the same critical section that
/// clears the `active` flag.
pub(crate) fn drain_session(cell: &Arc<SessionCell>, relay: &Relay) {
    let Some(mut session) = cell.take_session() else {
        warn!(session = cell.id(), "scheduled session has no codec attached, skipping");
        return;
    };

    loop {
        let next = {
            let mut pending = cell.lock();
            match pending.queue.pop() {
                Some(job) => job,
                None => {
                    pending.session = Some(session);
                    pending.active = false;
                    return;
                }
            }
        };

        let mut job = next;
        let operation = job.operation();
        let input_len = job.kind.input_len();
        debug!(session = cell.id(), op = %operation, input_len, "executing job");

        let start = Instant::now();
        // A panicking codec fails its job; the state guard has already moved
        // the session to `Error`, so later jobs see a sequence error.
        let status: JobResult = catch_unwind(AssertUnwindSafe(|| session.execute(&mut job)))
            .unwrap_or_else(|_| {
                error!(session = cell.id(), op = %operation, "codec panicked");
                Err(CodecError::ProcessFailed {
                    codec: session.codec_name().into(),
                    msg: "codec panicked".into(),
                }
                .into())
            });
        let elapsed = start.elapsed();

        if let Err(e) = &status {
            warn!(session = cell.id(), op = %operation, state = %session.state(), error = %e, "job failed");
        }
        cell.lock().state = session.state();

        relay.record(operation, input_len, job.output.len(), status.is_err(), elapsed);
        relay.complete(Completion::new(job, status, cell.clone()));
    }
}
