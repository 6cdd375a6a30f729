//! engine/dispatcher.rs
//! Worker pool, per-session draining discipline and ordered completion relay.
//!
//! Flow:
//! 1. `submit_*` pushes a job on the session queue under the session lock and,
//!    if no worker owns the session (`active == false`), flips the flag in the
//!    same critical section and hands the session to the run queue.
//! 2. A worker drains the session until it observes the queue empty under the
//!    lock (see `worker::drain_session`).
//! 3. Each processed job lands on the completion queue; a capacity-1 wakeup
//!    channel coalesces notifications.
//! 4. The issuing context calls `poll` / `run_until_idle`, which invoke
//!    continuations in completion order (submission order within a session).

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::{
    compression::{create_codec, Codec, CodecKind, Direction},
    config::EngineConfig,
    constants::WORKER_THREAD_PREFIX,
    queue::JobQueue,
    state::{Operation, State},
    telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer},
    types::EngineError,
};

use super::session::CodecSession;
use super::types::{Completion, Continuation, Job, JobKind, JobResult};
use super::worker::run_worker;

// ============================================================
// Session cell
// ============================================================

/// Everything guarded by the session lock.
pub(crate) struct Pending {
    pub queue: JobQueue<Job>,
    /// A worker owns (or is about to own) this session.
    pub active: bool,
    /// `None` while a worker is draining.
    pub session: Option<CodecSession>,
    /// Last state published by the draining worker.
    pub state: State,
}

pub(crate) struct SessionCell {
    id: u64,
    codec_name: &'static str,
    pending: Mutex<Pending>,
}

impl SessionCell {
    fn new(id: u64, session: CodecSession, queue_capacity: usize) -> Self {
        Self {
            id,
            codec_name: session.codec_name(),
            pending: Mutex::new(Pending {
                queue: JobQueue::with_capacity(queue_capacity),
                active: false,
                state: session.state(),
                session: Some(session),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock()
    }

    pub fn take_session(&self) -> Option<CodecSession> {
        self.pending.lock().session.take()
    }
}

/// Caller-side handle to a session.
///
/// Cloning is cheap. Dropping every handle while jobs are in flight is fine:
/// queued jobs and pending completions keep the session alive, and the codec
/// is released once the last reference goes.
#[derive(Clone)]
pub struct SessionHandle {
    cell: Arc<SessionCell>,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.cell.id
    }

    pub fn codec_name(&self) -> &'static str {
        self.cell.codec_name
    }

    /// State after the most recently executed job.
    pub fn state(&self) -> State {
        self.cell.lock().state
    }

    /// Jobs queued and not yet picked up by a worker.
    pub fn queued_jobs(&self) -> usize {
        self.cell.lock().queue.len()
    }

    pub fn is_active(&self) -> bool {
        self.cell.lock().active
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.cell.id)
            .field("codec", &self.cell.codec_name)
            .finish()
    }
}

// ============================================================
// Completion relay
// ============================================================

struct Metrics {
    counters: TelemetryCounters,
    timer: TelemetryTimer,
}

/// State shared between workers and the issuing context.
pub(crate) struct Relay {
    completions: Mutex<JobQueue<Completion>>,
    wake_tx: Sender<()>,
    metrics: Mutex<Metrics>,
}

impl Relay {
    fn new(wake_tx: Sender<()>, queue_capacity: usize) -> Self {
        Self {
            completions: Mutex::new(JobQueue::with_capacity(queue_capacity)),
            wake_tx,
            metrics: Mutex::new(Metrics {
                counters: TelemetryCounters::default(),
                timer: TelemetryTimer::new(),
            }),
        }
    }

    /// Queue a processed job and wake the issuing context.
    ///
    /// The push happens before the wakeup: a full wakeup channel means a
    /// token is already pending and the consumer will see this completion.
    pub fn complete(&self, completion: Completion) {
        self.completions.lock().push(completion);
        let _ = self.wake_tx.try_send(());
    }

    pub fn record(&self, operation: Operation, input_len: usize, output_len: usize, failed: bool, elapsed: Duration) {
        let mut metrics = self.metrics.lock();
        let counters = &mut metrics.counters;
        match operation {
            Operation::Write => counters.add_write(input_len, output_len),
            Operation::Close => counters.add_close(output_len),
            Operation::Destroy => counters.add_destroy(),
            Operation::Init => counters.add_session(),
        }
        if failed {
            counters.add_failure();
        }
        metrics.timer.add_stage_time(Stage::from(operation), elapsed);
    }

    fn pop(&self) -> Option<Completion> {
        self.completions.lock().pop()
    }
}

// ============================================================
// Dispatcher
// ============================================================

pub struct Dispatcher {
    config: EngineConfig,
    ready_tx: Option<Sender<Arc<SessionCell>>>,
    wake_rx: Receiver<()>,
    relay: Arc<Relay>,
    workers: Vec<JoinHandle<()>>,
    in_flight: AtomicUsize,
    next_session_id: AtomicU64,
    // Held while continuations run; keeps delivery single-file.
    delivery: Mutex<()>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("workers", &self.workers.len())
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

impl Dispatcher {
    /// Validate `config` and start the worker pool.
    pub fn init(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let (ready_tx, ready_rx) = unbounded::<Arc<SessionCell>>();
        let (wake_tx, wake_rx) = bounded::<()>(1);
        let relay = Arc::new(Relay::new(wake_tx, config.queue_capacity));

        let mut workers = Vec::with_capacity(config.worker_count);
        for i in 0..config.worker_count {
            let rx = ready_rx.clone();
            let relay = relay.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", WORKER_THREAD_PREFIX, i))
                .spawn(move || run_worker(i, rx, relay))
                .map_err(|e| EngineError::Spawn(e.to_string()))?;
            workers.push(handle);
        }
        info!(workers = config.worker_count, sizing = ?config.sizing, "dispatcher started");

        Ok(Self {
            config,
            ready_tx: Some(ready_tx),
            wake_rx,
            relay,
            workers,
            in_flight: AtomicUsize::new(0),
            next_session_id: AtomicU64::new(1),
            delivery: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Submitted jobs whose continuation has not run yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    // ---- Sessions ----

    /// Wrap `codec` in an idle (uninitialized) session.
    pub fn create_session(&self, codec: Box<dyn Codec>) -> SessionHandle {
        let session = CodecSession::with_config(codec, &self.config);
        self.wrap(session)
    }

    /// Wrap and initialize `codec`. Init runs on the caller; it only allocates
    /// codec state.
    pub fn open_session(&self, codec: Box<dyn Codec>) -> Result<SessionHandle, EngineError> {
        let mut session = CodecSession::with_config(codec, &self.config);
        let start = Instant::now();
        session.init()?;
        self.relay.record(Operation::Init, 0, 0, false, start.elapsed());
        Ok(self.wrap(session))
    }

    /// Open a session on one of the bundled codecs.
    pub fn open(&self, kind: CodecKind, direction: Direction, level: Option<i32>)
        -> Result<SessionHandle, EngineError>
    {
        self.open_session(create_codec(kind, direction, level))
    }

    fn wrap(&self, session: CodecSession) -> SessionHandle {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        debug!(session = id, codec = session.codec_name(), state = %session.state(), "session created");
        SessionHandle {
            cell: Arc::new(SessionCell::new(id, session, self.config.queue_capacity)),
        }
    }

    // ---- Submission ----

    pub fn submit_write<F>(&self, session: &SessionHandle, data: impl Into<Bytes>, continuation: F)
        -> Result<(), EngineError>
    where
        F: FnOnce(JobResult, Bytes) + Send + 'static,
    {
        self.submit(session, JobKind::Write(data.into()), Some(Box::new(continuation)))
    }

    pub fn submit_close<F>(&self, session: &SessionHandle, continuation: F) -> Result<(), EngineError>
    where
        F: FnOnce(JobResult, Bytes) + Send + 'static,
    {
        self.submit(session, JobKind::Close, Some(Box::new(continuation)))
    }

    pub fn submit_destroy(&self, session: &SessionHandle) -> Result<(), EngineError> {
        self.submit(session, JobKind::Destroy, None)
    }

    /// Enqueue and, if needed, schedule the session. Never blocks on codec work.
    ///
    /// If the pool is gone the queued jobs are completed with
    /// `EngineError::ShutDown` (their continuations still run on the next
    /// `poll`) and the error is also returned here.
    pub fn submit(&self, session: &SessionHandle, kind: JobKind, continuation: Option<Continuation>)
        -> Result<(), EngineError>
    {
        let ready_tx = self.ready_tx.as_ref().ok_or(EngineError::ShutDown)?;
        let cell = &session.cell;
        let job = Job::new(kind, continuation);
        let operation = job.operation();

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let schedule = {
            let mut pending = cell.lock();
            pending.queue.push(job);
            !std::mem::replace(&mut pending.active, true)
        };

        if schedule {
            debug!(session = cell.id, op = %operation, "scheduling session");
            if ready_tx.send(cell.clone()).is_err() {
                warn!(session = cell.id, "worker pool gone, failing queued jobs");
                let stranded: Vec<Job> = {
                    let mut pending = cell.lock();
                    pending.active = false;
                    std::iter::from_fn(|| pending.queue.pop()).collect()
                };
                for job in stranded {
                    self.relay.complete(Completion::new(job, Err(EngineError::ShutDown), cell.clone()));
                }
                return Err(EngineError::ShutDown);
            }
        }
        Ok(())
    }

    // ---- Issuing context ----

    /// Deliver every queued completion without blocking. Returns how many
    /// continuations ran.
    ///
    /// Re-entrant calls (from inside a continuation) and calls racing another
    /// thread's delivery return 0 so ordering is never interleaved.
    ///
    /// A panicking continuation propagates out of `poll`; its job is already
    /// counted as delivered and the remaining completions stay queued.
    pub fn poll(&self) -> usize {
        let Some(_turn) = self.delivery.try_lock() else {
            return 0;
        };

        let mut delivered = 0;
        loop {
            let next = self.relay.pop();
            let Some(completion) = next else { break };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            delivered += 1;

            let start = Instant::now();
            completion.deliver();
            self.relay.metrics.lock().timer.add_stage_time(Stage::Relay, start.elapsed());
        }
        delivered
    }

    /// Wait up to `timeout` for a wakeup, then deliver.
    pub fn wait_timeout(&self, timeout: Duration) -> usize {
        let _ = self.wake_rx.recv_timeout(timeout);
        self.poll()
    }

    /// Block until every submitted job has been delivered.
    ///
    /// Must not be called from inside a continuation: the job being delivered
    /// is still counted as in flight.
    pub fn run_until_idle(&self) -> usize {
        let mut delivered = self.poll();
        while self.in_flight() > 0 {
            if self.wake_rx.recv().is_err() {
                break;
            }
            delivered += self.poll();
        }
        delivered
    }

    /// Wakeup receiver for embedding in an external event loop
    /// (`crossbeam::select!`). Call `poll` after each token.
    pub fn notifier(&self) -> Receiver<()> {
        self.wake_rx.clone()
    }

    // ---- Telemetry / lifecycle ----

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let metrics = self.relay.metrics.lock();
        TelemetrySnapshot::from(&metrics.counters, &metrics.timer)
    }

    /// Stop accepting work, let workers finish what is queued, deliver the
    /// remaining completions and return the final telemetry.
    pub fn shutdown(mut self) -> TelemetrySnapshot {
        self.stop_workers();
        self.poll();
        self.relay.metrics.lock().timer.finish();
        let snapshot = self.snapshot();
        info!(
            jobs = snapshot.jobs_total(),
            failed = snapshot.jobs_failed,
            "dispatcher shut down"
        );
        snapshot
    }

    fn stop_workers(&mut self) {
        // Dropping the only sender ends every worker loop once the run queue is empty.
        drop(self.ready_tx.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("codec worker panicked");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if self.ready_tx.is_some() {
            self.stop_workers();
            self.poll();
        }
    }
}
