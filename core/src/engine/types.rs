use std::fmt;
use std::sync::Arc;
use bytes::Bytes;

use crate::{buffer::GrowableBuffer, state::Operation, types::EngineError};

use super::dispatcher::SessionCell;

/// Non-error outcome of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// The decompressor has seen the end of its stream; later writes are no-ops.
    EndOfStream,
}

pub type JobResult = Result<Status, EngineError>;

/// Completion handler, run on the issuing context with (status, output bytes).
pub type Continuation = Box<dyn FnOnce(JobResult, Bytes) + Send + 'static>;

pub enum JobKind {
    Write(Bytes),
    Close,
    Destroy,
}

impl JobKind {
    pub fn operation(&self) -> Operation {
        match self {
            JobKind::Write(_) => Operation::Write,
            JobKind::Close => Operation::Close,
            JobKind::Destroy => Operation::Destroy,
        }
    }

    pub fn input_len(&self) -> usize {
        match self {
            JobKind::Write(bytes) => bytes.len(),
            _ => 0,
        }
    }
}

/// One queued request against a session.
pub struct Job {
    pub kind: JobKind,
    pub continuation: Option<Continuation>,
    pub output: GrowableBuffer,
}

impl Job {
    pub fn new(kind: JobKind, continuation: Option<Continuation>) -> Self {
        Self { kind, continuation, output: GrowableBuffer::new() }
    }

    pub fn operation(&self) -> Operation {
        self.kind.operation()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("operation", &self.operation())
            .field("input_len", &self.kind.input_len())
            .field("output_len", &self.output.len())
            .field("has_continuation", &self.continuation.is_some())
            .finish()
    }
}

/// A processed job waiting for delivery on the issuing context.
///
/// Holds its session alive until the continuation has run.
pub(crate) struct Completion {
    pub operation: Operation,
    pub status: JobResult,
    pub output: Bytes,
    pub continuation: Option<Continuation>,
    pub _session: Arc<SessionCell>,
}

impl Completion {
    pub fn new(job: Job, status: JobResult, session: Arc<SessionCell>) -> Self {
        let operation = job.operation();
        Self {
            operation,
            status,
            output: job.output.into_bytes(),
            continuation: job.continuation,
            _session: session,
        }
    }

    /// Run the continuation (if any), consuming the completion.
    pub fn deliver(self) {
        if let Some(continuation) = self.continuation {
            continuation(self.status, self.output);
        }
    }
}
