//! engine/stream.rs
//! Event-emitting stream over one dispatcher session.
//!
//! Events are delivered to the sink from whichever thread runs
//! `Dispatcher::poll`, in the order the underlying jobs were submitted.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use crate::compression::{CodecKind, Direction};
use crate::types::EngineError;

use super::dispatcher::{Dispatcher, SessionHandle};
use super::types::JobResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A non-empty chunk of codec output.
    Data(Bytes),
    /// The close flush has been delivered; no more events follow.
    End,
    /// First failure on the stream; no more events follow.
    Error(EngineError),
}

pub type EventSink = Box<dyn FnMut(StreamEvent) + Send + 'static>;

struct Shared {
    readable: bool,
    writeable: bool,
    paused: bool,
    // Set by `End`, `Error` or `destroy`; later completions are swallowed.
    finished: bool,
    buffered: VecDeque<StreamEvent>,
    // `None` while the sink is running.
    sink: Option<EventSink>,
}

pub struct CodecStream<'d> {
    dispatcher: &'d Dispatcher,
    session: SessionHandle,
    shared: Arc<Mutex<Shared>>,
}

impl<'d> CodecStream<'d> {
    /// Wrap an already opened session.
    pub fn new(dispatcher: &'d Dispatcher, session: SessionHandle, sink: EventSink) -> Self {
        Self {
            dispatcher,
            session,
            shared: Arc::new(Mutex::new(Shared {
                readable: true,
                writeable: true,
                paused: false,
                finished: false,
                buffered: VecDeque::new(),
                sink: Some(sink),
            })),
        }
    }

    /// Open a bundled codec and wrap it.
    pub fn open(
        dispatcher: &'d Dispatcher,
        kind: CodecKind,
        direction: Direction,
        level: Option<i32>,
        sink: EventSink,
    ) -> Result<Self, EngineError> {
        let session = dispatcher.open(kind, direction, level)?;
        Ok(Self::new(dispatcher, session, sink))
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn is_readable(&self) -> bool {
        self.shared.lock().readable
    }

    pub fn is_writeable(&self) -> bool {
        self.shared.lock().writeable
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    /// Queue `data` for the codec. Returns `false` when the stream no longer
    /// accepts writes or the dispatcher refused the job.
    pub fn write(&self, data: impl Into<Bytes>) -> bool {
        if !self.shared.lock().writeable {
            return false;
        }
        let shared = self.shared.clone();
        let submitted = self.dispatcher.submit_write(&self.session, data, move |result, output| {
            on_complete(&shared, result, output, false)
        });
        self.refused(submitted)
    }

    /// Stop accepting writes and flush the codec. `End` follows the last chunk.
    pub fn end(&self) -> bool {
        {
            let mut s = self.shared.lock();
            if !s.writeable {
                return false;
            }
            s.writeable = false;
        }
        let shared = self.shared.clone();
        let submitted = self.dispatcher.submit_close(&self.session, move |result, output| {
            on_complete(&shared, result, output, true)
        });
        self.refused(submitted)
    }

    /// Tear the session down without flushing. Pending events are dropped.
    pub fn destroy(&self) {
        {
            let mut s = self.shared.lock();
            s.readable = false;
            s.writeable = false;
            s.finished = true;
            s.buffered.clear();
        }
        if let Err(e) = self.dispatcher.submit_destroy(&self.session) {
            debug!(session = self.session.id(), error = %e, "destroy not submitted");
        }
    }

    /// Hold produced events until `resume`.
    pub fn pause(&self) {
        self.shared.lock().paused = true;
    }

    /// Deliver held events, then continue live.
    pub fn resume(&self) {
        self.shared.lock().paused = false;
        flush(&self.shared);
    }

    fn refused(&self, submitted: Result<(), EngineError>) -> bool {
        match submitted {
            Ok(()) => true,
            Err(e) => {
                fail(&self.shared, e);
                false
            }
        }
    }
}

impl std::fmt::Debug for CodecStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.shared.lock();
        f.debug_struct("CodecStream")
            .field("session", &self.session)
            .field("readable", &s.readable)
            .field("writeable", &s.writeable)
            .field("paused", &s.paused)
            .field("buffered", &s.buffered.len())
            .finish()
    }
}

fn on_complete(shared: &Mutex<Shared>, result: JobResult, output: Bytes, closing: bool) {
    {
        let mut s = shared.lock();
        if s.finished {
            return;
        }
        if !output.is_empty() {
            s.buffered.push_back(StreamEvent::Data(output));
        }
        match &result {
            Ok(_) if closing => {
                s.readable = false;
                s.finished = true;
                s.buffered.push_back(StreamEvent::End);
            }
            Ok(_) => {}
            Err(e) => {
                s.readable = false;
                s.writeable = false;
                s.finished = true;
                s.buffered.push_back(StreamEvent::Error(e.clone()));
            }
        }
    }
    flush(shared);
}

fn fail(shared: &Mutex<Shared>, error: EngineError) {
    {
        let mut s = shared.lock();
        if s.finished {
            return;
        }
        s.readable = false;
        s.writeable = false;
        s.finished = true;
        s.buffered.push_back(StreamEvent::Error(error));
    }
    flush(shared);
}

/// Hand buffered events to the sink one at a time, outside the lock.
///
/// A call made while the sink is running (from inside the sink) returns
/// immediately; the outer call keeps draining.
fn flush(shared: &Mutex<Shared>) {
    let mut s = shared.lock();
    loop {
        if s.paused {
            return;
        }
        let Some(mut sink) = s.sink.take() else { return };
        let Some(event) = s.buffered.pop_front() else {
            s.sink = Some(sink);
            return;
        };
        drop(s);
        sink(event);
        s = shared.lock();
        s.sink = Some(sink);
    }
}
