//! engine/session.rs
//! One codec instance plus its lifecycle state.
//!
//! `CodecSession` is the synchronous core: it is driven by exactly one thread
//! at a time (the dispatcher moves it into the draining worker) and can also be
//! used directly without a worker pool.

use tracing::{debug, warn};

use crate::{
    buffer::GrowableBuffer,
    compression::{Codec, CodecError},
    config::{EngineConfig, SizingPolicy},
    constants::DEFAULT_FINISH_CHUNK,
    state::{Operation, State, Transition},
    types::EngineError,
};

use super::types::{Job, JobKind, JobResult, Status};

pub struct CodecSession {
    codec: Box<dyn Codec>,
    state: State,
    sizing: SizingPolicy,
    finish_chunk: usize,
}

impl CodecSession {
    /// New idle session with default sizing.
    pub fn new(codec: Box<dyn Codec>) -> Self {
        Self {
            codec,
            state: State::Idle,
            sizing: SizingPolicy::default(),
            finish_chunk: DEFAULT_FINISH_CHUNK,
        }
    }

    pub fn with_config(codec: Box<dyn Codec>, config: &EngineConfig) -> Self {
        Self {
            codec,
            state: State::Idle,
            sizing: config.sizing,
            finish_chunk: config.finish_chunk_size.max(1),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }

    /// Idle -> Data; a failing codec init leaves the session in `Error`.
    pub fn init(&mut self) -> Result<(), EngineError> {
        if self.state != State::Idle {
            return Err(EngineError::Sequence { op: Operation::Init, state: self.state });
        }
        let mut t = Transition::new(&mut self.state, State::Error);
        self.codec.init()?;
        t.alter(State::Data);
        Ok(())
    }

    /// Feed `input` through the codec, appending to `out`.
    ///
    /// - `Eos`: success, nothing produced, codec untouched.
    /// - Any state other than `Data`: `EngineError::Sequence`.
    /// - Codec end-of-stream: remaining input is discarded, state becomes `Eos`.
    pub fn write(&mut self, input: &[u8], out: &mut GrowableBuffer) -> JobResult {
        match self.state {
            State::Data => {}
            State::Eos => return Ok(Status::EndOfStream),
            state => return Err(EngineError::Sequence { op: Operation::Write, state }),
        }

        let mut t = Transition::new(&mut self.state, State::Error);
        let codec = self.codec.as_mut();

        let mut pos = 0;
        // A codec that filled the whole window may hold more output.
        let mut window_full = false;
        while pos < input.len() || window_full {
            let remaining = &input[pos..];
            // Grow only when the spare window is short; a codec consuming in
            // small pieces must not trigger a reallocation per pass.
            let need = self.sizing.write_growth(remaining.len());
            if out.spare_len() < need {
                out.grow_by(need - out.spare_len())?;
            }

            let window = out.spare_capacity_mut();
            let window_len = window.len();
            let progress = codec.write(remaining, window)?;
            out.increase_length_by(progress.produced);
            pos += progress.consumed;

            if progress.is_stream_end() {
                if pos < input.len() {
                    debug!(codec = codec.name(), discarded = input.len() - pos, "input past end of stream discarded");
                }
                t.alter(State::Eos);
                return Ok(Status::EndOfStream);
            }
            if pos < input.len() && !progress.made_progress() {
                return Err(CodecError::Stalled { codec: codec.name().into() }.into());
            }
            window_full = progress.produced == window_len;
        }

        t.alter(State::Data);
        Ok(Status::Ok)
    }

    /// Flush and tear down.
    ///
    /// The codec is destroyed whatever the drain outcome; a drain fault is
    /// still returned so the caller learns the stream did not end cleanly.
    pub fn close(&mut self, out: &mut GrowableBuffer) -> JobResult {
        if matches!(self.state, State::Idle | State::Destroyed) {
            self.state = State::Destroyed;
            return Ok(Status::Ok);
        }

        let mut t = Transition::new(&mut self.state, State::Error);
        let drained = if t.current() == State::Data {
            drain(self.codec.as_mut(), out, self.finish_chunk)
        } else {
            Ok(())
        };
        t.abort();
        drop(t);

        self.destroy();
        if let Err(e) = &drained {
            warn!(codec = self.codec.name(), error = %e, "close: drain failed, codec released anyway");
        }
        drained.map(|_| Status::Ok)
    }

    /// Release codec state. Idempotent, never fails.
    pub fn destroy(&mut self) {
        if !matches!(self.state, State::Idle | State::Destroyed) {
            self.codec.destroy();
        }
        self.state = State::Destroyed;
    }

    /// Run one queued job, filling its output buffer.
    pub fn execute(&mut self, job: &mut Job) -> JobResult {
        match &job.kind {
            JobKind::Write(input) => self.write(input, &mut job.output),
            JobKind::Close => self.close(&mut job.output),
            JobKind::Destroy => {
                self.destroy();
                Ok(Status::Ok)
            }
        }
    }
}

impl Drop for CodecSession {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Repeated `finish` into fixed-size chunks until the codec reports the end.
fn drain(codec: &mut dyn Codec, out: &mut GrowableBuffer, chunk: usize) -> Result<(), EngineError> {
    loop {
        if out.spare_len() < chunk {
            out.grow_by(chunk - out.spare_len())?;
        }
        let progress = codec.finish(out.spare_capacity_mut())?;
        out.increase_length_by(progress.produced);
        if progress.is_stream_end() {
            return Ok(());
        }
        if progress.produced == 0 {
            return Err(CodecError::Stalled { codec: codec.name().into() }.into());
        }
    }
}
