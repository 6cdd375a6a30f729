#![allow(dead_code)]

//! Shared test helpers: a scriptable identity codec with call counters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use codec_engine::compression::{Codec, CodecError, CodecStatus, Direction, Progress};

pub const NAME: &str = "scripted";

/// Knobs for `ScriptedCodec`. The default is a plain identity copy.
#[derive(Clone, Debug, Default)]
pub struct Script {
    /// Upper bound on bytes consumed per `write` call.
    pub max_consume: Option<usize>,
    /// 1-based `write` call that fails.
    pub fail_write_on_call: Option<usize>,
    /// 1-based `write` call that panics.
    pub panic_write_on_call: Option<usize>,
    pub fail_init: bool,
    pub fail_finish: bool,
    /// Report end-of-stream once this many bytes have been consumed.
    pub eos_after: Option<usize>,
    /// Bytes emitted by `finish`, split across calls by the window size.
    pub trailer: Vec<u8>,
    /// Sleep inside each `write`, to widen race windows.
    pub write_delay: Option<Duration>,
    /// Sleep inside `init`.
    pub init_delay: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub init: AtomicUsize,
    pub write: AtomicUsize,
    pub finish: AtomicUsize,
    pub destroy: AtomicUsize,
}

impl Calls {
    pub fn init(&self) -> usize {
        self.init.load(Ordering::SeqCst)
    }
    pub fn write(&self) -> usize {
        self.write.load(Ordering::SeqCst)
    }
    pub fn finish(&self) -> usize {
        self.finish.load(Ordering::SeqCst)
    }
    pub fn destroy(&self) -> usize {
        self.destroy.load(Ordering::SeqCst)
    }
}

pub struct ScriptedCodec {
    script: Script,
    calls: Arc<Calls>,
    consumed_total: usize,
    trailer_pos: usize,
}

impl ScriptedCodec {
    pub fn new(script: Script) -> (Self, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let codec = Self { script, calls: calls.clone(), consumed_total: 0, trailer_pos: 0 };
        (codec, calls)
    }

    pub fn boxed(script: Script) -> (Box<dyn Codec>, Arc<Calls>) {
        let (codec, calls) = Self::new(script);
        (Box::new(codec), calls)
    }

    pub fn identity() -> (Box<dyn Codec>, Arc<Calls>) {
        Self::boxed(Script::default())
    }

    fn fault(msg: &str) -> CodecError {
        CodecError::ProcessFailed { codec: NAME.into(), msg: msg.into() }
    }
}

impl Codec for ScriptedCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn direction(&self) -> Direction {
        Direction::Decompress
    }

    fn init(&mut self) -> Result<(), CodecError> {
        self.calls.init.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.script.init_delay {
            std::thread::sleep(delay);
        }
        if self.script.fail_init {
            return Err(CodecError::InitFailed { codec: NAME.into(), msg: "scripted init failure".into() });
        }
        Ok(())
    }

    fn write(&mut self, input: &[u8], out: &mut [u8]) -> Result<Progress, CodecError> {
        let call = self.calls.write.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.script.write_delay {
            std::thread::sleep(delay);
        }
        if self.script.fail_write_on_call == Some(call) {
            return Err(Self::fault("scripted write failure"));
        }
        if self.script.panic_write_on_call == Some(call) {
            panic!("scripted codec panic");
        }

        let mut n = input.len().min(out.len());
        if let Some(max) = self.script.max_consume {
            n = n.min(max);
        }
        if let Some(limit) = self.script.eos_after {
            n = n.min(limit.saturating_sub(self.consumed_total));
        }
        out[..n].copy_from_slice(&input[..n]);
        self.consumed_total += n;

        let status = match self.script.eos_after {
            Some(limit) if self.consumed_total >= limit => CodecStatus::StreamEnd,
            _ => CodecStatus::Ok,
        };
        Ok(Progress::new(n, n, status))
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<Progress, CodecError> {
        self.calls.finish.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_finish {
            return Err(Self::fault("scripted finish failure"));
        }
        let rest = &self.script.trailer[self.trailer_pos..];
        let n = rest.len().min(out.len());
        out[..n].copy_from_slice(&rest[..n]);
        self.trailer_pos += n;

        let status = if self.trailer_pos == self.script.trailer.len() {
            CodecStatus::StreamEnd
        } else {
            CodecStatus::Ok
        };
        Ok(Progress::new(0, n, status))
    }

    fn destroy(&mut self) {
        self.calls.destroy.fetch_add(1, Ordering::SeqCst);
    }
}

/// Route engine logs to the test harness; `RUST_LOG=codec_engine=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Flatten output chunks into a single blob.
pub fn concat_chunks(chunks: &[impl AsRef<[u8]>]) -> Vec<u8> {
    chunks.iter().flat_map(|c| c.as_ref()).copied().collect()
}
