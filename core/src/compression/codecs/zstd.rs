//! src/compression/codecs/zstd.rs
//!
//! Zstd streaming compressor/decompressor.
//!
//! Design notes:
//! - Wraps the raw (push-based) zstd contexts so output lands directly in the
//!   caller's window.
//! - Errors are mapped into `CodecError` variants with codec context.
//! - The decoder reports `StreamEnd` once the first frame is fully decoded and
//!   flushed (zstd signals this with a zero input hint).

use zstd::stream::raw::{Decoder, Encoder, InBuffer, Operation, OutBuffer};

use crate::compression::constants::DEFAULT_LEVEL_ZSTD;
use crate::compression::types::{Codec, CodecError, CodecStatus, Direction, Progress};

const NAME: &str = "zstd";

fn process_failed(e: std::io::Error) -> CodecError {
    CodecError::ProcessFailed { codec: NAME.into(), msg: e.to_string() }
}

fn init_failed(e: std::io::Error) -> CodecError {
    CodecError::InitFailed { codec: NAME.into(), msg: e.to_string() }
}

fn not_initialized() -> CodecError {
    CodecError::ProcessFailed { codec: NAME.into(), msg: "stream not initialized".into() }
}

/// Zstd streaming compressor.
pub struct ZstdEncoder {
    level: i32,
    context: Option<Encoder<'static>>,
}

impl ZstdEncoder {
    pub fn new(level: i32) -> Self {
        Self { level, context: None }
    }
}

impl Default for ZstdEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL_ZSTD)
    }
}

impl Codec for ZstdEncoder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn direction(&self) -> Direction {
        Direction::Compress
    }

    fn init(&mut self) -> Result<(), CodecError> {
        if self.context.is_some() {
            return Err(CodecError::InitFailed { codec: NAME.into(), msg: "already initialized".into() });
        }
        self.context = Some(Encoder::new(self.level).map_err(init_failed)?);
        Ok(())
    }

    fn write(&mut self, input: &[u8], out: &mut [u8]) -> Result<Progress, CodecError> {
        let context = self.context.as_mut().ok_or_else(not_initialized)?;
        let mut src = InBuffer::around(input);
        let mut dst = OutBuffer::around(out);
        context.run(&mut src, &mut dst).map_err(process_failed)?;
        Ok(Progress::new(src.pos(), dst.pos(), CodecStatus::Ok))
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<Progress, CodecError> {
        let context = self.context.as_mut().ok_or_else(not_initialized)?;
        let mut dst = OutBuffer::around(out);
        // Returns the number of bytes still waiting to be flushed.
        let remaining = context.finish(&mut dst, true).map_err(process_failed)?;
        let status = if remaining == 0 { CodecStatus::StreamEnd } else { CodecStatus::Ok };
        Ok(Progress::new(0, dst.pos(), status))
    }

    fn destroy(&mut self) {
        self.context = None;
    }
}

/// Zstd streaming decompressor (single frame).
pub struct ZstdDecoder {
    context: Option<Decoder<'static>>,
    finished: bool,
}

impl ZstdDecoder {
    pub fn new() -> Self {
        Self { context: None, finished: false }
    }

    fn run(&mut self, input: &[u8], out: &mut [u8]) -> Result<Progress, CodecError> {
        if self.finished {
            return Ok(Progress::new(0, 0, CodecStatus::StreamEnd));
        }
        let context = self.context.as_mut().ok_or_else(not_initialized)?;
        let mut src = InBuffer::around(input);
        let mut dst = OutBuffer::around(out);
        let hint = context.run(&mut src, &mut dst).map_err(process_failed)?;
        self.finished = hint == 0;
        let status = if self.finished { CodecStatus::StreamEnd } else { CodecStatus::Ok };
        Ok(Progress::new(src.pos(), dst.pos(), status))
    }
}

impl Default for ZstdDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for ZstdDecoder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn direction(&self) -> Direction {
        Direction::Decompress
    }

    fn init(&mut self) -> Result<(), CodecError> {
        if self.context.is_some() {
            return Err(CodecError::InitFailed { codec: NAME.into(), msg: "already initialized".into() });
        }
        self.context = Some(Decoder::new().map_err(init_failed)?);
        self.finished = false;
        Ok(())
    }

    fn write(&mut self, input: &[u8], out: &mut [u8]) -> Result<Progress, CodecError> {
        self.run(input, out)
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<Progress, CodecError> {
        let progress = self.run(&[], out)?;
        if !progress.is_stream_end() && progress.produced == 0 {
            return Err(CodecError::UnexpectedEof { codec: NAME.into() });
        }
        Ok(progress)
    }

    fn destroy(&mut self) {
        self.context = None;
    }
}
