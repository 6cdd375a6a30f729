//! Deflate (zlib wrapper) via flate2's raw streaming state.
//!
//! `Compress`/`Decompress` write straight into the caller's window and report
//! consumption through their running totals, which maps one-to-one onto
//! `Progress`.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::compression::constants::DEFAULT_LEVEL_DEFLATE;
use crate::compression::types::{Codec, CodecError, CodecStatus, Direction, Progress};

const NAME: &str = "deflate";

fn process_failed(msg: impl ToString) -> CodecError {
    CodecError::ProcessFailed { codec: NAME.into(), msg: msg.to_string() }
}

fn not_initialized() -> CodecError {
    process_failed("stream not initialized")
}

fn map_status(status: Status) -> CodecStatus {
    match status {
        Status::StreamEnd => CodecStatus::StreamEnd,
        // BufError only means "no progress possible"; the session judges stalls.
        Status::Ok | Status::BufError => CodecStatus::Ok,
    }
}

pub struct Deflate {
    level: Compression,
    stream: Option<Compress>,
}

impl Deflate {
    /// Levels outside 0..=9 fall back to the default.
    pub fn new(level: i32) -> Self {
        let level = match level {
            0..=9 => Compression::new(level as u32),
            _ => Compression::new(DEFAULT_LEVEL_DEFLATE as u32),
        };
        Self { level, stream: None }
    }

    fn run(&mut self, input: &[u8], out: &mut [u8], flush: FlushCompress) -> Result<Progress, CodecError> {
        let stream = self.stream.as_mut().ok_or_else(not_initialized)?;
        let (in_before, out_before) = (stream.total_in(), stream.total_out());
        let status = stream.compress(input, out, flush).map_err(process_failed)?;
        Ok(Progress::new(
            (stream.total_in() - in_before) as usize,
            (stream.total_out() - out_before) as usize,
            map_status(status),
        ))
    }
}

impl Default for Deflate {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL_DEFLATE)
    }
}

impl Codec for Deflate {
    fn name(&self) -> &'static str {
        NAME
    }

    fn direction(&self) -> Direction {
        Direction::Compress
    }

    fn init(&mut self) -> Result<(), CodecError> {
        if self.stream.is_some() {
            return Err(CodecError::InitFailed { codec: NAME.into(), msg: "already initialized".into() });
        }
        self.stream = Some(Compress::new(self.level, true));
        Ok(())
    }

    fn write(&mut self, input: &[u8], out: &mut [u8]) -> Result<Progress, CodecError> {
        self.run(input, out, FlushCompress::None)
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<Progress, CodecError> {
        self.run(&[], out, FlushCompress::Finish)
    }

    fn destroy(&mut self) {
        self.stream = None;
    }
}

pub struct Inflate {
    stream: Option<Decompress>,
    finished: bool,
}

impl Inflate {
    pub fn new() -> Self {
        Self { stream: None, finished: false }
    }

    fn run(&mut self, input: &[u8], out: &mut [u8]) -> Result<Progress, CodecError> {
        if self.finished {
            return Ok(Progress::new(0, 0, CodecStatus::StreamEnd));
        }
        let stream = self.stream.as_mut().ok_or_else(not_initialized)?;
        let (in_before, out_before) = (stream.total_in(), stream.total_out());
        let status = stream
            .decompress(input, out, FlushDecompress::None)
            .map_err(process_failed)?;
        let progress = Progress::new(
            (stream.total_in() - in_before) as usize,
            (stream.total_out() - out_before) as usize,
            map_status(status),
        );
        self.finished = progress.is_stream_end();
        Ok(progress)
    }
}

impl Default for Inflate {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for Inflate {
    fn name(&self) -> &'static str {
        NAME
    }

    fn direction(&self) -> Direction {
        Direction::Decompress
    }

    fn init(&mut self) -> Result<(), CodecError> {
        if self.stream.is_some() {
            return Err(CodecError::InitFailed { codec: NAME.into(), msg: "already initialized".into() });
        }
        self.stream = Some(Decompress::new(true));
        self.finished = false;
        Ok(())
    }

    fn write(&mut self, input: &[u8], out: &mut [u8]) -> Result<Progress, CodecError> {
        self.run(input, out)
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<Progress, CodecError> {
        // Flush output still held by the inflater; nothing left and no
        // end marker seen means the stream was truncated.
        let progress = self.run(&[], out)?;
        if !progress.is_stream_end() && progress.produced == 0 {
            return Err(CodecError::UnexpectedEof { codec: NAME.into() });
        }
        Ok(progress)
    }

    fn destroy(&mut self) {
        self.stream = None;
    }
}
