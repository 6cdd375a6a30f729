//! compression/types.rs
//! Codec collaborator contract and its error type.
use std::fmt;
use num_enum::TryFromPrimitive;
use thiserror::Error;

use crate::compression::constants::codec_ids;
use crate::utils::enum_name_or_hex;

/// Stable codec identifiers.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum CodecKind {
    Deflate = codec_ids::DEFLATE,
    Zstd    = codec_ids::ZSTD,
}

impl CodecKind {
    pub fn verify(raw: u16) -> Result<Self, CodecError> {
        CodecKind::try_from_primitive(raw).map_err(|_| CodecError::UnsupportedCodec { codec_id: raw })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Compress,
    Decompress,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Compress   => f.write_str("compress"),
            Direction::Decompress => f.write_str("decompress"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unsupported codec: {}", enum_name_or_hex::<CodecKind>(*codec_id))]
    UnsupportedCodec { codec_id: u16 },

    #[error("codec {codec} init failed: {msg}")]
    InitFailed { codec: String, msg: String },

    #[error("codec {codec} process failed: {msg}")]
    ProcessFailed { codec: String, msg: String },

    #[error("codec {codec}: unexpected end of input")]
    UnexpectedEof { codec: String },

    #[error("codec {codec} made no progress")]
    Stalled { codec: String },
}

/// Outcome reported by a single codec call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CodecStatus {
    /// More input (or more finish calls) expected.
    Ok,
    /// The stream is complete; for decompressors any remaining input is ignored.
    StreamEnd,
}

/// Bytes moved by one `write`/`finish` call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub consumed: usize,
    pub produced: usize,
    pub status: CodecStatus,
}

impl Progress {
    pub fn new(consumed: usize, produced: usize, status: CodecStatus) -> Self {
        Self { consumed, produced, status }
    }

    pub fn is_stream_end(&self) -> bool {
        self.status == CodecStatus::StreamEnd
    }

    pub fn made_progress(&self) -> bool {
        self.consumed > 0 || self.produced > 0
    }
}

/// External codec contract.
///
/// The engine guarantees a single thread drives an instance at any time, but
/// instances move between pool threads, hence `Send`.
pub trait Codec: Send {
    /// Short codec name used in errors and logs.
    fn name(&self) -> &'static str;

    fn direction(&self) -> Direction;

    /// Allocate codec state.
    fn init(&mut self) -> Result<(), CodecError>;

    /// Feed `input`, writing into `out`. May consume only part of `input`
    /// (the engine re-invokes with the remainder).
    fn write(&mut self, input: &[u8], out: &mut [u8]) -> Result<Progress, CodecError>;

    /// Flush pending state into `out`. Called repeatedly until `StreamEnd`.
    fn finish(&mut self, out: &mut [u8]) -> Result<Progress, CodecError>;

    /// Release codec state. Must be idempotent.
    fn destroy(&mut self);
}
