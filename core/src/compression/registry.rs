//! compression/registry.rs
//! Codec registry and factory functions.

use crate::compression::codecs::{Deflate, Inflate, ZstdDecoder, ZstdEncoder};
use crate::compression::constants::{DEFAULT_LEVEL_DEFLATE, DEFAULT_LEVEL_ZSTD};
use crate::compression::types::{Codec, CodecError, CodecKind, Direction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecInfo {
    pub name: &'static str,
    pub default_level: i32,
    pub level_range: (i32, i32),
}

pub fn resolve(codec_id: u16) -> Result<CodecInfo, CodecError> {
    match CodecKind::verify(codec_id)? {
        CodecKind::Deflate =>
            Ok(CodecInfo { name: "deflate", default_level: DEFAULT_LEVEL_DEFLATE, level_range: (0, 9) }),
        CodecKind::Zstd =>
            Ok(CodecInfo { name: "zstd", default_level: DEFAULT_LEVEL_ZSTD, level_range: (1, 22) }),
    }
}

/// Build an uninitialized codec. `level` is ignored for decompressors.
pub fn create_codec(kind: CodecKind, direction: Direction, level: Option<i32>) -> Box<dyn Codec> {
    match (kind, direction) {
        (CodecKind::Deflate, Direction::Compress) =>
            Box::new(Deflate::new(level.unwrap_or(DEFAULT_LEVEL_DEFLATE))),
        (CodecKind::Deflate, Direction::Decompress) => Box::new(Inflate::new()),
        (CodecKind::Zstd, Direction::Compress) =>
            Box::new(ZstdEncoder::new(level.unwrap_or(DEFAULT_LEVEL_ZSTD))),
        (CodecKind::Zstd, Direction::Decompress) => Box::new(ZstdDecoder::new()),
    }
}

pub fn create_codec_by_id(codec_id: u16, direction: Direction, level: Option<i32>)
    -> Result<Box<dyn Codec>, CodecError>
{
    Ok(create_codec(CodecKind::verify(codec_id)?, direction, level))
}
