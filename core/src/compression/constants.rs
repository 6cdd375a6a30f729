/// Stable codec IDs (u16).
pub mod codec_ids {
    pub const DEFLATE: u16 = 0x0001;
    pub const ZSTD: u16    = 0x0002;
}

/// Default compression levels (balanced).
pub const DEFAULT_LEVEL_DEFLATE: i32 = 6;
pub const DEFAULT_LEVEL_ZSTD: i32 = 3;
