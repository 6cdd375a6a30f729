//! compression/codecs/mod.rs
//! Concrete `Codec` adapters.

pub mod deflate;
pub mod zstd;

pub use self::deflate::*;
pub use self::zstd::*;
