//! compression/mod.rs
//! Codec collaborator contract and the bundled adapters.
//!
//! - `types` defines the four-operation `Codec` contract the engine drives.
//! - `codecs` wraps flate2 and zstd streaming state behind that contract.
//! - `registry` resolves codec IDs to implementations.

pub mod constants;
pub mod types;
pub mod registry;
pub mod codecs;

pub use constants::*;
pub use types::*;
pub use registry::*;
