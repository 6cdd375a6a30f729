//! codec-engine
//!
//! Runs stateful streaming codecs (compress / decompress) on a background
//! worker pool and relays results to the issuing thread in submission order.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod config;

// Building blocks
pub mod buffer;
pub mod queue;
pub mod state;

pub mod compression;
pub mod engine;
pub mod telemetry;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::buffer::GrowableBuffer;
    pub use crate::compression::{
        create_codec, Codec, CodecError, CodecKind, CodecStatus, Direction, Progress,
    };
    pub use crate::config::{EngineConfig, SizingPolicy};
    pub use crate::engine::{
        CodecSession, CodecStream, Dispatcher, JobResult, SessionHandle, Status, StreamEvent,
    };
    pub use crate::state::State;
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::EngineError;
}
