use thiserror::Error;

use crate::{
    compression::CodecError,
    state::{Operation, State},
};

/// Unified engine error handed to continuations and returned from the
/// submission surface.
/// - `From<CodecError>` enables `?` from codec adapters into session code.
/// - `Clone` because the same error may be reported to a continuation and
///   mirrored into a stream's event queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Operation invalid for the current state (e.g. write after close).
    #[error("call sequence error: cannot {op} in state {state}")]
    Sequence { op: Operation, state: State },

    /// Output buffer growth failed.
    #[error("out of memory: failed to grow output buffer by {requested} bytes")]
    Allocation { requested: usize },

    /// The codec reported a data/config/parameter fault.
    #[error("codec fault: {0}")]
    Codec(#[from] CodecError),

    /// Malformed continuation. Reserved for binding layers.
    #[error("callback contract error: {0}")]
    CallbackContract(String),

    /// Rejected engine configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A worker thread could not be started.
    #[error("failed to spawn worker: {0}")]
    Spawn(String),

    /// The worker pool no longer accepts work.
    #[error("dispatcher is shut down")]
    ShutDown,
}

impl EngineError {
    /// True for faults that move a session into `State::Error`.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Allocation { .. } | EngineError::Codec(_))
    }
}
