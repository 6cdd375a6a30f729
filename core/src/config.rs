//! config.rs
//! Engine configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FINISH_CHUNK, DEFAULT_QUEUE_CAPACITY, DEFAULT_WRITE_CHUNK, MAX_WORKERS};
use crate::engine::parallelism::ParallelismProfile;
use crate::types::EngineError;

/// How far the output buffer grows before each codec `write` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SizingPolicy {
    /// Remaining input + 1: enough for one pass of most compressors.
    #[default]
    WorstCase,
    /// Fixed steps; the session loops while the codec fills the window.
    Chunked { chunk: usize },
}

impl SizingPolicy {
    /// Chunked growth with the default 16 KiB step.
    pub fn chunked() -> Self {
        SizingPolicy::Chunked { chunk: DEFAULT_WRITE_CHUNK }
    }

    pub fn write_growth(&self, remaining_input: usize) -> usize {
        match self {
            SizingPolicy::WorstCase => remaining_input.saturating_add(1),
            SizingPolicy::Chunked { chunk } => *chunk,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub worker_count: usize,
    pub sizing: SizingPolicy,
    pub finish_chunk_size: usize,
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: ParallelismProfile::dynamic(MAX_WORKERS).worker_count,
            sizing: SizingPolicy::default(),
            finish_chunk_size: DEFAULT_FINISH_CHUNK,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn single_threaded() -> Self {
        Self {
            worker_count: ParallelismProfile::single_threaded().worker_count,
            ..Self::default()
        }
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_sizing(mut self, sizing: SizingPolicy) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn with_finish_chunk(mut self, finish_chunk_size: usize) -> Self {
        self.finish_chunk_size = finish_chunk_size;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.worker_count == 0 {
            return Err(EngineError::Config("worker_count must be at least 1".into()));
        }
        if self.worker_count > MAX_WORKERS {
            return Err(EngineError::Config(format!(
                "worker_count {} exceeds cap {}",
                self.worker_count, MAX_WORKERS
            )));
        }
        if self.finish_chunk_size == 0 {
            return Err(EngineError::Config("finish_chunk_size must be non-zero".into()));
        }
        if let SizingPolicy::Chunked { chunk: 0 } = self.sizing {
            return Err(EngineError::Config("sizing chunk must be non-zero".into()));
        }
        Ok(())
    }
}
