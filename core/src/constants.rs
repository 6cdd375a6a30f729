//! Engine-wide defaults, used when a config field is omitted.

/// Chunk size used while draining a codec on close (bytes per `finish` call).
pub const DEFAULT_FINISH_CHUNK: usize = 128;

/// Growth step for `SizingPolicy::Chunked` (16 KiB).
pub const DEFAULT_WRITE_CHUNK: usize = 16 * 1024;

/// Initial slot count of a session's job queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// Constant term of the job queue growth formula: `cap + cap/2 + QUEUE_GROWTH_STEP`.
pub const QUEUE_GROWTH_STEP: usize = 8;

/// Upper bound on configured worker threads.
pub const MAX_WORKERS: usize = 256;

/// Thread name prefix for pool workers.
pub const WORKER_THREAD_PREFIX: &str = "codec-worker";
