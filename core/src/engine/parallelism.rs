/// Worker pool sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelismProfile {
    pub worker_count: usize,
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self { worker_count: 1 }
    }

    /// One worker per core, leaving one core free for the issuing context.
    pub fn dynamic(hard_cap: usize) -> Self {
        let cores = num_cpus::get();
        let worker_count = cores.saturating_sub(1).max(1).min(hard_cap.max(1));
        Self { worker_count }
    }
}
