//! telemetry/counters.rs
//! Mutable counters collected while the dispatcher runs.
//!
//! Updated by workers under the relay lock and converted into an immutable
//! `TelemetrySnapshot` on demand.
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub sessions_opened: u64,
    pub jobs_write: u64,
    pub jobs_close: u64,
    pub jobs_destroy: u64,
    pub jobs_failed: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl TelemetryCounters {
    pub fn add_session(&mut self) {
        self.sessions_opened += 1;
    }

    /// Record one executed write job.
    ///
    /// - `input_len`: bytes handed to the codec
    /// - `output_len`: bytes the codec produced (partial output on failure included)
    pub fn add_write(&mut self, input_len: usize, output_len: usize) {
        self.jobs_write += 1;
        self.bytes_in += input_len as u64;
        self.bytes_out += output_len as u64;
    }

    /// Record one executed close job; `output_len` is the flushed trailer.
    pub fn add_close(&mut self, output_len: usize) {
        self.jobs_close += 1;
        self.bytes_out += output_len as u64;
    }

    pub fn add_destroy(&mut self) {
        self.jobs_destroy += 1;
    }

    pub fn add_failure(&mut self) {
        self.jobs_failed += 1;
    }

    pub fn jobs_total(&self) -> u64 {
        self.jobs_write + self.jobs_close + self.jobs_destroy
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.sessions_opened += other.sessions_opened;
        self.jobs_write += other.jobs_write;
        self.jobs_close += other.jobs_close;
        self.jobs_destroy += other.jobs_destroy;
        self.jobs_failed += other.jobs_failed;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
