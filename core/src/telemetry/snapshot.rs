//! telemetry/snapshot.rs
//! Immutable view of dispatcher counters and stage timings.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub sessions_opened: u64,
    pub jobs_write: u64,
    pub jobs_close: u64,
    pub jobs_destroy: u64,
    pub jobs_failed: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// `bytes_out / bytes_in`; 0.0 before any input.
    pub ratio: f64,
    pub throughput_in_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let ratio = if counters.bytes_in > 0 {
            counters.bytes_out as f64 / counters.bytes_in as f64
        } else {
            0.0
        };

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_in as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            sessions_opened: counters.sessions_opened,
            jobs_write: counters.jobs_write,
            jobs_close: counters.jobs_close,
            jobs_destroy: counters.jobs_destroy,
            jobs_failed: counters.jobs_failed,
            bytes_in: counters.bytes_in,
            bytes_out: counters.bytes_out,
            ratio,
            throughput_in_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn jobs_total(&self) -> u64 {
        self.jobs_write + self.jobs_close + self.jobs_destroy
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }
}
