//! Stats translation.
//!
//! Converts raw cumulative CPU and memory counters into percentage gauges.

use crate::schema::ServerStatus;

/// One point-in-time resource sample of a container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatsSample {
    /// Container CPU time consumed since the previous reading
    pub cpu_delta: i64,
    /// Host CPU time elapsed since the previous reading
    pub system_delta: i64,
    /// Number of cores the container can use
    pub core_count: u32,
    /// Memory in use, in bytes
    pub memory_usage: u64,
    /// Memory limit, in bytes
    pub memory_limit: u64,
}

impl StatsSample {
    /// CPU usage as a percentage of one core, summed across cores.
    ///
    /// Zero unless both the container and system deltas are positive.
    pub fn cpu_percent(&self) -> f64 {
        if self.system_delta > 0 && self.cpu_delta > 0 {
            (self.cpu_delta as f64 / self.system_delta as f64) * self.core_count as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Memory usage as a percentage of the limit; zero without a limit.
    pub fn memory_percent(&self) -> f64 {
        if self.memory_limit > 0 {
            (self.memory_usage as f64 / self.memory_limit as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Status record for `server_id` built from this sample.
    pub fn into_status(self, server_id: impl Into<String>, running: bool) -> ServerStatus {
        ServerStatus {
            server_id: server_id.into(),
            running,
            cpu_percent: self.cpu_percent(),
            memory_percent: self.memory_percent(),
            memory_usage: self.memory_usage,
        }
    }
}
