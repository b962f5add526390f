//! Container resource monitoring.
//!
//! Reads a single, non-streaming statistics sample from the daemon and
//! reduces it to the raw counters [`StatsSample`] needs.

use crate::container::{ContainerError, Result, StatsSample};
use bollard::Docker;
use bollard::models::ContainerStatsResponse;
use futures::stream::StreamExt;
use tracing::debug;

/// Resource monitor for containers.
#[derive(Clone)]
pub struct ResourceMonitor {
    docker: Docker,
}

impl ResourceMonitor {
    /// Create a new resource monitor.
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Take one statistics sample of a container.
    ///
    /// # Errors
    ///
    /// Returns error if container not found or stats unavailable.
    pub async fn sample(&self, container: &str) -> Result<StatsSample> {
        debug!("Fetching stats for container: {}", container);

        let options = bollard::query_parameters::StatsOptionsBuilder::new()
            .stream(false)
            .one_shot(true)
            .build();

        let mut stream = self.docker.stats(container, Some(options));

        match stream.next().await {
            Some(Ok(stats)) => Ok(Self::to_sample(&stats)),
            Some(Err(e)) => Err(ContainerError::from_api(container, e)),
            None => Err(ContainerError::StatsUnavailable(container.to_string())),
        }
    }

    fn to_sample(stats: &ContainerStatsResponse) -> StatsSample {
        let cpu_stats = stats.cpu_stats.as_ref();
        let precpu_stats = stats.precpu_stats.as_ref();

        let total_usage = |usage: Option<&bollard::models::ContainerCpuStats>| {
            usage
                .and_then(|s| s.cpu_usage.as_ref())
                .and_then(|u| u.total_usage)
                .unwrap_or(0)
        };
        let system_usage = |usage: Option<&bollard::models::ContainerCpuStats>| {
            usage.and_then(|s| s.system_cpu_usage).unwrap_or(0)
        };

        let cpu_delta = signed_delta(total_usage(cpu_stats), total_usage(precpu_stats));
        let system_delta = signed_delta(system_usage(cpu_stats), system_usage(precpu_stats));

        let core_count = cpu_stats
            .and_then(|s| s.online_cpus)
            .filter(|cpus| *cpus > 0)
            .or_else(|| {
                cpu_stats
                    .and_then(|s| s.cpu_usage.as_ref())
                    .and_then(|u| u.percpu_usage.as_ref())
                    .map(|per_cpu| per_cpu.len() as u32)
                    .filter(|cpus| *cpus > 0)
            })
            .unwrap_or(1);

        let (memory_usage, memory_limit) = stats
            .memory_stats
            .as_ref()
            .map(|mem| (mem.usage.unwrap_or(0), mem.limit.unwrap_or(0)))
            .unwrap_or((0, 0));

        StatsSample {
            cpu_delta,
            system_delta,
            core_count,
            memory_usage,
            memory_limit,
        }
    }
}

/// Difference of two cumulative counters, negative when the counter went back.
fn signed_delta(current: u64, previous: u64) -> i64 {
    let delta = i128::from(current) - i128::from(previous);
    delta.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{ContainerCpuStats, ContainerCpuUsage, ContainerMemoryStats};

    fn cpu(total: u64, system: u64, online: Option<u32>) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total),
                percpu_usage: Some(vec![0, 0]),
                ..Default::default()
            }),
            system_cpu_usage: Some(system),
            online_cpus: online,
            ..Default::default()
        }
    }

    #[test]
    fn test_sample_from_stats() {
        let stats = ContainerStatsResponse {
            cpu_stats: Some(cpu(300, 2000, Some(8))),
            precpu_stats: Some(cpu(100, 1000, Some(8))),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(1024),
                limit: Some(4096),
                ..Default::default()
            }),
            ..Default::default()
        };

        let sample = ResourceMonitor::to_sample(&stats);
        assert_eq!(sample.cpu_delta, 200);
        assert_eq!(sample.system_delta, 1000);
        assert_eq!(sample.core_count, 8);
        assert_eq!(sample.memory_usage, 1024);
        assert_eq!(sample.memory_limit, 4096);
    }

    #[test]
    fn test_core_count_falls_back_to_per_cpu_usage() {
        let stats = ContainerStatsResponse {
            cpu_stats: Some(cpu(300, 2000, None)),
            precpu_stats: Some(cpu(100, 1000, None)),
            ..Default::default()
        };

        let sample = ResourceMonitor::to_sample(&stats);
        assert_eq!(sample.core_count, 2);
        assert_eq!(sample.memory_limit, 0);
    }

    #[test]
    fn test_counter_going_backwards_is_negative() {
        assert_eq!(signed_delta(100, 300), -200);
        assert_eq!(signed_delta(u64::MAX, 0), i64::MAX);
    }
}
