//! Aggregation of per-user results into a [`BenchmarkReport`].
use crate::latency::LatencyDigest;
use crate::sampler::SamplerSummary;
use sqlbench_core::{BenchmarkReport, UserResult};
use std::time::Duration;

pub fn aggregate(
    users: &[UserResult],
    queries_per_user: usize,
    overall_time_taken: Duration,
    sampler: SamplerSummary,
    latency: &LatencyDigest,
) -> BenchmarkReport {
    BenchmarkReport {
        user_count: users.len(),
        queries_per_user,
        total_queries_executed: (users.len() as u64).saturating_mul(queries_per_user as u64),
        total_query_runtime: users.iter().map(|u| u.elapsed).sum(),
        overall_time_taken,
        average_queries_per_second: summed_throughput(users, queries_per_user),
        completed: users.iter().map(|u| u.completed).sum(),
        timed_out: users.iter().map(|u| u.timed_out).sum(),
        sampled: sampler.total(),
        samples: sampler.samples,
        latency_p50: latency.quantile(0.5),
        latency_p90: latency.quantile(0.9),
        latency_p99: latency.quantile(0.99),
    }
}

/// Each user's own rate, summed. Users run concurrently, so their rates add up to the system's
/// throughput. Users with no measured time have no defined rate and are left out.
pub fn summed_throughput(users: &[UserResult], queries_per_user: usize) -> f64 {
    users
        .iter()
        .filter(|u| !u.elapsed.is_zero())
        .map(|u| queries_per_user as f64 / u.elapsed.as_secs_f64())
        .sum()
}
