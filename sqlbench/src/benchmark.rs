//! Benchmark orchestration
//!
//! One run: verify the fixture, start the watchdog, fan out the virtual users, wait for all of
//! them, stop the watchdog and aggregate the results.
use crate::counters::SharedCounters;
use crate::error::BenchmarkError;
use crate::fixture::{self, FixtureSpec};
use crate::latency::LatencyDigest;
use crate::report;
use crate::sampler::{Sampler, SamplerHandle, SamplerSettings};
use crate::template::QueryTemplate;
use crate::user::simulate_user;
use sqlbench_core::{BenchmarkConfig, BenchmarkReport, Connector};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Benchmark against the database reached through `C`.
///
/// # Example
///
/// ```ignore
/// use sqlbench::prelude::*;
///
/// let config = BenchmarkConfig::default().users(20).queries_per_user(10_000);
/// let report = Benchmark::new(PostgresConnector::new("host=localhost user=postgres"), config)
///     .run()
///     .await?;
/// println!("{report}");
/// ```
pub struct Benchmark<C> {
    connector: Arc<C>,
    config: BenchmarkConfig,
    template: QueryTemplate,
    fixture: FixtureSpec,
}

impl<C: Connector> Benchmark<C> {
    pub fn new(connector: C, config: BenchmarkConfig) -> Self {
        let template = QueryTemplate::new(&config.query);
        Self {
            connector: Arc::new(connector),
            config,
            template,
            fixture: FixtureSpec::default(),
        }
    }

    /// Override the fixture table definition.
    pub fn fixture(mut self, fixture: FixtureSpec) -> Self {
        self.fixture = fixture;
        self
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Execute a single run.
    #[instrument(
        name = "benchmark",
        skip_all,
        fields(users = self.config.user_count, queries = self.config.queries_per_user)
    )]
    pub async fn run(&self) -> Result<BenchmarkReport, BenchmarkError> {
        self.config.validate()?;

        if !self.config.skip_fixture {
            fixture::ensure(&*self.connector, &self.fixture).await?;
        }

        let counters = SharedCounters::new();
        let sampler = Sampler::new(counters.clone(), self.sampler_settings()).start()?;
        self.generate_load(counters, sampler).await
    }

    /// Fan out the users against a running watchdog and wait for both to finish. A failure of
    /// either side aborts the other.
    async fn generate_load(
        &self,
        counters: SharedCounters,
        mut sampler: SamplerHandle,
    ) -> Result<BenchmarkReport, BenchmarkError> {
        let latency = LatencyDigest::new();
        let start = Instant::now();

        let mut users = JoinSet::new();
        for user_id in 1..=self.config.user_count {
            users.spawn(simulate_user(
                user_id,
                self.connector.clone(),
                self.config.queries_per_user,
                self.template.clone(),
                counters.clone(),
                latency.clone(),
            ));
        }
        debug!("Launched {} users", self.config.user_count);

        let mut results = Vec::with_capacity(self.config.user_count);
        loop {
            tokio::select! {
                joined = users.join_next() => {
                    let Some(joined) = joined else { break };
                    match joined.map_err(BenchmarkError::from).and_then(|res| res) {
                        Ok(result) => results.push(result),
                        Err(err) => {
                            users.abort_all();
                            // NOTE: The run is void either way; stop the watchdog so nothing outlives it.
                            if let Err(sampler_err) = sampler.stop().await {
                                warn!("Watchdog failed while aborting: {sampler_err}");
                            }
                            return Err(err);
                        }
                    }
                }
                err = sampler.failure() => {
                    users.abort_all();
                    error!("Watchdog exited early, aborting {} users", users.len());
                    return Err(err);
                }
            }
        }

        let overall = start.elapsed();
        let summary = sampler.stop().await?;
        results.sort_by_key(|r| r.user_id);

        let report = report::aggregate(
            &results,
            self.config.queries_per_user,
            overall,
            summary,
            &latency,
        );
        if report.sampled.total() != report.completed + report.timed_out {
            error!(
                "Watchdog drained {} queries but users reported {}",
                report.sampled.total(),
                report.completed + report.timed_out
            );
        }
        debug!("Benchmark complete: {report}");

        Ok(report)
    }

    /// Execute `iterations` runs back to back, handing each report to `on_report` as it
    /// completes. Stops at the first failed run.
    pub async fn run_iterations<F>(
        &self,
        iterations: usize,
        mut on_report: F,
    ) -> Result<Vec<BenchmarkReport>, BenchmarkError>
    where
        F: FnMut(usize, &BenchmarkReport),
    {
        let mut reports = Vec::with_capacity(iterations);
        for iteration in 1..=iterations {
            if iteration == 1 {
                info!("Starting Benchmark");
            }
            let report = self.run().await?;
            on_report(iteration, &report);
            reports.push(report);
        }
        Ok(reports)
    }

    fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            interval: self.config.sample_interval,
            live: self.config.live_sampling,
            record_dir: self
                .config
                .write_report
                .then(|| self.config.report_dir.clone()),
        }
    }
}
