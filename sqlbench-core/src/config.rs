use crate::{
    ConfigError, DEFAULT_QUERIES_PER_USER, DEFAULT_QUERY, DEFAULT_USER_COUNT, SAMPLE_INTERVAL,
};
use std::path::PathBuf;
use std::time::Duration;

/// Settings for a single benchmark run.
///
/// The connection target is not part of the config; it belongs to the
/// [`Connector`](crate::Connector) handed to the benchmark alongside it.
#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    /// Query template text. Every `%guid%` is replaced per execution.
    pub query: String,
    pub user_count: usize,
    pub queries_per_user: usize,
    pub skip_fixture: bool,
    pub live_sampling: bool,
    pub write_report: bool,
    pub sample_interval: Duration,
    /// Directory the CSV sample record is written into.
    pub report_dir: PathBuf,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY)
    }
}

impl BenchmarkConfig {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            user_count: DEFAULT_USER_COUNT,
            queries_per_user: DEFAULT_QUERIES_PER_USER,
            skip_fixture: false,
            live_sampling: true,
            write_report: true,
            sample_interval: SAMPLE_INTERVAL,
            report_dir: PathBuf::from("."),
        }
    }

    pub fn users(mut self, user_count: usize) -> Self {
        self.user_count = user_count;
        self
    }

    pub fn queries_per_user(mut self, queries_per_user: usize) -> Self {
        self.queries_per_user = queries_per_user;
        self
    }

    pub fn skip_fixture(mut self, skip: bool) -> Self {
        self.skip_fixture = skip;
        self
    }

    pub fn live_sampling(mut self, enabled: bool) -> Self {
        self.live_sampling = enabled;
        self
    }

    pub fn write_report(mut self, enabled: bool) -> Self {
        self.write_report = enabled;
        self
    }

    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = dir.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_count == 0 {
            return Err(ConfigError::NoUsers);
        }
        if self.queries_per_user == 0 {
            return Err(ConfigError::NoQueries);
        }
        if self.sample_interval.is_zero() {
            return Err(ConfigError::ZeroSampleInterval);
        }
        Ok(())
    }

    pub fn total_queries(&self) -> u64 {
        (self.user_count as u64).saturating_mul(self.queries_per_user as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BenchmarkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.user_count, 10);
        assert_eq!(config.queries_per_user, 100_000);
        assert_eq!(config.query, DEFAULT_QUERY);
    }

    #[test]
    fn rejects_empty_workloads() {
        let config = BenchmarkConfig::default().users(0);
        assert!(matches!(config.validate(), Err(ConfigError::NoUsers)));

        let config = BenchmarkConfig::default().queries_per_user(0);
        assert!(matches!(config.validate(), Err(ConfigError::NoQueries)));

        let config = BenchmarkConfig::default().sample_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroSampleInterval)
        ));
    }

    #[test]
    fn total_queries_is_product() {
        let config = BenchmarkConfig::default().users(7).queries_per_user(13);
        assert_eq!(config.total_queries(), 91);
    }
}
