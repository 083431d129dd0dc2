//! Shared helpers for the sqlbench integration tests.
use sqlbench::core::BenchmarkConfig;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        // NOTE: Another test binary may already have installed a subscriber.
        let _ = FmtSubscriber::builder()
            .with_env_filter("sqlbench=debug,mock_db=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Config for runs against the mock database: no fixture, no live output, no CSV.
pub fn quiet_config(users: usize, queries: usize) -> BenchmarkConfig {
    BenchmarkConfig::new("SELECT * FROM benchmark_table WHERE id = '%guid%'")
        .users(users)
        .queries_per_user(queries)
        .skip_fixture(true)
        .live_sampling(false)
        .write_report(false)
}

/// Every UUID found between single quotes in `query`.
pub fn tokens(query: &str) -> Vec<Uuid> {
    query
        .split('\'')
        .filter_map(|part| Uuid::parse_str(part).ok())
        .collect()
}

pub fn assert_near(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= expected * tolerance,
        "{actual} is not within {}% of {expected}",
        tolerance * 100.
    );
}

pub fn assert_duration_near(actual: Duration, expected: Duration, tolerance: f64) {
    assert_near(actual.as_secs_f64(), expected.as_secs_f64(), tolerance);
}
