//! Live sampling output. Kept in its own binary since `traced_test` installs the global
//! subscriber.
use mock_db::MockDatabase;
use sqlbench::prelude::*;
use sqlbench_tests::quiet_config;
use std::time::Duration;
use tracing_test::traced_test;

#[traced_test]
#[tokio::test(start_paused = true)]
async fn prints_one_line_per_interval() {
    let db = MockDatabase::new().latency(Duration::from_millis(10));
    let config = quiet_config(1, 250).live_sampling(true);

    let report = Benchmark::new(db, config).run().await.unwrap();

    assert!(report.samples >= 2);
    assert!(logs_contain("Queries Per Second: "));
    assert!(logs_contain("| Timeouts Per Second: 0"));
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn silent_when_disabled() {
    let db = MockDatabase::new().latency(Duration::from_millis(10));

    let report = Benchmark::new(db, quiet_config(1, 250)).run().await.unwrap();

    assert!(report.samples >= 2);
    assert!(!logs_contain("Queries Per Second"));
}
