use mock_db::MockDatabase;
use sqlbench::core::SAMPLE_RECORD_HEADER;
use sqlbench::prelude::*;
use sqlbench_tests::*;
use std::collections::HashSet;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn single_user_steady_latency() {
    init();
    let db = MockDatabase::new().latency(Duration::from_millis(10));

    let report = Benchmark::new(db, quiet_config(1, 5)).run().await.unwrap();

    assert_eq!(report.total_queries_executed, 5);
    assert_duration_near(report.total_query_runtime, Duration::from_millis(50), 0.1);
    assert_near(report.average_queries_per_second, 100., 0.1);
}

#[tokio::test(start_paused = true)]
async fn two_users_rates_add_up() {
    init();
    let db = MockDatabase::new().latency(Duration::from_millis(5));

    let report = Benchmark::new(db, quiet_config(2, 10)).run().await.unwrap();

    assert_eq!(report.total_queries_executed, 20);
    assert_duration_near(report.total_query_runtime, Duration::from_millis(100), 0.1);
    assert_duration_near(report.overall_time_taken, Duration::from_millis(50), 0.1);
    assert_near(report.average_queries_per_second, 400., 0.1);
}

#[tokio::test(start_paused = true)]
async fn every_third_query_times_out() {
    init();
    let db = MockDatabase::new()
        .latency(Duration::from_millis(2))
        .timeout_every(3);

    let report = Benchmark::new(db, quiet_config(3, 10)).run().await.unwrap();

    assert_eq!(report.total_queries_executed, 30);
    assert_eq!(report.timed_out, 3 * (10 / 3));
    assert_eq!(report.completed, 30 - 9);
    assert_eq!(report.sampled.timed_out, 9);
    assert_eq!(report.sampled.completed, 21);
}

#[tokio::test(start_paused = true)]
async fn watchdog_accounts_for_every_query() {
    init();
    let db = MockDatabase::new()
        .latency(Duration::from_millis(10))
        .timeout_every(4);

    let report = Benchmark::new(db, quiet_config(4, 300)).run().await.unwrap();

    assert!(report.samples >= 2, "only {} samples", report.samples);
    assert_eq!(report.completed + report.timed_out, 1_200);
    assert_eq!(report.sampled.total(), report.completed + report.timed_out);
    assert_eq!(report.sampled.timed_out, report.timed_out);
}

#[tokio::test(start_paused = true)]
async fn guid_tokens_are_unique_across_users() {
    init();
    let db = MockDatabase::new().latency(Duration::from_millis(1));
    let config = quiet_config(5, 200);
    let config = BenchmarkConfig {
        query: "SELECT * FROM t WHERE a = '%guid%' OR b = '%guid%'".to_string(),
        ..config
    };

    Benchmark::new(db.clone(), config).run().await.unwrap();

    let queries = db.queries();
    assert_eq!(queries.len(), 1_000);

    let mut seen = HashSet::new();
    for query in &queries {
        let found = tokens(query);
        assert_eq!(found.len(), 2, "{query}");
        assert_eq!(found[0], found[1]);
        assert!(seen.insert(found[0]), "token reused: {query}");
    }
}

#[tokio::test(start_paused = true)]
#[ntest::timeout(10_000)]
async fn failing_user_voids_the_run() {
    init();
    let db = MockDatabase::new()
        .latency(Duration::from_millis(10))
        .fail_query(2, 5);

    let err = Benchmark::new(db.clone(), quiet_config(3, 1_000))
        .run()
        .await
        .unwrap_err();

    match err {
        BenchmarkError::User { user_id, source } => {
            assert!((1..=3).contains(&user_id));
            assert!(matches!(source, QueryError::Query(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    // The remaining users were stopped rather than run to completion.
    assert!(db.queries().len() < 3_000);
}

#[tokio::test(start_paused = true)]
async fn connection_failures_are_fatal() {
    init();
    let db = MockDatabase::new().refuse_connections();

    let err = Benchmark::new(db, quiet_config(2, 10)).run().await.unwrap_err();

    assert!(matches!(
        err,
        BenchmarkError::User {
            source: QueryError::Connection(_),
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn writes_sample_record() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let db = MockDatabase::new().latency(Duration::from_millis(10));
    let config = quiet_config(1, 250)
        .write_report(true)
        .report_dir(dir.path());

    let report = Benchmark::new(db, config).run().await.unwrap();

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("BenchmarkReport-") && name.ends_with(".csv"));

    let contents = std::fs::read_to_string(&files[0]).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines[0], SAMPLE_RECORD_HEADER);
    assert_eq!(lines.len() as u64, report.samples + 1);

    let mut recorded = 0;
    for (idx, line) in lines[1..].iter().enumerate() {
        let fields: Vec<_> = line.split(',').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[1], (idx + 1).to_string());
        recorded += fields[2].parse::<u64>().unwrap();
        assert_eq!(fields[3], "0");
    }
    assert!(recorded > 0);
    assert!(recorded <= report.completed);
}

#[tokio::test(start_paused = true)]
async fn iterations_reuse_the_fixture() {
    init();
    let db = MockDatabase::new().latency(Duration::from_millis(1));
    let config = quiet_config(2, 5).skip_fixture(false);
    let fixture = FixtureSpec::default().rows(1_000);

    let mut seen = vec![];
    let reports = Benchmark::new(db.clone(), config)
        .fixture(fixture)
        .run_iterations(3, |iteration, report| {
            seen.push((iteration, report.total_queries_executed))
        })
        .await
        .unwrap();

    assert_eq!(reports.len(), 3);
    assert_eq!(seen, vec![(1, 10), (2, 10), (3, 10)]);
    assert_eq!(db.table_rows("benchmark_table"), Some(1_000));
    assert_eq!(db.connections(), 3 * (1 + 2));
}
