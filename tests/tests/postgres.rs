#[cfg(feature = "integration")]
mod tests {
    use sqlbench::fixture::FixtureSpec;
    use sqlbench::prelude::*;
    use sqlbench_tests::*;
    use std::time::Duration;

    /// Needs a reachable server, e.g. `SQLBENCH_POSTGRES="host=localhost user=postgres"`.
    fn connector() -> PostgresConnector {
        let config = std::env::var("SQLBENCH_POSTGRES")
            .unwrap_or_else(|_| "host=localhost user=postgres".to_string());
        PostgresConnector::new(&config).timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn end_to_end() {
        init();
        let config = quiet_config(4, 200).skip_fixture(false);
        let report = Benchmark::new(connector(), config)
            .fixture(FixtureSpec::default().rows(5_000))
            .run()
            .await
            .unwrap();

        assert_eq!(report.total_queries_executed, 800);
        assert_eq!(report.completed + report.timed_out, 800);
        assert!(report.average_queries_per_second > 0.);
    }

    #[tokio::test]
    async fn server_side_cancel_is_a_timeout() {
        init();
        let mut conn = connector().connect().await.unwrap();
        conn.execute("SET statement_timeout = 50").await.unwrap();

        let err = conn.execute("SELECT pg_sleep(1)").await.unwrap_err();
        assert_eq!(err, QueryError::Timeout);
    }

    #[tokio::test]
    async fn client_side_timeout_cancels_query() {
        init();
        let mut conn = connector()
            .timeout(Duration::from_millis(100))
            .connect()
            .await
            .unwrap();

        let err = conn.execute("SELECT pg_sleep(5)").await.unwrap_err();
        assert_eq!(err, QueryError::Timeout);
        conn.execute("SELECT 1").await.unwrap();
    }
}
