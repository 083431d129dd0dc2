use mock_db::MockDatabase;
use sqlbench::fixture::{ensure, FixtureOutcome, FixtureSpec};
use sqlbench::prelude::*;
use sqlbench::core::FIXTURE_TABLE;
use sqlbench_tests::init;

fn spec() -> FixtureSpec {
    FixtureSpec::default().rows(10_000)
}

#[tokio::test]
async fn creates_table_in_bounded_round_trips() {
    init();
    let db = MockDatabase::new();

    let outcome = ensure(&db, &spec()).await.unwrap();

    assert_eq!(outcome, FixtureOutcome::Created);
    assert_eq!(db.table_rows(FIXTURE_TABLE), Some(10_000));
    // 100 rows per INSERT, 5 INSERTs per round-trip
    assert_eq!(db.round_trips(), 20);
    assert_eq!(db.writes(), 1 + 100);
}

#[tokio::test]
async fn second_pass_is_a_no_op() {
    init();
    let db = MockDatabase::new();
    ensure(&db, &spec()).await.unwrap();
    let writes = db.writes();
    let round_trips = db.round_trips();

    let outcome = ensure(&db, &spec()).await.unwrap();

    assert_eq!(outcome, FixtureOutcome::Verified);
    assert_eq!(db.writes(), writes);
    assert_eq!(db.round_trips(), round_trips);
}

#[tokio::test]
async fn corrupt_table_is_rebuilt_to_exact_size() {
    init();
    for existing in [0, 9_999, 10_001, 250_000] {
        let db = MockDatabase::new().with_table(FIXTURE_TABLE, existing);

        let outcome = ensure(&db, &spec()).await.unwrap();

        assert_eq!(
            outcome,
            FixtureOutcome::Recreated {
                previous_rows: existing as i64
            }
        );
        assert_eq!(db.table_rows(FIXTURE_TABLE), Some(10_000));
        // DROP + CREATE + INSERTs
        assert_eq!(db.writes(), 2 + 100);
    }
}

#[tokio::test]
async fn uneven_row_counts_are_fully_inserted() {
    init();
    let db = MockDatabase::new();
    let spec = FixtureSpec::default().rows(1_001).batch_sizes(10, 3);

    ensure(&db, &spec).await.unwrap();

    assert_eq!(db.table_rows(FIXTURE_TABLE), Some(1_001));
    // 101 INSERTs in groups of 3
    assert_eq!(db.round_trips(), 34);
}

#[tokio::test]
async fn unreachable_server_fails_bootstrapping() {
    init();
    let err = ensure(&MockDatabase::new().refuse_connections(), &spec())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BenchmarkError::Bootstrap(QueryError::Connection(_))
    ));
    assert!(err.to_string().starts_with("Fixture bootstrapping failed"));
}
