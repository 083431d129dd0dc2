//! Benchmark fixture table bootstrapping
//!
//! Makes sure the fixture table exists with exactly the expected number of rows. A table with
//! any other row count is treated as corrupt: it is dropped and rebuilt from scratch.
use crate::error::BenchmarkError;
use sqlbench_core::{
    group_thousands, Connection, Connector, QueryError, Statement, Value, FIXTURE_PROGRESS_STEP,
    FIXTURE_ROW_COUNT, FIXTURE_STATEMENT_BATCH_SIZE, FIXTURE_TABLE, FIXTURE_VALUE_BATCH_SIZE,
};
use std::fmt::Write;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSpec {
    table: String,
    row_count: u64,
    /// Rows per INSERT statement, never zero.
    value_batch_size: usize,
    /// INSERT statements per round-trip, never zero.
    statement_batch_size: usize,
    /// Minimum progress, in percentage points, between two progress notices.
    progress_step: f64,
}

impl Default for FixtureSpec {
    fn default() -> Self {
        Self {
            table: FIXTURE_TABLE.to_string(),
            row_count: FIXTURE_ROW_COUNT,
            value_batch_size: FIXTURE_VALUE_BATCH_SIZE,
            statement_batch_size: FIXTURE_STATEMENT_BATCH_SIZE,
            progress_step: FIXTURE_PROGRESS_STEP,
        }
    }
}

impl FixtureSpec {
    pub fn table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    pub fn rows(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn batch_sizes(mut self, values: usize, statements: usize) -> Self {
        self.value_batch_size = values.max(1);
        self.statement_batch_size = statements.max(1);
        self
    }

    fn statement_count(&self) -> u64 {
        self.row_count.div_ceil(self.value_batch_size as u64)
    }

    fn exists_query(&self) -> Statement {
        Statement::new(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' AND table_name::text = $1",
        )
        .bind(Value::Text(self.table.clone()))
    }

    fn count_query(&self) -> Statement {
        Statement::new(format!("SELECT count(*) FROM \"{}\"", self.table))
    }

    fn drop_table(&self) -> String {
        format!("DROP TABLE \"{}\"", self.table)
    }

    fn create_table(&self) -> String {
        format!(
            "CREATE TABLE \"{0}\" (\
             id uuid NOT NULL, \
             name varchar(255) NOT NULL, \
             CONSTRAINT \"pk_{0}\" PRIMARY KEY (id))",
            self.table
        )
    }

    /// Build the INSERT for rows `first..first + count` (1-based row numbers).
    fn insert(&self, first: u64, count: u64) -> Statement {
        let mut sql = format!("INSERT INTO \"{}\" (id, name) VALUES ", self.table);
        let mut params = Vec::with_capacity(count as usize * 2);

        for (idx, row) in (first..first + count).enumerate() {
            if idx > 0 {
                sql.push_str(", ");
            }
            let _ = write!(sql, "(${}, ${})", idx * 2 + 1, idx * 2 + 2);
            params.push(Value::Uuid(Uuid::new_v4()));
            params.push(Value::Text(format!("Test User #{row}")));
        }

        Statement { sql, params }
    }

    /// INSERT statements covering every row, in order.
    fn inserts(&self) -> impl Iterator<Item = Statement> + '_ {
        let batch = self.value_batch_size as u64;
        (0..self.statement_count()).map(move |idx| {
            let first = idx * batch + 1;
            let count = batch.min(self.row_count - idx * batch);
            self.insert(first, count)
        })
    }
}

/// What bootstrapping had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureOutcome {
    /// Table already present with the expected row count; nothing was written.
    Verified,
    Created,
    /// Table was present with the wrong row count and has been rebuilt.
    Recreated { previous_rows: i64 },
}

/// Verify the fixture table, creating or rebuilding it when needed.
#[instrument(name = "fixture", skip_all, fields(table = %spec.table))]
pub async fn ensure<C: Connector>(
    connector: &C,
    spec: &FixtureSpec,
) -> Result<FixtureOutcome, BenchmarkError> {
    ensure_inner(connector, spec)
        .await
        .map_err(BenchmarkError::Bootstrap)
}

async fn ensure_inner<C: Connector>(
    connector: &C,
    spec: &FixtureSpec,
) -> Result<FixtureOutcome, QueryError> {
    debug!("Verifying schema is in place for test");
    let mut conn = connector.connect().await?;

    let mut outcome = FixtureOutcome::Created;
    if conn.query_scalar(&spec.exists_query()).await? == 1 {
        let rows = conn.query_scalar(&spec.count_query()).await?;
        if rows >= 0 && rows as u64 == spec.row_count {
            debug!("Fixture table verified with {rows} rows");
            return Ok(FixtureOutcome::Verified);
        }

        info!(
            "Test table existed but had a mismatch of data ({} of {} rows); dropping to re-create it",
            rows, spec.row_count
        );
        conn.execute(&spec.drop_table()).await?;
        outcome = FixtureOutcome::Recreated {
            previous_rows: rows,
        };
    }

    info!(
        "Creating database table '{}' and filling with test data of {} rows",
        spec.table,
        group_thousands(spec.row_count)
    );
    conn.execute(&spec.create_table()).await?;

    populate(&mut conn, spec).await?;
    info!("Committed test data to database OK");

    Ok(outcome)
}

async fn populate<T: Connection>(conn: &mut T, spec: &FixtureSpec) -> Result<(), QueryError> {
    info!("Committing test data to database...");
    let total = spec.statement_count();
    let mut group = Vec::with_capacity(spec.statement_batch_size);
    let mut processed = 0u64;
    let mut last_progress = 0.;

    for statement in spec.inserts() {
        group.push(statement);
        processed += 1;

        if group.len() == spec.statement_batch_size || processed == total {
            let progress = processed as f64 / total as f64 * 100.;
            if progress - last_progress > spec.progress_step {
                info!("Executing INSERT batch ({progress:.2}%)");
                last_progress = progress;
            }

            conn.execute_group(&group).await?;
            group.clear();
        }
    }

    Ok(())
}
