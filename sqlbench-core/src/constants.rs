use std::time::Duration;

/// Marker replaced with a freshly generated UUID on every query execution.
pub const GUID_MARKER: &str = "%guid%";

/// Query used when none is provided.
pub const DEFAULT_QUERY: &str = "SELECT * FROM benchmark_table WHERE id = '%guid%'";

pub const DEFAULT_USER_COUNT: usize = 10;
pub const DEFAULT_QUERIES_PER_USER: usize = 100_000;
pub const DEFAULT_ITERATIONS: usize = 1;

/// Interval between two watchdog samples. Sample counts double as per-second rates, so changing
/// this changes the meaning of the CSV columns.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Per-query timeout applied by the database adapters.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

pub const FIXTURE_TABLE: &str = "benchmark_table";
pub const FIXTURE_ROW_COUNT: u64 = 1_000_000;

/// Rows carried by a single INSERT statement.
pub const FIXTURE_VALUE_BATCH_SIZE: usize = 100;

/// INSERT statements sent per round-trip.
pub const FIXTURE_STATEMENT_BATCH_SIZE: usize = 5;

/// Minimum progress (in percentage points) between two fixture progress notices.
pub const FIXTURE_PROGRESS_STEP: f64 = 5.;

/// Latencies a user buffers before folding them into the shared digest.
pub const LATENCY_FLUSH_SIZE: usize = 256;

pub const SAMPLE_RECORD_HEADER: &str = "UtcDateTime,Sample,QueriesPerSecond,TimeoutsPerSecond";

pub const METRIC_QUERY_LATENCY: &str = "sqlbench_query_latency";
pub const METRIC_QUERY_COMPLETED: &str = "sqlbench_query_completed";
pub const METRIC_QUERY_TIMEOUT: &str = "sqlbench_query_timeout";
