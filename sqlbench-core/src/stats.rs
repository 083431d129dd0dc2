use std::fmt;
use std::ops::AddAssign;
use std::time::Duration;
use time::macros::format_description;
use time::OffsetDateTime;

/// Completed and timed-out query counts over some window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueryCounts {
    pub completed: u64,
    pub timed_out: u64,
}

impl QueryCounts {
    pub fn total(&self) -> u64 {
        self.completed + self.timed_out
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl AddAssign for QueryCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.completed += rhs.completed;
        self.timed_out += rhs.timed_out;
    }
}

/// One watchdog sample.
///
/// The sampling interval is one second, so the interval counts are reported directly as
/// per-second rates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub timestamp: OffsetDateTime,
    /// 1-based sequence number within a run.
    pub sequence: u64,
    pub queries_per_second: u64,
    pub timeouts_per_second: u64,
}

impl SampleRecord {
    pub fn new(sequence: u64, counts: QueryCounts, timestamp: OffsetDateTime) -> Self {
        Self {
            timestamp,
            sequence,
            queries_per_second: counts.completed,
            timeouts_per_second: counts.timed_out,
        }
    }

    /// Line for the CSV sample record, without the trailing newline.
    pub fn csv_line(&self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        // NOTE: Formatting a UTC timestamp with a static description cannot fail.
        let timestamp = self.timestamp.format(&format).unwrap_or_default();
        format!(
            "{},{},{},{}",
            timestamp, self.sequence, self.queries_per_second, self.timeouts_per_second
        )
    }
}

impl fmt::Display for SampleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Queries Per Second: {} | Timeouts Per Second: {}",
            group_thousands(self.queries_per_second),
            group_thousands(self.timeouts_per_second),
        )
    }
}

/// Outcome of a single virtual user.
#[derive(Debug, Clone)]
pub struct UserResult {
    pub user_id: usize,
    /// Time spent waiting on query execution. Connection setup is excluded.
    pub elapsed: Duration,
    pub completed: u64,
    pub timed_out: u64,
}

impl UserResult {
    pub fn new(user_id: usize) -> Self {
        Self {
            user_id,
            elapsed: Duration::ZERO,
            completed: 0,
            timed_out: 0,
        }
    }

    pub fn record_completed(&mut self, elapsed: Duration) {
        self.elapsed += elapsed;
        self.completed += 1;
    }

    /// Timed-out attempts still count towards the user's busy time.
    pub fn record_timeout(&mut self, elapsed: Duration) {
        self.elapsed += elapsed;
        self.timed_out += 1;
    }

    pub fn counts(&self) -> QueryCounts {
        QueryCounts {
            completed: self.completed,
            timed_out: self.timed_out,
        }
    }
}

/// Aggregate statistics for one benchmark run.
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub user_count: usize,
    pub queries_per_user: usize,
    /// Attempted queries, timeouts included.
    pub total_queries_executed: u64,
    /// Sum of every user's busy time. Users run concurrently, so this is roughly
    /// `user_count` times the wall-clock time.
    pub total_query_runtime: Duration,
    pub overall_time_taken: Duration,
    /// Sum of each user's own throughput.
    pub average_queries_per_second: f64,
    pub completed: u64,
    pub timed_out: u64,
    /// Everything the watchdog drained, including the partial interval drained on stop.
    pub sampled: QueryCounts,
    pub samples: u64,
    pub latency_p50: Duration,
    pub latency_p90: Duration,
    pub latency_p99: Duration,
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QPS={:.2}, Completed={}, TimedOut={}, Overall={}, p50={:?}, p90={:?}, p99={:?}",
            self.average_queries_per_second,
            self.completed,
            self.timed_out,
            humantime::format_duration(self.overall_time_taken),
            self.latency_p50,
            self.latency_p90,
            self.latency_p99,
        )
    }
}

/// Format an integer with `,` thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
