//! In-memory stand-in for a database server.
//!
//! Understands just enough of the fixture statements to track table existence and row counts,
//! and simulates latency, timeouts and failures for benchmark queries.
use parking_lot::Mutex;
use sqlbench_core::{Connection, Connector, QueryError, Statement, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone, Default)]
struct Behavior {
    latency: Duration,
    timeout_latency: Option<Duration>,
    timeout_every: Option<usize>,
    fail_query: Option<(usize, usize)>,
    refuse_connections: bool,
    fail_fixture_writes: bool,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, u64>,
    writes: u64,
    round_trips: u64,
    connections: usize,
    queries: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<State>>,
    behavior: Behavior,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time each benchmark query takes to complete.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.behavior.latency = latency;
        self
    }

    /// Every `n`th query on a connection times out.
    pub fn timeout_every(mut self, n: usize) -> Self {
        self.behavior.timeout_every = Some(n);
        self
    }

    /// Time a timed-out query spends before reporting the timeout. Defaults to the latency.
    pub fn timeout_latency(mut self, latency: Duration) -> Self {
        self.behavior.timeout_latency = Some(latency);
        self
    }

    /// The `query`th query (1-based) on the `connection`th connection (1-based) fails.
    pub fn fail_query(mut self, connection: usize, query: usize) -> Self {
        self.behavior.fail_query = Some((connection, query));
        self
    }

    pub fn refuse_connections(mut self) -> Self {
        self.behavior.refuse_connections = true;
        self
    }

    pub fn fail_fixture_writes(mut self) -> Self {
        self.behavior.fail_fixture_writes = true;
        self
    }

    pub fn with_table(self, name: &str, rows: u64) -> Self {
        self.state.lock().tables.insert(name.to_string(), rows);
        self
    }

    pub fn table_rows(&self, name: &str) -> Option<u64> {
        self.state.lock().tables.get(name).copied()
    }

    /// Number of DDL and INSERT statements executed.
    pub fn writes(&self) -> u64 {
        self.state.lock().writes
    }

    /// Number of statement groups received.
    pub fn round_trips(&self) -> u64 {
        self.state.lock().round_trips
    }

    pub fn connections(&self) -> usize {
        self.state.lock().connections
    }

    /// Benchmark queries received so far, in arrival order.
    pub fn queries(&self) -> Vec<String> {
        self.state.lock().queries.clone()
    }
}

impl Connector for MockDatabase {
    type Conn = MockConnection;

    async fn connect(&self) -> Result<MockConnection, QueryError> {
        if self.behavior.refuse_connections {
            return Err(QueryError::Connection("connection refused".to_string()));
        }

        let id = {
            let mut state = self.state.lock();
            state.connections += 1;
            state.connections
        };
        trace!("Opened mock connection {id}");

        Ok(MockConnection {
            id,
            executed: 0,
            state: self.state.clone(),
            behavior: self.behavior.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockConnection {
    id: usize,
    executed: usize,
    state: Arc<Mutex<State>>,
    behavior: Behavior,
}

impl MockConnection {
    fn ddl(&self, sql: &str) -> Result<(), QueryError> {
        let lower = sql.trim_start().to_lowercase();
        let mut state = self.state.lock();

        if let Some(rest) = lower.strip_prefix("drop table") {
            let name = table_name(rest);
            if state.tables.remove(&name).is_none() {
                return Err(QueryError::Query(format!("table \"{name}\" does not exist")));
            }
        } else {
            let name = table_name(lower.trim_start_matches("create table"));
            if state.tables.contains_key(&name) {
                return Err(QueryError::Query(format!("table \"{name}\" already exists")));
            }
            state.tables.insert(name, 0);
        }

        state.writes += 1;
        Ok(())
    }

    async fn benchmark_query(&mut self, sql: &str) -> Result<(), QueryError> {
        self.executed += 1;
        self.state.lock().queries.push(sql.to_string());

        if self.behavior.fail_query == Some((self.id, self.executed)) {
            tokio::time::sleep(self.behavior.latency).await;
            return Err(QueryError::Query("deadlock detected".to_string()));
        }

        let times_out = self
            .behavior
            .timeout_every
            .is_some_and(|n| self.executed % n == 0);

        if times_out {
            let latency = self.behavior.timeout_latency.unwrap_or(self.behavior.latency);
            tokio::time::sleep(latency).await;
            Err(QueryError::Timeout)
        } else {
            tokio::time::sleep(self.behavior.latency).await;
            Ok(())
        }
    }
}

impl Connection for MockConnection {
    async fn execute(&mut self, sql: &str) -> Result<(), QueryError> {
        let lower = sql.trim_start().to_lowercase();
        if lower.starts_with("drop table") || lower.starts_with("create table") {
            if self.behavior.fail_fixture_writes {
                return Err(QueryError::Query("permission denied".to_string()));
            }
            self.ddl(sql)
        } else {
            self.benchmark_query(sql).await
        }
    }

    async fn query_scalar(&mut self, statement: &Statement) -> Result<i64, QueryError> {
        let lower = statement.sql.to_lowercase();
        let state = self.state.lock();

        if lower.contains("information_schema.tables") {
            let Some(Value::Text(name)) = statement.params.first() else {
                return Err(QueryError::Query("missing table name parameter".to_string()));
            };
            Ok(state.tables.contains_key(name) as i64)
        } else if let Some(rest) = lower.strip_prefix("select count(*) from") {
            let name = table_name(rest);
            state
                .tables
                .get(&name)
                .map(|rows| *rows as i64)
                .ok_or_else(|| QueryError::Query(format!("relation \"{name}\" does not exist")))
        } else {
            Err(QueryError::Query(format!(
                "unsupported scalar query: {}",
                statement.sql
            )))
        }
    }

    async fn execute_group(&mut self, statements: &[Statement]) -> Result<(), QueryError> {
        if self.behavior.fail_fixture_writes {
            return Err(QueryError::Query("permission denied".to_string()));
        }

        let mut state = self.state.lock();
        state.round_trips += 1;

        for statement in statements {
            let lower = statement.sql.to_lowercase();
            let Some(rest) = lower.strip_prefix("insert into") else {
                return Err(QueryError::Query(format!(
                    "unsupported statement: {}",
                    statement.sql
                )));
            };

            let name = table_name(rest);
            let rows = statement.params.len() as u64 / 2;
            let Some(existing) = state.tables.get_mut(&name) else {
                return Err(QueryError::Query(format!("relation \"{name}\" does not exist")));
            };
            *existing += rows;
            state.writes += 1;
        }

        Ok(())
    }
}

fn table_name(rest: &str) -> String {
    rest.split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}
