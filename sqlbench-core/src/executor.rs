//! Database boundary consumed by the benchmark engine.
use crate::QueryError;
use std::future::Future;
use uuid::Uuid;

/// Opens connections to the benchmark target.
///
/// One connection is opened per virtual user and held for the user's whole run.
pub trait Connector: Send + Sync + 'static {
    type Conn: Connection + 'static;

    fn connect(&self) -> impl Future<Output = Result<Self::Conn, QueryError>> + Send;
}

/// A single open connection. Dropping it closes the connection.
pub trait Connection: Send {
    /// Execute a parameterless text query, discarding any result rows.
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<(), QueryError>> + Send;

    /// Execute a statement returning a single integer value in the first column of the first row.
    fn query_scalar(
        &mut self,
        statement: &Statement,
    ) -> impl Future<Output = Result<i64, QueryError>> + Send;

    /// Execute a group of statements in as few round-trips as the driver allows.
    fn execute_group(
        &mut self,
        statements: &[Statement],
    ) -> impl Future<Output = Result<(), QueryError>> + Send;
}

/// Bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uuid(Uuid),
    Text(String),
    BigInt(i64),
}

/// SQL text plus its positional parameters (`$1`, `$2`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: vec![],
        }
    }

    pub fn bind(mut self, value: Value) -> Self {
        self.params.push(value);
        self
    }
}
