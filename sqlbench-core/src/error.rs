use thiserror::Error;

/// Outcome classes reported by a database adapter.
///
/// `Timeout` is an expected result under load; the other variants abort the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl QueryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("At least one user is required")]
    NoUsers,

    #[error("At least one query per user is required")]
    NoQueries,

    #[error("Sample interval must be non-zero")]
    ZeroSampleInterval,
}
