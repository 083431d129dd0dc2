use sqlbench_core::{ConfigError, QueryError};
use std::path::PathBuf;
use thiserror::Error;
use tokio::task::JoinError;

/// Fatal errors. Any of these voids the current run; no partial report is produced.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Fixture bootstrapping failed: {0}")]
    Bootstrap(#[source] QueryError),

    #[error("User {user_id} failed: {source}")]
    User {
        user_id: usize,
        #[source]
        source: QueryError,
    },

    #[error("Unable to write sample record {path}: {source}")]
    SampleRecord {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Benchmark task failed: {0}")]
    TaskFailed(#[from] JoinError),
}
