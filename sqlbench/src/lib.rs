#![cfg_attr(docsrs, feature(doc_cfg))]
//! Concurrent query-throughput benchmark for relational databases.
//!
//! A [`Benchmark`] simulates a number of virtual users, each holding its own connection and
//! issuing a fixed number of sequential queries, while a watchdog samples throughput once per
//! second. Each run yields a [`BenchmarkReport`](sqlbench_core::BenchmarkReport).

pub mod benchmark;
pub mod counters;
pub mod error;
pub mod fixture;
pub mod latency;
pub mod report;
pub mod sampler;
pub mod template;

pub(crate) mod user;

#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres;

pub use benchmark::Benchmark;
pub use error::BenchmarkError;
pub use sqlbench_core as core;

pub mod prelude {
    pub use crate::benchmark::Benchmark;
    pub use crate::error::BenchmarkError;
    pub use crate::fixture::{FixtureOutcome, FixtureSpec};
    pub use crate::template::QueryTemplate;

    #[cfg(feature = "postgres")]
    pub use crate::postgres::PostgresConnector;

    pub use sqlbench_core::{BenchmarkConfig, BenchmarkReport, Connection, Connector, QueryError};
}
