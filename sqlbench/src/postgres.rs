//! PostgreSQL adapter (requires the `postgres` feature)
//!
//! Each query runs under a client-side timeout. When it fires, a cancel request is sent to the
//! server so the connection is usable for the next query.
use futures_util::future::try_join_all;
use sqlbench_core::{Connection, Connector, QueryError, Statement, Value, DEFAULT_QUERY_TIMEOUT};
use std::future::Future;
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{CancelToken, Client, NoTls};
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone)]
pub struct PostgresConnector {
    config: String,
    timeout: Duration,
}

impl PostgresConnector {
    /// `config` is either a `key=value` connection string or a `postgres://` URL.
    pub fn new(config: &str) -> Self {
        Self {
            config: config.to_string(),
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Connector for PostgresConnector {
    type Conn = PostgresConnection;

    async fn connect(&self) -> Result<PostgresConnection, QueryError> {
        let connect = tokio_postgres::connect(&self.config, NoTls);
        let (client, connection) = tokio::time::timeout(self.timeout, connect)
            .await
            .map_err(|_| QueryError::Connection("timed out while connecting".to_string()))?
            .map_err(|err| QueryError::Connection(err.to_string()))?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                warn!("Connection closed with error: {err}");
            }
        });

        Ok(PostgresConnection {
            cancel: client.cancel_token(),
            client,
            timeout: self.timeout,
        })
    }
}

pub struct PostgresConnection {
    client: Client,
    cancel: CancelToken,
    timeout: Duration,
}

impl PostgresConnection {
    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, tokio_postgres::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map_err(classify),
            Err(_) => {
                if let Err(err) = self.cancel.cancel_query(NoTls).await {
                    debug!("Unable to cancel timed out query: {err}");
                }
                Err(QueryError::Timeout)
            }
        }
    }
}

impl Connection for PostgresConnection {
    async fn execute(&mut self, sql: &str) -> Result<(), QueryError> {
        // Simple query protocol: no parameters, and file templates may hold several statements.
        self.with_timeout(self.client.batch_execute(sql)).await
    }

    async fn query_scalar(&mut self, statement: &Statement) -> Result<i64, QueryError> {
        let params = params(statement);
        let row = self
            .with_timeout(self.client.query_one(statement.sql.as_str(), &params))
            .await?;
        row.try_get::<_, i64>(0).map_err(classify)
    }

    async fn execute_group(&mut self, statements: &[Statement]) -> Result<(), QueryError> {
        let params: Vec<_> = statements.iter().map(params).collect();
        // NOTE: Futures issued together on one client are pipelined into a single round-trip.
        let pending = statements
            .iter()
            .zip(&params)
            .map(|(statement, params)| self.client.execute(statement.sql.as_str(), params));

        self.with_timeout(try_join_all(pending)).await?;
        Ok(())
    }
}

fn params(statement: &Statement) -> Vec<&(dyn ToSql + Sync)> {
    statement
        .params
        .iter()
        .map(|value| match value {
            Value::Uuid(uuid) => uuid as &(dyn ToSql + Sync),
            Value::Text(text) => text as &(dyn ToSql + Sync),
            Value::BigInt(int) => int as &(dyn ToSql + Sync),
        })
        .collect()
}

fn classify(err: tokio_postgres::Error) -> QueryError {
    if err.code() == Some(&SqlState::QUERY_CANCELED) {
        QueryError::Timeout
    } else if err.is_closed() {
        QueryError::Connection(err.to_string())
    } else {
        QueryError::Query(err.to_string())
    }
}
