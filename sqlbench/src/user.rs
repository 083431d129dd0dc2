use crate::counters::SharedCounters;
use crate::error::BenchmarkError;
use crate::latency::{LatencyBuffer, LatencyDigest};
use crate::template::QueryTemplate;
use sqlbench_core::{Connection, Connector, QueryError, UserResult};
use std::sync::Arc;
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Run one virtual user: open a connection and execute `query_count` queries on it in sequence.
///
/// Timeouts are counted and absorbed. Any other failure ends the user and is returned with its
/// id attached.
#[instrument(name = "user", skip_all, fields(user_id = user_id))]
pub(crate) async fn simulate_user<C: Connector>(
    user_id: usize,
    connector: Arc<C>,
    query_count: usize,
    template: QueryTemplate,
    counters: SharedCounters,
    latency: LatencyDigest,
) -> Result<UserResult, BenchmarkError> {
    debug!("User {user_id} connecting to database server");
    let mut conn = connector
        .connect()
        .await
        .map_err(|source| BenchmarkError::User { user_id, source })?;

    let mut result = UserResult::new(user_id);
    let mut latencies = LatencyBuffer::new(latency);
    for _ in 0..query_count {
        let query = template.render();

        let start = Instant::now();
        let outcome = conn.execute(&query).await;
        let elapsed = start.elapsed();

        #[cfg(feature = "metrics")]
        metrics::histogram!(sqlbench_core::METRIC_QUERY_LATENCY).record(elapsed.as_secs_f64());

        match outcome {
            Ok(()) => {
                result.record_completed(elapsed);
                latencies.push(elapsed);
                counters.record_completed();

                #[cfg(feature = "metrics")]
                metrics::counter!(sqlbench_core::METRIC_QUERY_COMPLETED).increment(1);
            }
            Err(QueryError::Timeout) => {
                trace!("Query timed out after {elapsed:?}");
                result.record_timeout(elapsed);
                counters.record_timeout();

                #[cfg(feature = "metrics")]
                metrics::counter!(sqlbench_core::METRIC_QUERY_TIMEOUT).increment(1);
            }
            Err(source) => {
                error!("User {user_id} aborted: {source}");
                return Err(BenchmarkError::User { user_id, source });
            }
        }
    }

    latencies.flush();
    debug!("User {user_id} has finished simulation");
    Ok(result)
}
