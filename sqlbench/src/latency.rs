//! Latency distribution shared by every virtual user of a run.
use parking_lot::Mutex;
use pdatastructs::tdigest::{TDigest, K1};
use sqlbench_core::LATENCY_FLUSH_SIZE;
use std::mem;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

struct Digest {
    tdigest: TDigest<K1>,
    count: u64,
}

/// Constant-size latency summary. Users feed it in batches so the lock is taken once per
/// [`LATENCY_FLUSH_SIZE`] queries rather than once per query.
#[derive(Clone)]
pub struct LatencyDigest {
    inner: Arc<Mutex<Digest>>,
}

impl Default for LatencyDigest {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Digest {
                tdigest: default_tdigest(),
                count: 0,
            })),
        }
    }
}

impl LatencyDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn populate(&self, batch: &[Duration]) {
        let mut digest = self.inner.lock();
        for latency in batch {
            digest.tdigest.insert(latency.as_secs_f64());
        }
        digest.count += batch.len() as u64;
    }

    pub fn count(&self) -> u64 {
        self.inner.lock().count
    }

    /// Latency at quantile `q`, or zero when nothing has been recorded.
    pub fn quantile(&self, q: f64) -> Duration {
        let digest = self.inner.lock();
        if digest.count == 0 {
            return Duration::ZERO;
        }

        let secs = digest.tdigest.quantile(q);
        // TDigest occasionally yields NaN
        let secs = if secs.is_finite() && secs >= 0. {
            secs
        } else {
            error!("Invalid latency quantile {secs} for q={q}");
            0.
        };
        Duration::from_secs_f64(secs)
    }
}

/// Per-user staging area in front of a [`LatencyDigest`]. Holds at most
/// [`LATENCY_FLUSH_SIZE`] samples regardless of how many queries the user runs.
pub(crate) struct LatencyBuffer {
    digest: LatencyDigest,
    pending: Vec<Duration>,
}

impl LatencyBuffer {
    pub fn new(digest: LatencyDigest) -> Self {
        Self {
            digest,
            pending: Vec::with_capacity(LATENCY_FLUSH_SIZE),
        }
    }

    pub fn push(&mut self, latency: Duration) {
        self.pending.push(latency);
        if self.pending.len() >= LATENCY_FLUSH_SIZE {
            self.flush();
        }
    }

    pub fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.digest.populate(&mem::take(&mut self.pending));
            self.pending.reserve(LATENCY_FLUSH_SIZE);
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.pending.len()
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}
