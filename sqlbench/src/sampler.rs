//! Watchdog sampling loop
//!
//! Drains the [`SharedCounters`] once per interval and emits a [`SampleRecord`] to the live
//! display (tracing) and/or the CSV sample record. The loop runs as its own task so it keeps
//! ticking while every virtual user is blocked on I/O.
use crate::counters::SharedCounters;
use crate::error::BenchmarkError;
use sqlbench_core::{QueryCounts, SampleRecord};
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn, Instrument};

mod record;

pub use record::SampleRecorder;

#[derive(Debug, Clone)]
pub struct SamplerSettings {
    pub interval: Duration,
    /// Log each sample as it is taken.
    pub live: bool,
    /// Directory for the CSV sample record; `None` disables the record.
    pub record_dir: Option<PathBuf>,
}

/// What the watchdog drained over its lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSummary {
    pub samples: u64,
    /// Counts emitted as samples.
    pub sampled: QueryCounts,
    /// Counts accumulated after the last tick, drained on stop but not emitted as a sample since
    /// they do not cover a full interval.
    pub remainder: QueryCounts,
}

impl SamplerSummary {
    pub fn total(&self) -> QueryCounts {
        let mut total = self.sampled;
        total += self.remainder;
        total
    }
}

/// An idle watchdog. [`Sampler::start`] turns it into a running [`SamplerHandle`].
pub struct Sampler {
    counters: SharedCounters,
    settings: SamplerSettings,
    recorder: Option<SampleRecorder>,
}

impl Sampler {
    pub fn new(counters: SharedCounters, settings: SamplerSettings) -> Self {
        Self {
            counters,
            settings,
            recorder: None,
        }
    }

    /// Record samples into an already opened recorder instead of a new file under
    /// `settings.record_dir`.
    pub fn recorder(mut self, recorder: SampleRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Spawn the sampling loop. The CSV record, if enabled, is created before this returns so
    /// that I/O problems surface before any load is generated.
    pub fn start(self) -> Result<SamplerHandle, BenchmarkError> {
        let recorder = match (self.recorder, &self.settings.record_dir) {
            (Some(recorder), _) => Some(recorder),
            (None, Some(dir)) => {
                let recorder = SampleRecorder::create(dir, OffsetDateTime::now_utc()).map_err(
                    |source| BenchmarkError::SampleRecord {
                        path: dir.clone(),
                        source,
                    },
                )?;
                info!("Writing progress report to: {}", recorder.path().display());
                Some(recorder)
            }
            (None, None) => None,
        };
        let record_path = recorder.as_ref().map(|r| r.path().to_path_buf());

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(
            sample_loop(self.counters, self.settings, recorder, stop_rx)
                .instrument(tracing::debug_span!("watchdog")),
        );

        Ok(SamplerHandle {
            stop_tx,
            task,
            record_path,
        })
    }
}

/// A running watchdog.
pub struct SamplerHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<Result<SamplerSummary, BenchmarkError>>,
    record_path: Option<PathBuf>,
}

impl SamplerHandle {
    pub fn record_path(&self) -> Option<&Path> {
        self.record_path.as_deref()
    }

    /// Resolves only if the loop exits before being asked to stop, which happens when the sample
    /// record can no longer be written. Cancel safe. Once this has resolved the handle must not
    /// be stopped.
    pub async fn failure(&mut self) -> BenchmarkError {
        match (&mut self.task).await {
            Ok(Err(err)) => err,
            Err(err) => err.into(),
            // The stop signal is still held here, so a clean exit is impossible.
            Ok(Ok(_)) => std::future::pending().await,
        }
    }

    /// Signal the loop to stop and wait until it has exited. Once this returns nothing touches
    /// the counters anymore.
    pub async fn stop(self) -> Result<SamplerSummary, BenchmarkError> {
        // NOTE: The receiver only goes away if the loop already exited on an error, which the
        // join below reports.
        let _ = self.stop_tx.send(());
        self.task.await?
    }
}

async fn sample_loop(
    counters: SharedCounters,
    settings: SamplerSettings,
    mut recorder: Option<SampleRecorder>,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<SamplerSummary, BenchmarkError> {
    let mut ticks = interval(settings.interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // NOTE: First tick completes instantly
    let mut last_tick = ticks.tick().await;
    let mut summary = SamplerSummary::default();
    debug!(
        "Sampling every {}",
        humantime::format_duration(settings.interval)
    );

    loop {
        tokio::select! {
            biased;

            _ = &mut stop_rx => break,

            tick = ticks.tick() => {
                let elapsed = tick.duration_since(last_tick);
                last_tick = tick;
                let counts = counters.drain();
                summary.samples += 1;
                summary.sampled += counts;
                trace!("Sample {} covered {elapsed:?}", summary.samples);

                let sample = SampleRecord::new(summary.samples, counts, OffsetDateTime::now_utc());
                if settings.live {
                    display(&sample);
                }
                if let Some(recorder) = recorder.as_mut() {
                    if let Err(source) = recorder.append(&sample) {
                        error!("Unable to append to {}: {source}", recorder.path().display());
                        return Err(BenchmarkError::SampleRecord {
                            path: recorder.path().to_path_buf(),
                            source,
                        });
                    }
                }
            }
        }
    }

    summary.remainder = counters.drain();
    debug!(
        "Watchdog stopped after {} samples ({} queries after the last tick)",
        summary.samples,
        summary.remainder.total()
    );
    Ok(summary)
}

fn display(sample: &SampleRecord) {
    if sample.timeouts_per_second > 0 {
        warn!("{sample}");
    } else {
        info!("{sample}");
    }
}
