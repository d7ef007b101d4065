//! Batching emitter
//!
//! `Idle → Generating → Sending → Sleeping → Idle | Terminal`
//!
//! The stop condition is checked strictly before each new batch. A failed
//! send is logged, counted as an attempted batch and never retried.

use std::time::Duration;

use contracts::{Batch, DelayRange, EmitterConfig, RecordSink, StopCondition};
use generator::TelemetryGenerator;
use observability::{record_batch_failed, record_batch_sent, SendMetricsAggregator, SendSummary};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::progress::ProgressReporter;

/// Why the emitter stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    BatchLimit,
    RecordLimit,
    Deadline,
    Shutdown,
}

/// Outcome of one emitter run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Records handed to the sink, failed batches included
    pub records_sent: u64,
    /// Attempted batches, failed ones included
    pub batches_sent: u64,
    pub failed_batches: u64,
    /// Records the sink reported as stored/published
    pub records_acknowledged: u64,
    pub duration: Duration,
    pub stop_reason: StopReason,
    pub send_stats: SendSummary,
}

impl RunSummary {
    pub fn records_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.records_sent as f64 / secs
        } else {
            0.0
        }
    }
}

/// Paced batch producer driving one sink
pub struct Emitter<S> {
    generator: TelemetryGenerator,
    sink: S,
    config: EmitterConfig,
    run_id: String,
    rng: StdRng,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<S: RecordSink> Emitter<S> {
    pub fn new(
        generator: TelemetryGenerator,
        sink: S,
        config: EmitterConfig,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            sink,
            config,
            run_id: run_id.into(),
            rng: StdRng::from_os_rng(),
            shutdown: None,
        }
    }

    /// Seed the batch-size and pacing draws
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Stop before the next batch once `true` is published
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Run until the stop condition holds, then close the sink
    ///
    /// Never fails: per-batch errors are logged and counted.
    #[instrument(
        name = "emitter_run",
        skip(self),
        fields(sink = %self.sink.name(), run_id = %self.run_id)
    )]
    pub async fn run(mut self) -> RunSummary {
        let started = Instant::now();
        let mut stats = SendMetricsAggregator::new();
        let mut progress = ProgressReporter::new(self.config.progress_every);
        let mut records_sent: u64 = 0;

        info!(
            stop = ?self.config.stop,
            batch_min = self.config.batch_size.min,
            batch_max = self.config.batch_size.max,
            pacing = ?self.config.pacing,
            "Emitter started"
        );

        let mut interrupted = false;
        if let Some(jitter) = self.config.start_jitter {
            let wait = sample_delay(&mut self.rng, &jitter);
            debug!(wait_ms = wait.as_millis() as u64, "Waiting start jitter");
            interrupted = !sleep_unless_shutdown(wait, &mut self.shutdown).await;
        }

        let stop_reason = loop {
            if interrupted {
                break StopReason::Shutdown;
            }
            if let Some(reason) = self.check_stop(stats.total_batches, records_sent, started) {
                break reason;
            }

            // Generating
            let size = self.next_batch_size(records_sent);
            let sequence = stats.total_batches + 1;
            let batch = Batch::new(sequence, self.generator.generate(size, &self.run_id));

            // Sending
            let send_started = Instant::now();
            let outcome = tokio::select! {
                result = self.sink.send(&batch) => result,
                _ = wait_for_shutdown(&mut self.shutdown) => {
                    warn!(batch = sequence, records = batch.len(), "Shutdown during send, batch abandoned");
                    break StopReason::Shutdown;
                }
            };
            let latency_ms = send_started.elapsed().as_secs_f64() * 1000.0;
            records_sent += batch.len() as u64;

            match outcome {
                Ok(report) => {
                    stats.record_success(batch.len(), report.inserted, latency_ms);
                    record_batch_sent(self.sink.name(), batch.len(), report.inserted, latency_ms);
                    debug!(
                        batch = sequence,
                        records = batch.len(),
                        acknowledged = report.acknowledged,
                        inserted = report.inserted,
                        latency_ms,
                        "Batch sent"
                    );
                }
                Err(e) => {
                    stats.record_failure(batch.len());
                    record_batch_failed(self.sink.name(), batch.len());
                    warn!(
                        batch = sequence,
                        records = batch.len(),
                        error = %e,
                        "Batch send failed"
                    );
                }
            }

            if let Some(line) = progress.observe(records_sent) {
                info!(delta = line.delta, total = line.total, "{line}");
            }

            // Sleeping
            let delay = sample_delay(&mut self.rng, &self.config.pacing);
            interrupted = !sleep_unless_shutdown(delay, &mut self.shutdown).await;
        };

        if let Err(e) = self.sink.close().await {
            warn!(error = %e, "Sink close failed");
        }

        let summary = RunSummary {
            records_sent,
            batches_sent: stats.total_batches,
            failed_batches: stats.failed_batches,
            records_acknowledged: stats.records_acknowledged,
            duration: started.elapsed(),
            stop_reason,
            send_stats: stats.summary(),
        };

        info!(
            records_sent = summary.records_sent,
            batches_sent = summary.batches_sent,
            failed_batches = summary.failed_batches,
            stop_reason = ?summary.stop_reason,
            duration_secs = summary.duration.as_secs_f64(),
            "Emitter finished"
        );

        summary
    }

    fn check_stop(&self, batches: u64, records: u64, started: Instant) -> Option<StopReason> {
        if is_shutdown(&self.shutdown) {
            return Some(StopReason::Shutdown);
        }
        match self.config.stop {
            StopCondition::Batches { count } if batches >= count => Some(StopReason::BatchLimit),
            StopCondition::Records { count } if records >= count => Some(StopReason::RecordLimit),
            StopCondition::Duration { seconds } if started.elapsed() >= Duration::from_secs(seconds) => {
                Some(StopReason::Deadline)
            }
            _ => None,
        }
    }

    /// Uniform draw from the batch size range; clamped to what is left under a record limit
    fn next_batch_size(&mut self, records_sent: u64) -> usize {
        let range = self.config.batch_size;
        let size = if range.min >= range.max {
            range.min
        } else {
            self.rng.random_range(range.min..=range.max)
        };

        match self.config.stop {
            StopCondition::Records { count } => {
                let remaining = count.saturating_sub(records_sent);
                size.min(usize::try_from(remaining).unwrap_or(usize::MAX))
            }
            _ => size,
        }
    }
}

/// Fixed delay, or a uniform draw from `[min_ms, max_ms]`
pub fn sample_delay<R: Rng + ?Sized>(rng: &mut R, range: &DelayRange) -> Duration {
    let ms = if range.min_ms >= range.max_ms {
        range.min_ms
    } else {
        rng.random_range(range.min_ms..=range.max_ms)
    };
    Duration::from_millis(ms)
}

fn is_shutdown(shutdown: &Option<watch::Receiver<bool>>) -> bool {
    shutdown.as_ref().is_some_and(|rx| *rx.borrow())
}

/// Resolves once shutdown is requested; never resolves without a receiver
async fn wait_for_shutdown(shutdown: &mut Option<watch::Receiver<bool>>) {
    match shutdown {
        Some(rx) => {
            if rx.wait_for(|stop| *stop).await.is_err() {
                // sender gone, nobody can request shutdown any more
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

/// Returns `false` if shutdown was requested before the delay elapsed
async fn sleep_unless_shutdown(
    delay: Duration,
    shutdown: &mut Option<watch::Receiver<bool>>,
) -> bool {
    if delay.is_zero() {
        return !is_shutdown(shutdown);
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = wait_for_shutdown(shutdown) => false,
    }
}
