//! Read-load runner
//!
//! Executes the windowed average `executions` times with a fixed pause in
//! between. A failed execution is logged and the loop continues.

use std::time::Duration;

use chrono::Utc;
use contracts::QueryConfig;
use observability::{record_query, QueryMetricsAggregator, QuerySummaryStats};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::source::SpeedSource;
use crate::window::QueryWindow;

/// Outcome of one runner invocation
#[derive(Debug, Clone)]
pub struct QuerySummary {
    pub executions: u32,
    pub failures: u32,
    pub last_average: Option<f64>,
    pub duration: Duration,
    pub interrupted: bool,
    pub stats: QuerySummaryStats,
}

pub struct QueryRunner<S> {
    source: S,
    config: QueryConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<S: SpeedSource> QueryRunner<S> {
    pub fn new(source: S, config: QueryConfig) -> Self {
        Self {
            source,
            config,
            shutdown: None,
        }
    }

    /// Stop between executions once the flag turns `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    #[instrument(
        name = "query_runner",
        skip(self),
        fields(
            collection = %self.source.collection(),
            executions = self.config.executions,
            window_minutes = self.config.window_minutes
        )
    )]
    pub async fn run(mut self) -> QuerySummary {
        let started = Instant::now();
        let interval = Duration::from_millis(self.config.interval_ms);
        let mut aggregator = QueryMetricsAggregator::new();
        let mut last_average = None;
        let mut executions = 0u32;
        let mut failures = 0u32;
        let mut interrupted = false;

        for execution in 1..=self.config.executions {
            if self.stop_requested() {
                interrupted = true;
                break;
            }

            let window =
                QueryWindow::trailing(Utc::now(), self.config.window_minutes, self.config.vehicle_id);
            let query_started = Instant::now();
            let result = self.source.average_speed(&window).await;
            let query_ms = query_started.elapsed().as_secs_f64() * 1000.0;
            let total_ms = started.elapsed().as_secs_f64() * 1000.0;
            executions += 1;

            match result {
                Ok(average) => {
                    info!(
                        execution,
                        average_speed = average,
                        query_ms,
                        total_ms,
                        "Average driving speed"
                    );
                    record_query(self.source.collection(), query_ms, Some(average));
                    aggregator.record_success(query_ms, average);
                    last_average = Some(average);
                }
                Err(e) => {
                    warn!(execution, query_ms, error = %e, "Query failed");
                    record_query(self.source.collection(), query_ms, None);
                    aggregator.record_failure(query_ms);
                    failures += 1;
                }
            }

            if execution < self.config.executions && !self.pause(interval).await {
                interrupted = true;
                break;
            }
        }

        let summary = QuerySummary {
            executions,
            failures,
            last_average,
            duration: started.elapsed(),
            interrupted,
            stats: aggregator.summary(),
        };
        info!(
            executions = summary.executions,
            failures = summary.failures,
            duration_ms = summary.duration.as_millis() as u64,
            interrupted,
            "Query runner finished"
        );
        summary
    }

    fn stop_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Returns `false` if shutdown arrived during the pause
    async fn pause(&mut self, interval: Duration) -> bool {
        match self.shutdown.as_mut() {
            Some(rx) => tokio::select! {
                _ = tokio::time::sleep(interval) => true,
                // a dropped sender disables this branch
                Ok(_) = rx.wait_for(|stop| *stop) => false,
            },
            None => {
                tokio::time::sleep(interval).await;
                true
            }
        }
    }
}
