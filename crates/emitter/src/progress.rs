//! 进度报告
//!
//! 累计记录数每超过上次报告值加阈值时输出一行。仅用于观测，不参与控制流。

use std::fmt;

use chrono::{SecondsFormat, Utc};

/// One progress line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLine {
    pub ts: String,
    /// Records since the previous report
    pub delta: u64,
    pub total: u64,
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} records inserted this round, {} rows inserted in total",
            self.ts, self.delta, self.total
        )
    }
}

/// Threshold-crossing progress reporter
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    threshold: u64,
    last_reported: u64,
}

impl ProgressReporter {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            last_reported: 0,
        }
    }

    pub fn last_reported(&self) -> u64 {
        self.last_reported
    }

    /// Feed the cumulative total; returns a line when `total > last + threshold`
    pub fn observe(&mut self, total: u64) -> Option<ProgressLine> {
        if total <= self.last_reported.saturating_add(self.threshold) {
            return None;
        }
        let line = ProgressLine {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            delta: total - self.last_reported,
            total,
        };
        self.last_reported = total;
        Some(line)
    }
}
