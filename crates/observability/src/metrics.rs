//! Load generator 指标收集模块
//!
//! 批次发送、读负载查询与流转发的运行指标。

use metrics::{counter, gauge, histogram};

/// 记录一次成功的批次发送
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_batch_sent;
///
/// let report = sink.send(&batch).await?;
/// record_batch_sent(sink.name(), batch.len(), report.inserted, elapsed_ms);
/// ```
pub fn record_batch_sent(sink_name: &str, records: usize, acknowledged: usize, latency_ms: f64) {
    counter!(
        "agri_loadgen_batches_sent_total",
        "sink" => sink_name.to_string(),
        "status" => "success"
    )
    .increment(1);
    counter!("agri_loadgen_records_sent_total", "sink" => sink_name.to_string())
        .increment(records as u64);
    counter!("agri_loadgen_records_acknowledged_total", "sink" => sink_name.to_string())
        .increment(acknowledged as u64);
    histogram!("agri_loadgen_send_latency_ms", "sink" => sink_name.to_string()).record(latency_ms);
    histogram!("agri_loadgen_batch_size").record(records as f64);
}

/// 记录一次失败的批次发送
pub fn record_batch_failed(sink_name: &str, records: usize) {
    counter!(
        "agri_loadgen_batches_sent_total",
        "sink" => sink_name.to_string(),
        "status" => "failure"
    )
    .increment(1);
    counter!("agri_loadgen_records_lost_total", "sink" => sink_name.to_string())
        .increment(records as u64);
}

/// 记录一次窗口聚合查询
pub fn record_query(collection: &str, latency_ms: f64, avg_speed: Option<f64>) {
    let status = if avg_speed.is_some() { "success" } else { "failure" };
    counter!(
        "agri_loadgen_queries_total",
        "collection" => collection.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!("agri_loadgen_query_latency_ms", "collection" => collection.to_string())
        .record(latency_ms);

    if let Some(avg) = avg_speed {
        gauge!("agri_loadgen_last_avg_speed", "collection" => collection.to_string()).set(avg);
    }
}

/// 记录一次流转发写入
pub fn record_relay_flush(collection: &str, documents: usize, inserted: usize) {
    counter!("agri_loadgen_relay_flushes_total", "collection" => collection.to_string())
        .increment(1);
    counter!("agri_loadgen_relay_documents_total", "collection" => collection.to_string())
        .increment(documents as u64);
    counter!("agri_loadgen_relay_inserted_total", "collection" => collection.to_string())
        .increment(inserted as u64);
}

/// 记录被跳过的流数据
pub fn record_relay_payload_skipped() {
    counter!("agri_loadgen_relay_payloads_skipped_total").increment(1);
}

/// 发送指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SendMetricsAggregator {
    /// 已尝试的批次 (含失败)
    pub total_batches: u64,

    /// 失败批次
    pub failed_batches: u64,

    /// 已发送记录数
    pub records_sent: u64,

    /// 目标确认的记录数
    pub records_acknowledged: u64,

    /// 发送延迟统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 批次大小统计
    pub batch_size_stats: RunningStats,
}

impl SendMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录成功发送
    pub fn record_success(&mut self, records: usize, acknowledged: usize, latency_ms: f64) {
        self.total_batches += 1;
        self.records_sent += records as u64;
        self.records_acknowledged += acknowledged as u64;
        self.latency_stats.push(latency_ms);
        self.batch_size_stats.push(records as f64);
    }

    /// 记录失败发送
    pub fn record_failure(&mut self, records: usize) {
        self.total_batches += 1;
        self.failed_batches += 1;
        self.batch_size_stats.push(records as f64);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> SendSummary {
        SendSummary {
            total_batches: self.total_batches,
            failed_batches: self.failed_batches,
            records_sent: self.records_sent,
            records_acknowledged: self.records_acknowledged,
            failure_rate: if self.total_batches > 0 {
                self.failed_batches as f64 / self.total_batches as f64 * 100.0
            } else {
                0.0
            },
            send_latency_ms: StatsSummary::from(&self.latency_stats),
            batch_size: StatsSummary::from(&self.batch_size_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 发送摘要
#[derive(Debug, Clone, Default)]
pub struct SendSummary {
    pub total_batches: u64,
    pub failed_batches: u64,
    pub records_sent: u64,
    pub records_acknowledged: u64,
    pub failure_rate: f64,
    pub send_latency_ms: StatsSummary,
    pub batch_size: StatsSummary,
}

impl std::fmt::Display for SendSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Send Summary ===")?;
        writeln!(f, "Batches: {}", self.total_batches)?;
        writeln!(
            f,
            "Failed batches: {} ({:.2}%)",
            self.failed_batches, self.failure_rate
        )?;
        writeln!(f, "Records sent: {}", self.records_sent)?;
        writeln!(f, "Records acknowledged: {}", self.records_acknowledged)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Send latency (ms): {}", self.send_latency_ms)?;
        Ok(())
    }
}

/// 查询指标聚合器
#[derive(Debug, Clone, Default)]
pub struct QueryMetricsAggregator {
    pub executions: u64,
    pub failures: u64,
    pub latency_stats: RunningStats,
    pub avg_speed_stats: RunningStats,
}

impl QueryMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, latency_ms: f64, avg_speed: f64) {
        self.executions += 1;
        self.latency_stats.push(latency_ms);
        self.avg_speed_stats.push(avg_speed);
    }

    pub fn record_failure(&mut self, latency_ms: f64) {
        self.executions += 1;
        self.failures += 1;
        self.latency_stats.push(latency_ms);
    }

    pub fn summary(&self) -> QuerySummaryStats {
        QuerySummaryStats {
            executions: self.executions,
            failures: self.failures,
            query_latency_ms: StatsSummary::from(&self.latency_stats),
            avg_speed: StatsSummary::from(&self.avg_speed_stats),
        }
    }
}

/// 查询摘要
#[derive(Debug, Clone, Default)]
pub struct QuerySummaryStats {
    pub executions: u64,
    pub failures: u64,
    pub query_latency_ms: StatsSummary,
    pub avg_speed: StatsSummary,
}

impl std::fmt::Display for QuerySummaryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Query Summary ===")?;
        writeln!(f, "Executions: {} (failed: {})", self.executions, self.failures)?;
        writeln!(f, "Query latency (ms): {}", self.query_latency_ms)?;
        writeln!(f, "Average speed: {}", self.avg_speed)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
