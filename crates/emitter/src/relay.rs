//! Stream relay
//!
//! 将流事件中的 base64 负载解码为记录数组，按固定大小重新分批写入 sink。
//! 末尾不足一批的记录同样会写入。

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use contracts::{Batch, ContractError, RecordSink, StreamEvent, TelemetryRecord};
use observability::{record_relay_flush, record_relay_payload_skipped};
use tracing::{info, instrument, warn};

/// Counters for one relayed event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaySummary {
    pub payloads: usize,
    pub payloads_skipped: usize,
    pub documents: usize,
    pub flushes: usize,
    pub failed_flushes: usize,
    pub inserted: usize,
}

/// Re-batches stream payloads into a sink
pub struct StreamRelay<S> {
    sink: S,
    batch_size: usize,
}

impl<S: RecordSink> StreamRelay<S> {
    pub fn new(sink: S, batch_size: usize) -> Self {
        Self {
            sink,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Relay every record of `event`
    ///
    /// Malformed payloads are logged and skipped; failed flushes are logged
    /// and not retried.
    #[instrument(
        name = "stream_relay",
        skip_all,
        fields(sink = %self.sink.name(), records = event.records.len())
    )]
    pub async fn relay(&mut self, event: &StreamEvent) -> RelaySummary {
        let mut summary = RelaySummary::default();
        let mut pending = Vec::with_capacity(self.batch_size);

        for (index, record) in event.records.iter().enumerate() {
            summary.payloads += 1;
            let documents = match decode_payload(index, &record.kinesis.data) {
                Ok(documents) => documents,
                Err(e) => {
                    warn!(index, error = %e, "Skipping malformed stream payload");
                    record_relay_payload_skipped();
                    summary.payloads_skipped += 1;
                    continue;
                }
            };

            for document in documents {
                pending.push(document);
                summary.documents += 1;
                if pending.len() == self.batch_size {
                    self.flush(&mut pending, &mut summary).await;
                }
            }
        }

        if !pending.is_empty() {
            self.flush(&mut pending, &mut summary).await;
        }

        info!(
            payloads = summary.payloads,
            skipped = summary.payloads_skipped,
            documents = summary.documents,
            flushes = summary.flushes,
            inserted = summary.inserted,
            "Stream event relayed"
        );
        summary
    }

    /// Close the underlying sink
    pub async fn close(&mut self) -> Result<(), ContractError> {
        self.sink.close().await
    }

    async fn flush(&mut self, pending: &mut Vec<TelemetryRecord>, summary: &mut RelaySummary) {
        let records = std::mem::replace(pending, Vec::with_capacity(self.batch_size));
        let batch = Batch::new(summary.flushes as u64 + 1, records);
        summary.flushes += 1;

        match self.sink.send(&batch).await {
            Ok(report) => {
                summary.inserted += report.inserted;
                record_relay_flush(self.sink.name(), batch.len(), report.inserted);
                info!(
                    batch = batch.sequence,
                    status = if report.acknowledged {
                        "Acknowledged"
                    } else {
                        "Not Acknowledged"
                    },
                    inserted = report.inserted,
                    "Relay batch written"
                );
            }
            Err(e) => {
                summary.failed_flushes += 1;
                warn!(batch = batch.sequence, records = batch.len(), error = %e, "Relay batch failed");
            }
        }
    }
}

/// Decode one base64 payload holding a JSON array of records
pub fn decode_payload(index: usize, data: &str) -> Result<Vec<TelemetryRecord>, ContractError> {
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| ContractError::PayloadDecode {
            index,
            message: format!("invalid base64: {e}"),
        })?;
    serde_json::from_slice(&bytes).map_err(|e| ContractError::PayloadDecode {
        index,
        message: format!("invalid record array: {e}"),
    })
}

/// Encode records the way the stream delivers them
pub fn encode_payload(records: &[TelemetryRecord]) -> serde_json::Result<String> {
    Ok(STANDARD.encode(serde_json::to_vec(records)?))
}
