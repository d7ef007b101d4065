//! LogSink - logs batch summary via tracing

use contracts::{Batch, ContractError, RecordSink, SendReport};
use tracing::{info, instrument};

/// Sink that logs batch summaries (dry runs and debugging)
pub struct LogSink {
    name: String,
    batches: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: 0,
        }
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }

    fn log_batch_summary(&self, batch: &Batch) {
        let vehicles = batch
            .records
            .iter()
            .map(|r| r.vehicleid)
            .fold(None, |acc: Option<(i32, i32)>, id| match acc {
                Some((lo, hi)) => Some((lo.min(id), hi.max(id))),
                None => Some((id, id)),
            });

        info!(
            sink = %self.name,
            batch = batch.sequence,
            records = batch.len(),
            vehicle_range = ?vehicles,
            first_id = batch.records.first().map(|r| r.id.as_str()),
            "Batch received"
        );
    }
}

impl RecordSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_send",
        skip(self, batch),
        fields(sink = %self.name, batch = batch.sequence)
    )]
    async fn send(&mut self, batch: &Batch) -> Result<SendReport, ContractError> {
        self.log_batch_summary(batch);
        self.batches += 1;
        Ok(SendReport::accepted(batch.len()))
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, batches = self.batches, "LogSink closed");
        Ok(())
    }
}
