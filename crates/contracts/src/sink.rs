//! RecordSink trait - emitter output interface
//!
//! Defines the abstract interface for sinks.

use crate::{Batch, ContractError, SendReport};

/// Batch output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(RecordSink: Send)]
pub trait LocalRecordSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one batch as a single unit
    ///
    /// # Errors
    /// Returns send error (should include context). Callers log and drop
    /// the batch; nothing is retried.
    async fn send(&mut self, batch: &Batch) -> Result<SendReport, ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
