//! # Telemetry Generator
//!
//! Synthetic agricultural vehicle telemetry.
//!
//! Responsibilities:
//! - Draw every record field independently within its closed range
//! - Tag each record with `<uuid>-<run_id>` and a generation timestamp
//! - Simulate sensor dropout through a declarative `DropTable`
//!
//! ## Usage Example
//!
//! ```
//! use contracts::GeneratorConfig;
//! use generator::TelemetryGenerator;
//!
//! let mut generator = TelemetryGenerator::new(&GeneratorConfig {
//!     seed: Some(42),
//!     ..Default::default()
//! });
//! let records = generator.generate(3, "req-1");
//! assert_eq!(records.len(), 3);
//! assert!(records.iter().all(|r| r.id.ends_with("-req-1")));
//! ```

mod drop_table;
mod generator;

pub use contracts::TelemetryRecord;
pub use drop_table::DropTable;
pub use generator::{round_to, TelemetryGenerator};
