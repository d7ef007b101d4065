//! # Contracts
//!
//! Shared interface contracts between the loadgen crates.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Record model
//! - One `TelemetryRecord` is one simulated vehicle sample at one instant
//! - Dropped sensor fields are `None` and are omitted on the wire

mod batch;
mod error;
mod profile;
mod record;
mod response;
mod sink;
mod stream;

pub use batch::*;
pub use error::*;
pub use profile::*;
pub use record::*;
pub use response::*;
pub use sink::*;
pub use stream::*;
