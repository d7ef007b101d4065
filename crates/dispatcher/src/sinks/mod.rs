//! Sink implementations
//!
//! Contains LogSink, FileSink, MqttSink, and MongoSink.

mod file;
mod log;
mod mongo;
mod mqtt;

pub use self::file::FileSink;
pub use self::log::LogSink;
pub use self::mongo::{mongo_client, partial_insert_report, MongoSink};
pub use self::mqtt::{publish_payload, MqttSink, MqttSinkConfig};
