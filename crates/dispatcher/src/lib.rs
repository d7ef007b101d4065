//! # Dispatcher
//!
//! 输出目标 (sink) 模块。
//!
//! 负责：
//! - 按配置创建唯一的 sink (log / file / mqtt / mongo)
//! - MQTT：每批一条 QoS 0 消息
//! - MongoDB：无序批量写入，部分失败按成功数上报

pub mod dispatcher;
pub mod error;
pub mod sinks;

pub use contracts::{Batch, RecordSink, SendReport};
pub use dispatcher::{create_sink, create_storage_sink, ConfiguredSink};
pub use error::DispatcherError;
pub use sinks::{
    mongo_client, partial_insert_report, publish_payload, FileSink, LogSink, MongoSink, MqttSink,
    MqttSinkConfig,
};
