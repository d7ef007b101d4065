//! # Emitter
//!
//! 批量发送引擎。
//!
//! 负责：
//! - 按停止条件循环 生成 → 发送 → 等待
//! - 批次大小在区间内随机，节奏固定或抖动
//! - 单批失败只记录日志，不中断运行
//! - 流事件转发 (`StreamRelay`)
//!
//! ## 使用示例
//!
//! ```ignore
//! use emitter::Emitter;
//! use generator::TelemetryGenerator;
//!
//! let generator = TelemetryGenerator::new(&profile.generator);
//! let summary = Emitter::new(generator, sink, profile.emitter.clone(), run_id)
//!     .with_shutdown(shutdown_rx)
//!     .run()
//!     .await;
//! println!("{} records in {} batches", summary.records_sent, summary.batches_sent);
//! ```

mod emitter;
mod progress;
mod relay;

pub use emitter::{sample_delay, Emitter, RunSummary, StopReason};
pub use progress::{ProgressLine, ProgressReporter};
pub use relay::{decode_payload, encode_payload, RelaySummary, StreamRelay};
