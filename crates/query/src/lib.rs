//! # Query
//!
//! 时间窗口平均速度查询 (读负载)。
//!
//! - `QueryWindow`：`[now - minutes, now]` 窗口与过滤条件
//! - `average_pipeline`：`$match` → (可选 `$lookup`) → `$group`
//! - `QueryRunner`：按次数与间隔循环执行，失败只记录日志
//!
//! 平均值由数据库计算 (aggregate 模式) 或在本地计算 (client 模式)；
//! 无匹配文档时结果为 0。

mod runner;
mod source;
mod window;

pub use runner::{QueryRunner, QuerySummary};
pub use source::{LocalSpeedSource, MongoSpeedSource, SpeedSource};
pub use window::{average_pipeline, average_speed, selection_stages, QueryWindow};
