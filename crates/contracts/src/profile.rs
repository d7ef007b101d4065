//! LoadProfile - Config Loader 输出
//!
//! 描述一次运行的完整配置：记录生成、发送节奏、输出目标、连接参数、
//! 读负载查询与流转发。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::DroppableField;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的运行配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadProfile {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 运行标识，作为记录 `_id` 后缀 (默认随机 UUID)
    #[serde(default)]
    pub run_id: Option<String>,

    /// 记录生成配置
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// 批量发送配置
    #[serde(default)]
    pub emitter: EmitterConfig,

    /// 输出目标
    #[serde(default)]
    pub sink: SinkConfig,

    /// MQTT broker 连接
    #[serde(default)]
    pub mqtt: Option<MqttConfig>,

    /// MongoDB 连接
    #[serde(default)]
    pub mongo: Option<MongoConfig>,

    /// 时间窗口聚合查询 (读负载)
    #[serde(default)]
    pub query: Option<QueryConfig>,

    /// 流数据转发
    #[serde(default)]
    pub relay: Option<RelayConfig>,

    /// 密钥来源
    #[serde(default)]
    pub secrets: SecretsConfig,
}

// ===== Generator =====

/// 记录生成配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// vehicleid 取值范围
    #[serde(default)]
    pub vehicle_ids: VehicleIdRange,

    /// 随机种子 (None = 系统熵)
    #[serde(default)]
    pub seed: Option<u64>,

    /// 覆盖默认的字段丢弃表
    #[serde(default)]
    pub dropout: Option<Vec<DropRule>>,
}

/// Inclusive vehicle identifier range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdRange {
    pub min: i32,
    pub max: i32,
}

impl Default for VehicleIdRange {
    fn default() -> Self {
        Self { min: 1, max: 50000 }
    }
}

/// One row of the dropout table: drop all `fields` together with `probability`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropRule {
    pub fields: Vec<DroppableField>,
    pub probability: f64,
}

impl DropRule {
    pub fn single(field: DroppableField, probability: f64) -> Self {
        Self {
            fields: vec![field],
            probability,
        }
    }

    pub fn group(fields: &[DroppableField], probability: f64) -> Self {
        Self {
            fields: fields.to_vec(),
            probability,
        }
    }
}

// ===== Emitter =====

/// 批量发送配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// 每批记录数范围
    #[serde(default)]
    pub batch_size: BatchSizeRange,

    /// 停止条件
    #[serde(default)]
    pub stop: StopCondition,

    /// 批次间隔
    #[serde(default = "default_pacing")]
    pub pacing: DelayRange,

    /// 首批发送前的随机等待 (None = 不等待)
    #[serde(default)]
    pub start_jitter: Option<DelayRange>,

    /// 进度日志阈值 (记录数)
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            batch_size: BatchSizeRange::default(),
            stop: StopCondition::default(),
            pacing: default_pacing(),
            start_jitter: None,
            progress_every: default_progress_every(),
        }
    }
}

fn default_pacing() -> DelayRange {
    DelayRange::fixed(10)
}

fn default_progress_every() -> u64 {
    5000
}

/// Inclusive batch size range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSizeRange {
    pub min: usize,
    pub max: usize,
}

impl BatchSizeRange {
    /// `size ± spread`, floored at 1
    pub fn around(size: usize, spread: usize) -> Self {
        Self {
            min: size.saturating_sub(spread).max(1),
            max: size + spread,
        }
    }

    pub fn fixed(size: usize) -> Self {
        Self {
            min: size,
            max: size,
        }
    }
}

impl Default for BatchSizeRange {
    fn default() -> Self {
        Self::around(200, 20)
    }
}

/// Inclusive delay range in milliseconds; fixed when `min_ms == max_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.min_ms == self.max_ms
    }
}

/// When the emitter stops starting new batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StopCondition {
    /// Exactly `count` batches, failed sends included
    Batches { count: u64 },
    /// Stop once `count` records have been sent
    Records { count: u64 },
    /// Stop once the wall-clock deadline has passed
    Duration { seconds: u64 },
}

impl Default for StopCondition {
    fn default() -> Self {
        StopCondition::Duration { seconds: 900 }
    }
}

impl StopCondition {
    /// Deadline for duration mode
    pub fn deadline(&self) -> Option<Duration> {
        match self {
            StopCondition::Duration { seconds } => Some(Duration::from_secs(*seconds)),
            _ => None,
        }
    }
}

// ===== Sink =====

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 目标：topic / collection / 文件路径
    #[serde(default)]
    pub target: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            name: "log".to_string(),
            sink_type: SinkType::Log,
            target: String::new(),
        }
    }
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// 文件输出 (JSON lines)
    File,
    /// MQTT 消息发布
    Mqtt,
    /// MongoDB 批量写入
    Mongo,
}

// ===== Connections =====

/// MQTT broker 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker 地址
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    /// 客户端 ID (默认使用 run_id)
    #[serde(default)]
    pub client_id: Option<String>,

    /// 是否使用双向 TLS
    #[serde(default = "default_true")]
    pub tls: bool,

    /// Root CA 证书路径
    #[serde(default)]
    pub ca_path: Option<PathBuf>,

    /// 设备证书路径
    #[serde(default)]
    pub certificate_path: Option<PathBuf>,

    /// 私钥所在的密钥 ID (PEM 原文)
    #[serde(default)]
    pub private_key_secret: Option<String>,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    #[serde(default)]
    pub clean_session: bool,

    /// 最大报文大小 (字节)
    #[serde(default = "default_max_packet_bytes")]
    pub max_packet_bytes: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            port: default_mqtt_port(),
            client_id: None,
            tls: true,
            ca_path: None,
            certificate_path: None,
            private_key_secret: None,
            keep_alive_secs: default_keep_alive_secs(),
            clean_session: false,
            max_packet_bytes: default_max_packet_bytes(),
        }
    }
}

fn default_mqtt_port() -> u16 {
    8883
}

fn default_true() -> bool {
    true
}

fn default_keep_alive_secs() -> u64 {
    6
}

fn default_max_packet_bytes() -> usize {
    128 * 1024
}

/// MongoDB 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// 集群地址 (不含协议)
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub user: String,

    /// 密码所在的密钥 ID (JSON，含 `password` 字段)
    #[serde(default)]
    pub password_secret: String,

    #[serde(default)]
    pub database: String,

    /// 连接协议
    #[serde(default = "default_mongo_scheme")]
    pub scheme: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            password_secret: String::new(),
            database: String::new(),
            scheme: default_mongo_scheme(),
        }
    }
}

fn default_mongo_scheme() -> String {
    "mongodb+srv".to_string()
}

// ===== Query =====

/// 时间窗口平均速度查询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// 查询的集合
    #[serde(default)]
    pub collection: String,

    /// 车辆过滤 (None = 全部车辆)
    #[serde(default)]
    pub vehicle_id: Option<i32>,

    /// 回溯窗口 (分钟)
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,

    /// 执行次数
    #[serde(default = "default_executions")]
    pub executions: u32,

    /// 两次查询间隔 (毫秒)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// 聚合方式
    #[serde(default)]
    pub mode: QueryMode,

    /// 关联集合 (按 vehicleid)
    #[serde(default)]
    pub join: Option<JoinConfig>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            collection: String::new(),
            vehicle_id: None,
            window_minutes: default_window_minutes(),
            executions: default_executions(),
            interval_ms: default_interval_ms(),
            mode: QueryMode::default(),
            join: None,
        }
    }
}

fn default_window_minutes() -> u32 {
    5
}

fn default_executions() -> u32 {
    1000
}

fn default_interval_ms() -> u64 {
    2000
}

/// Where the average is computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// `$match` + `$group` pipeline evaluated by the server
    #[default]
    Aggregate,
    /// Fetch matching documents and average locally
    Client,
}

/// `$lookup` against a second collection keyed by vehicle identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinConfig {
    pub collection: String,

    #[serde(default = "default_join_field")]
    pub local_field: String,

    #[serde(default = "default_join_field")]
    pub foreign_field: String,

    #[serde(default = "default_join_as")]
    pub as_field: String,
}

fn default_join_field() -> String {
    "vehicleid".to_string()
}

fn default_join_as() -> String {
    "vehicle".to_string()
}

// ===== Relay =====

/// 流数据转发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// 目标集合
    #[serde(default)]
    pub collection: String,

    /// 每次写入的文档数
    #[serde(default = "default_relay_batch_size")]
    pub batch_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            collection: String::new(),
            batch_size: default_relay_batch_size(),
        }
    }
}

fn default_relay_batch_size() -> usize {
    50
}

// ===== Secrets =====

/// 密钥来源配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub source: SecretSourceKind,

    /// `file` 来源的目录
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Secret backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretSourceKind {
    /// Secret id names an environment variable holding the secret string
    #[default]
    Env,
    /// Secret id names a file inside `dir`
    File,
}

impl LoadProfile {
    /// Effective query configuration
    ///
    /// Falls back to the sink collection when the query section omits one.
    pub fn query_config(&self) -> Option<QueryConfig> {
        self.query.clone().map(|mut query| {
            if query.collection.is_empty() && self.sink.sink_type == SinkType::Mongo {
                query.collection = self.sink.target.clone();
            }
            query
        })
    }
}
