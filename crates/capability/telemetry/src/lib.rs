//! 追踪初始化、请求 ID 生成与进程级计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识（随网关请求头下发）。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub polls_succeeded: u64,
    pub polls_failed: u64,
    pub commands_issued: u64,
    pub commands_succeeded: u64,
    pub commands_failed: u64,
    pub commands_rejected: u64,
    pub events_logged: u64,
    pub gateway_latency_ms_total: u64,
    pub gateway_latency_ms_count: u64,
}

/// 基础指标（仅用于观测，不参与任何业务判断）。
pub struct TelemetryMetrics {
    polls_succeeded: AtomicU64,
    polls_failed: AtomicU64,
    commands_issued: AtomicU64,
    commands_succeeded: AtomicU64,
    commands_failed: AtomicU64,
    commands_rejected: AtomicU64,
    events_logged: AtomicU64,
    gateway_latency_ms_total: AtomicU64,
    gateway_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            polls_succeeded: AtomicU64::new(0),
            polls_failed: AtomicU64::new(0),
            commands_issued: AtomicU64::new(0),
            commands_succeeded: AtomicU64::new(0),
            commands_failed: AtomicU64::new(0),
            commands_rejected: AtomicU64::new(0),
            events_logged: AtomicU64::new(0),
            gateway_latency_ms_total: AtomicU64::new(0),
            gateway_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            polls_succeeded: self.polls_succeeded.load(Ordering::Relaxed),
            polls_failed: self.polls_failed.load(Ordering::Relaxed),
            commands_issued: self.commands_issued.load(Ordering::Relaxed),
            commands_succeeded: self.commands_succeeded.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            events_logged: self.events_logged.load(Ordering::Relaxed),
            gateway_latency_ms_total: self.gateway_latency_ms_total.load(Ordering::Relaxed),
            gateway_latency_ms_count: self.gateway_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录一次成功的快照刷新。
pub fn record_poll_success() {
    metrics().polls_succeeded.fetch_add(1, Ordering::Relaxed);
}

/// 记录一次失败的快照刷新。
pub fn record_poll_failure() {
    metrics().polls_failed.fetch_add(1, Ordering::Relaxed);
}

/// 记录命令发起次数（已通过本地前置校验）。
pub fn record_command_issued() {
    metrics().commands_issued.fetch_add(1, Ordering::Relaxed);
}

pub fn record_command_success() {
    metrics().commands_succeeded.fetch_add(1, Ordering::Relaxed);
}

/// 记录命令失败次数（传输失败或远端报告失败）。
pub fn record_command_failure() {
    metrics().commands_failed.fetch_add(1, Ordering::Relaxed);
}

/// 记录被本地前置条件拦截、未触达网络的命令。
pub fn record_command_rejected() {
    metrics().commands_rejected.fetch_add(1, Ordering::Relaxed);
}

pub fn record_event_logged() {
    metrics().events_logged.fetch_add(1, Ordering::Relaxed);
}

/// 记录网关调用耗时（毫秒）。
pub fn record_gateway_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .gateway_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .gateway_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}
