//! 控制台运行配置加载。

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 控制台运行配置。
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base: String,
    /// 未设置时跳过组织主数据的第二阶段加载。
    pub operator_id: Option<i64>,
    pub operator_role: String,
    pub status_poll_interval: Duration,
    pub request_timeout: Duration,
    pub event_log_capacity: usize,
    pub copy_indicator: Duration,
    pub export_dir: PathBuf,
    /// 无人值守时对确认请求的统一回答。
    pub auto_confirm: bool,
}

impl ConsoleConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base = env::var("CONSOLE_API_BASE")
            .map_err(|_| ConfigError::Missing("CONSOLE_API_BASE".to_string()))?;
        let operator_id = read_optional_i64("CONSOLE_OPERATOR_ID")?;
        let operator_role =
            env::var("CONSOLE_OPERATOR_ROLE").unwrap_or_else(|_| "DEVELOPER".to_string());
        let status_poll_interval_ms =
            read_positive_u64_with_default("CONSOLE_STATUS_POLL_INTERVAL_MS", 5_000)?;
        let request_timeout_ms =
            read_positive_u64_with_default("CONSOLE_REQUEST_TIMEOUT_MS", 10_000)?;
        let event_log_capacity =
            read_positive_u64_with_default("CONSOLE_EVENT_LOG_CAPACITY", 50)? as usize;
        let copy_indicator_ms = read_positive_u64_with_default("CONSOLE_COPY_INDICATOR_MS", 2_000)?;
        let export_dir = env::var("CONSOLE_EXPORT_DIR")
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let auto_confirm = read_bool_with_default("CONSOLE_AUTO_CONFIRM", false)?;

        Ok(Self {
            api_base,
            operator_id,
            operator_role,
            status_poll_interval: Duration::from_millis(status_poll_interval_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
            event_log_capacity,
            copy_indicator: Duration::from_millis(copy_indicator_ms),
            export_dir,
            auto_confirm,
        })
    }
}

fn read_positive_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}

fn read_bool_with_default(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid(key.to_string(), value)),
        },
        Err(_) => Ok(default),
    }
}

fn read_optional_i64(key: &str) -> Result<Option<i64>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
        Err(_) => Ok(None),
    }
}
