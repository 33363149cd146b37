use crate::csv::CsvError;
use fleet_gateway::GatewayError;

/// 命令链路错误。
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// 本地前置条件不满足，未触网。
    #[error("precondition failed: {0}")]
    Precondition(&'static str),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// 传输成功但远端报告失败。
    #[error("rejected by remote: {0}")]
    Rejected(String),
    #[error("invalid csv: {0}")]
    Csv(#[from] CsvError),
    #[error("export failed: {0}")]
    Export(String),
    #[error("invalid alert transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl CommandError {
    /// 是否在本地被拦截（没有发出任何远端调用）。
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            CommandError::Precondition(_)
                | CommandError::Csv(_)
                | CommandError::InvalidTransition { .. }
        )
    }

    /// 面向操作员的说明。
    pub fn operator_message(&self) -> String {
        match self {
            CommandError::Gateway(err) => err.message().to_string(),
            CommandError::Rejected(message) | CommandError::Export(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
