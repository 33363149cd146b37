//! 网关错误类型

/// 网关调用错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote error: {0}")]
    Remote(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    /// 面向操作员的简短说明（不含分类前缀）。
    pub fn message(&self) -> &str {
        match self {
            GatewayError::Transport(message)
            | GatewayError::Remote(message)
            | GatewayError::Decode(message) => message.as_str(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}
