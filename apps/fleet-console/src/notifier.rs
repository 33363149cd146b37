//! 无界面环境下的操作员交互：阻塞提示写入日志，确认请求按启动参数统一作答。

use async_trait::async_trait;
use fleet_control::OperatorNotifier;
use tracing::{info, warn};

pub struct LogNotifier {
    auto_confirm: bool,
}

impl LogNotifier {
    pub fn new(auto_confirm: bool) -> Self {
        Self { auto_confirm }
    }
}

#[async_trait]
impl OperatorNotifier for LogNotifier {
    async fn confirm(&self, prompt: &str) -> bool {
        info!(
            target: "fleet.console",
            prompt = prompt,
            answer = self.auto_confirm,
            "confirmation_answered"
        );
        self.auto_confirm
    }

    fn alert(&self, message: &str) {
        warn!(target: "fleet.console", message = message, "operator_alert");
    }
}
