//! 操作员交互接口（阻塞确认与阻塞提示）。

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[async_trait]
pub trait OperatorNotifier: Send + Sync {
    /// 是 / 否确认；返回 `false` 时命令不触网。
    async fn confirm(&self, prompt: &str) -> bool;

    fn alert(&self, message: &str);
}

#[derive(Debug, Default)]
struct NotifierState {
    answers: VecDeque<bool>,
    prompts: Vec<String>,
    alerts: Vec<String>,
}

/// 预设应答的通知器：按队列应答确认，队列为空时使用默认应答；记录所有提示。
#[derive(Debug, Default)]
pub struct ScriptedNotifier {
    default_answer: bool,
    state: Mutex<NotifierState>,
}

impl ScriptedNotifier {
    pub fn new(default_answer: bool) -> Self {
        Self {
            default_answer,
            state: Mutex::new(NotifierState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, NotifierState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_answer(&self, answer: bool) {
        self.state().answers.push_back(answer);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.state().alerts.clone()
    }
}

#[async_trait]
impl OperatorNotifier for ScriptedNotifier {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut state = self.state();
        state.prompts.push(prompt.to_string());
        state.answers.pop_front().unwrap_or(self.default_answer)
    }

    fn alert(&self, message: &str) {
        self.state().alerts.push(message.to_string());
    }
}
