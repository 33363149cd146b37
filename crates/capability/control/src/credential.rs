//! 临时凭据展示面板。
//!
//! 每次签发都覆盖当前展示的凭据；复制为手动动作，`copied` 提示在固定时长后自动恢复，
//! 重复复制会重新计时（以最后一次为准）。

use domain::{EntryId, TemporaryCredential};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownCredential {
    pub entry_id: EntryId,
    pub temp_password: String,
}

#[derive(Debug, Default)]
struct PanelState {
    shown: Option<ShownCredential>,
    copied: bool,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct CredentialPanel {
    state: Arc<Mutex<PanelState>>,
    copy_indicator: Duration,
}

impl CredentialPanel {
    pub fn new(copy_indicator: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(PanelState::default())),
            copy_indicator,
        }
    }

    fn state(&self) -> MutexGuard<'_, PanelState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 展示新凭据（覆盖旧值并复位复制提示）。
    pub fn show(&self, entry_id: EntryId, credential: TemporaryCredential) {
        let mut state = self.state();
        state.shown = Some(ShownCredential {
            entry_id,
            temp_password: credential.temp_password,
        });
        state.copied = false;
        state.generation += 1;
    }

    pub fn current(&self) -> Option<ShownCredential> {
        self.state().shown.clone()
    }

    pub fn is_copied(&self) -> bool {
        self.state().copied
    }

    /// 标记已复制，返回要放入剪贴板的口令；没有展示中的凭据时为 `None`。
    ///
    /// 需在 tokio 运行时内调用。
    pub fn mark_copied(&self) -> Option<String> {
        let (password, generation) = {
            let mut state = self.state();
            let password = state.shown.as_ref()?.temp_password.clone();
            state.copied = true;
            state.generation += 1;
            (password, state.generation)
        };
        let panel = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(panel.copy_indicator).await;
            let mut state = panel.state();
            if state.generation == generation {
                state.copied = false;
            }
        });
        Some(password)
    }

    /// 关闭面板。
    pub fn dismiss(&self) {
        let mut state = self.state();
        state.shown = None;
        state.copied = false;
        state.generation += 1;
    }
}
