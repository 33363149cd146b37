//! 控制台装配与生命周期（激活 / 停用）。

use domain::{OperatorContext, Role};
use fleet_config::ConsoleConfig;
use fleet_control::{CommandPipeline, OperatorNotifier, PipelineConfig};
use fleet_edit::EditController;
use fleet_eventlog::EventLog;
use fleet_gateway::RemoteGateway;
use fleet_poller::{LoadReport, PollHandle, Poller};
use fleet_snapshot::SnapshotStore;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::info;

/// 由配置派生的控制台参数。
#[derive(Debug, Clone)]
pub struct ConsoleSettings {
    pub ctx: OperatorContext,
    pub status_poll_interval: Duration,
    pub event_log_capacity: usize,
    pub pipeline: PipelineConfig,
}

impl ConsoleSettings {
    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self {
            ctx: OperatorContext::new(
                config.operator_id.unwrap_or(0),
                Role::parse(&config.operator_role),
                None,
            ),
            status_poll_interval: config.status_poll_interval,
            event_log_capacity: config.event_log_capacity,
            pipeline: PipelineConfig {
                export_dir: config.export_dir.clone(),
                copy_indicator: config.copy_indicator,
            },
        }
    }
}

pub struct Console {
    settings: ConsoleSettings,
    store: Arc<SnapshotStore>,
    events: Arc<EventLog>,
    poller: Poller,
    pipeline: Arc<CommandPipeline>,
    editor: EditController,
    polling: Mutex<Option<PollHandle>>,
}

impl Console {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        notifier: Arc<dyn OperatorNotifier>,
        settings: ConsoleSettings,
    ) -> Self {
        let store = Arc::new(SnapshotStore::new());
        let events = Arc::new(EventLog::new(settings.event_log_capacity));
        let poller = Poller::new(gateway.clone(), store.clone(), events.clone());
        let pipeline = Arc::new(CommandPipeline::new(
            gateway,
            poller.clone(),
            notifier,
            settings.pipeline.clone(),
        ));
        let editor = EditController::new(store.clone(), events.clone(), pipeline.clone());
        Self {
            settings,
            store,
            events,
            poller,
            pipeline,
            editor,
            polling: Mutex::new(None),
        }
    }

    fn polling(&self) -> MutexGuard<'_, Option<PollHandle>> {
        self.polling
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn ctx(&self) -> &OperatorContext {
        &self.settings.ctx
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    pub fn pipeline(&self) -> &Arc<CommandPipeline> {
        &self.pipeline
    }

    pub fn editor(&self) -> &EditController {
        &self.editor
    }

    pub fn is_polling(&self) -> bool {
        self.polling()
            .as_ref()
            .map(PollHandle::is_running)
            .unwrap_or(false)
    }

    /// 初始加载后启动周期状态轮询。重复激活先取消旧定时器，任何时刻至多一个。
    ///
    /// 节点状态只对开发者可见，其他操作员不启动轮询。
    pub async fn activate(&self) -> LoadReport {
        drop(self.polling().take());
        self.events.info("System initialized");
        let report = self.poller.refresh_all(&self.settings.ctx).await;
        self.editor.discard_if_gone();

        if self.settings.ctx.is_developer() {
            let handle = self
                .poller
                .start_status_polling(self.settings.status_poll_interval);
            let previous = self.polling().replace(handle);
            drop(previous);
        }
        info!(
            target: "fleet.console",
            operator_id = self.settings.ctx.operator_id,
            complete = report.is_complete(),
            "console_activated"
        );
        report
    }

    /// 停止周期轮询；未激活时无操作。
    pub async fn deactivate(&self) {
        let handle = self.polling().take();
        if let Some(handle) = handle {
            handle.stop().await;
            info!(target: "fleet.console", "console_deactivated");
        }
    }
}
