//! 周期节点状态轮询。
//!
//! 每个 tick 的拉取单独派生任务执行，慢请求不阻塞下一个 tick；
//! 结果按到达顺序写入快照（后到达者生效，而非后发起者）。

use crate::Poller;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// 轮询任务句柄。`stop` 或 drop 都会结束定时器并取消未完成的拉取。
pub struct PollHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// 通知循环退出并等待其结束。
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Poller {
    /// 启动固定周期的节点状态轮询。首次拉取在一个周期之后（初始加载已包含节点状态）。
    pub fn start_status_polling(&self, period: Duration) -> PollHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let poller = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut inflight: JoinSet<()> = JoinSet::new();
            info!(
                target: "fleet.poller",
                period_ms = period.as_millis() as u64,
                "status_polling_started"
            );
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let poller = poller.clone();
                        inflight.spawn(async move {
                            let _ = poller.refresh_statuses().await;
                        });
                        debug!(target: "fleet.poller", inflight = inflight.len(), "status_poll_tick");
                    }
                    Some(_) = inflight.join_next(), if !inflight.is_empty() => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            inflight.abort_all();
            info!(target: "fleet.poller", "status_polling_stopped");
        });
        PollHandle {
            shutdown,
            task: Some(task),
        }
    }
}
