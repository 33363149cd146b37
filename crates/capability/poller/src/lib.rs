//! # Fleet Poller 模块
//!
//! 驱动快照存储的刷新：
//! - [`Poller::refresh_all`]：初始加载（也用于命令成功后的全量刷新），两阶段并发拉取
//! - 单切片按需刷新（`refresh_roster` / `refresh_statuses` / ...）
//! - [`Poller::start_status_polling`]：固定周期的节点状态轮询，返回可取消的 [`PollHandle`]
//!
//! 失败策略：记录错误事件，保留该切片原值，不中断其他切片与轮询循环。

mod periodic;

pub use periodic::PollHandle;

use chrono::Local;
use domain::{OperatorContext, OrgDirectory, ResourcePatch};
use fleet_eventlog::EventLog;
use fleet_gateway::{GatewayError, RemoteGateway};
use fleet_snapshot::SnapshotStore;
use fleet_telemetry::{record_poll_failure, record_poll_success};
use std::sync::Arc;
use tracing::{info, warn};

/// 快照切片标识（用于加载报告与日志）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    Roster,
    NodeStatus,
    Diagnostics,
    SystemResources,
    AuditLogs,
    Alerts,
    AlertStats,
    Org,
}

impl Slice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slice::Roster => "roster",
            Slice::NodeStatus => "node_status",
            Slice::Diagnostics => "diagnostics",
            Slice::SystemResources => "system_resources",
            Slice::AuditLogs => "audit_logs",
            Slice::Alerts => "alerts",
            Slice::AlertStats => "alert_stats",
            Slice::Org => "org",
        }
    }
}

/// 一次全量加载的结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// 名册加载成功时的条目数。
    pub roster_count: Option<usize>,
    pub failed: Vec<Slice>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 快照刷新器。
#[derive(Clone)]
pub struct Poller {
    gateway: Arc<dyn RemoteGateway>,
    store: Arc<SnapshotStore>,
    events: Arc<EventLog>,
}

impl Poller {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        store: Arc<SnapshotStore>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            gateway,
            store,
            events,
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    fn slice_failed(&self, slice: Slice, err: &GatewayError) {
        record_poll_failure();
        warn!(
            target: "fleet.poller",
            slice = slice.as_str(),
            error = %err,
            "slice_refresh_failed"
        );
        let message = match slice {
            Slice::Roster => "Failed to fetch data".to_string(),
            _ => format!("Failed to fetch {}: {}", slice.as_str(), err.message()),
        };
        self.events.error(message);
    }

    /// 初始加载 / 全量刷新。
    ///
    /// 第一阶段并发拉取名册与（开发者可见的）诊断、资源、审计日志、告警、统计、节点状态；
    /// 第二阶段仅在操作员身份有效时拉取组织主数据。
    pub async fn refresh_all(&self, ctx: &OperatorContext) -> LoadReport {
        self.events.info("Fetching system data...");
        let gateway = self.gateway.as_ref();
        let developer = ctx.is_developer();
        let (roster, diagnostics, resources, audit_logs, alerts, stats, statuses) = tokio::join!(
            gateway.list_fleet(ctx),
            async {
                if developer {
                    Some(gateway.get_diagnostics(ctx).await)
                } else {
                    None
                }
            },
            async {
                if developer {
                    Some(gateway.get_system_resources(ctx).await)
                } else {
                    None
                }
            },
            async {
                if developer {
                    Some(gateway.list_audit_logs(ctx).await)
                } else {
                    None
                }
            },
            async {
                if developer {
                    Some(gateway.list_security_alerts(ctx).await)
                } else {
                    None
                }
            },
            async {
                if developer {
                    Some(gateway.get_security_alert_stats(ctx).await)
                } else {
                    None
                }
            },
            async {
                if developer {
                    Some(gateway.list_node_statuses().await)
                } else {
                    None
                }
            },
        );

        let mut report = LoadReport::default();

        match roster {
            Ok(entries) => {
                record_poll_success();
                report.roster_count = Some(entries.len());
                self.store.replace_roster(entries);
            }
            Err(err) => {
                self.slice_failed(Slice::Roster, &err);
                report.failed.push(Slice::Roster);
            }
        }

        // 系统资源探针后应用，重叠字段以其为准
        let mut patch = ResourcePatch::default();
        let mut patched = false;
        for (slice, result) in [
            (Slice::Diagnostics, diagnostics),
            (Slice::SystemResources, resources),
        ] {
            match result {
                Some(Ok(probe)) => {
                    record_poll_success();
                    patch = patch.merged_with(probe);
                    patched = true;
                }
                Some(Err(err)) => {
                    self.slice_failed(slice, &err);
                    report.failed.push(slice);
                }
                None => {}
            }
        }
        if patched {
            self.store.apply_resource_patch(patch);
        }

        match audit_logs {
            Some(Ok(logs)) => {
                record_poll_success();
                self.store.replace_audit_logs(logs);
            }
            Some(Err(err)) => {
                self.slice_failed(Slice::AuditLogs, &err);
                report.failed.push(Slice::AuditLogs);
            }
            None => {}
        }

        match alerts {
            Some(Ok(list)) => {
                record_poll_success();
                self.store.replace_alert_list(list);
            }
            Some(Err(err)) => {
                self.slice_failed(Slice::Alerts, &err);
                report.failed.push(Slice::Alerts);
            }
            None => {}
        }

        match stats {
            Some(Ok(stats)) => {
                record_poll_success();
                self.store.replace_alert_stats(stats);
            }
            Some(Err(err)) => {
                self.slice_failed(Slice::AlertStats, &err);
                report.failed.push(Slice::AlertStats);
            }
            None => {}
        }

        match statuses {
            Some(Ok(list)) => {
                record_poll_success();
                self.store.replace_node_status(list);
            }
            Some(Err(err)) => {
                self.slice_failed(Slice::NodeStatus, &err);
                report.failed.push(Slice::NodeStatus);
            }
            None => {}
        }

        if ctx.has_identity() && self.refresh_org(ctx).await.is_err() {
            report.failed.push(Slice::Org);
        }

        self.store.set_last_sync(Local::now());
        if let Some(count) = report.roster_count {
            self.events.success(format!(
                "Loaded {} entries and checked system health",
                count
            ));
        }
        info!(
            target: "fleet.poller",
            operator_id = ctx.operator_id,
            roster_count = report.roster_count.unwrap_or(0),
            failed = report.failed.len(),
            "initial_load_completed"
        );
        report
    }

    pub async fn refresh_roster(&self, ctx: &OperatorContext) -> Result<usize, GatewayError> {
        match self.gateway.list_fleet(ctx).await {
            Ok(entries) => {
                record_poll_success();
                let count = entries.len();
                self.store.replace_roster(entries);
                Ok(count)
            }
            Err(err) => {
                self.slice_failed(Slice::Roster, &err);
                Err(err)
            }
        }
    }

    /// 节点状态刷新（周期轮询的单次动作）。
    pub async fn refresh_statuses(&self) -> Result<(), GatewayError> {
        match self.gateway.list_node_statuses().await {
            Ok(statuses) => {
                record_poll_success();
                self.store.replace_node_status(statuses);
                Ok(())
            }
            Err(err) => {
                self.slice_failed(Slice::NodeStatus, &err);
                Err(err)
            }
        }
    }

    /// 告警列表与统计独立获取，任一失败不影响另一方写入。
    pub async fn refresh_alerts(&self, ctx: &OperatorContext) -> Result<(), GatewayError> {
        let (alerts, stats) = tokio::join!(
            self.gateway.list_security_alerts(ctx),
            self.gateway.get_security_alert_stats(ctx)
        );
        let mut first_err = None;
        match alerts {
            Ok(list) => {
                record_poll_success();
                self.store.replace_alert_list(list);
            }
            Err(err) => {
                self.slice_failed(Slice::Alerts, &err);
                first_err = Some(err);
            }
        }
        match stats {
            Ok(stats) => {
                record_poll_success();
                self.store.replace_alert_stats(stats);
            }
            Err(err) => {
                self.slice_failed(Slice::AlertStats, &err);
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub async fn refresh_resources(&self, ctx: &OperatorContext) -> Result<(), GatewayError> {
        let (diagnostics, resources) = tokio::join!(
            self.gateway.get_diagnostics(ctx),
            self.gateway.get_system_resources(ctx)
        );
        let mut patch = ResourcePatch::default();
        let mut first_err = None;
        for (slice, result) in [
            (Slice::Diagnostics, diagnostics),
            (Slice::SystemResources, resources),
        ] {
            match result {
                Ok(probe) => {
                    record_poll_success();
                    patch = patch.merged_with(probe);
                }
                Err(err) => {
                    self.slice_failed(slice, &err);
                    first_err.get_or_insert(err);
                }
            }
        }
        if !patch.is_empty() {
            self.store.apply_resource_patch(patch);
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub async fn refresh_audit_logs(&self, ctx: &OperatorContext) -> Result<(), GatewayError> {
        match self.gateway.list_audit_logs(ctx).await {
            Ok(logs) => {
                record_poll_success();
                self.store.replace_audit_logs(logs);
                Ok(())
            }
            Err(err) => {
                self.slice_failed(Slice::AuditLogs, &err);
                Err(err)
            }
        }
    }

    /// 组织主数据：施设与部门需同时成功才替换。
    pub async fn refresh_org(&self, ctx: &OperatorContext) -> Result<(), GatewayError> {
        let (facilities, departments) = tokio::join!(
            self.gateway.list_facilities(ctx),
            self.gateway.list_departments(ctx)
        );
        match (facilities, departments) {
            (Ok(facilities), Ok(departments)) => {
                record_poll_success();
                self.store
                    .replace_org(OrgDirectory::new(facilities, departments));
                Ok(())
            }
            (Err(err), _) | (_, Err(err)) => {
                self.slice_failed(Slice::Org, &err);
                Err(err)
            }
        }
    }
}
