//! # Fleet Snapshot 模块
//!
//! 远端状态的本地快照：名册、节点状态、告警 + 统计、资源、审计日志、组织主数据，
//! 以及名册上的选择集。
//!
//! ## 约束
//!
//! - 每个切片只能整体替换，不做字段级合并（资源探针除外，见 [`SnapshotStore::apply_resource_patch`]）
//! - 选择集始终是当前名册 id 的子集：`replace_roster` 会同步剪枝
//! - 外部组件只能通过这里的具名操作写入

use chrono::{DateTime, Local};
use domain::{
    AlertStats, AuditLogEntry, EntryId, FleetEntry, NodeState, NodeStatus, NodeStatusMap,
    OrgDirectory, ResourcePatch, ResourceSnapshot, Role, SecurityAlert, effective_state,
};
use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// 名册派生统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterStats {
    pub total: usize,
    pub users: usize,
    pub admins: usize,
    pub developers: usize,
    pub unknown_roles: usize,
    /// 去重后的施设数。
    pub facilities: usize,
}

#[derive(Default)]
struct SnapshotState {
    roster: Vec<FleetEntry>,
    statuses: NodeStatusMap,
    alerts: Vec<SecurityAlert>,
    alert_stats: AlertStats,
    resources: ResourceSnapshot,
    audit_logs: Vec<AuditLogEntry>,
    org: OrgDirectory,
    last_sync: Option<DateTime<Local>>,
    /// 按勾选顺序保存。
    selection: Vec<EntryId>,
}

/// 快照存储。
#[derive(Default)]
pub struct SnapshotStore {
    state: RwLock<SnapshotState>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    // 锁中毒时沿用最后一次写入的数据
    fn read(&self) -> RwLockReadGuard<'_, SnapshotState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SnapshotState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 整体替换名册，并把选择集剪枝到仍存在的 id。返回被剪掉的 id 数量。
    pub fn replace_roster(&self, entries: Vec<FleetEntry>) -> usize {
        let mut state = self.write();
        let present: HashSet<EntryId> = entries.iter().map(|entry| entry.id).collect();
        let before = state.selection.len();
        state.selection.retain(|id| present.contains(id));
        let pruned = before - state.selection.len();
        state.roster = entries;
        debug!(
            target: "fleet.snapshot",
            count = state.roster.len(),
            "roster_replaced"
        );
        if pruned > 0 {
            info!(target: "fleet.snapshot", pruned, "selection_pruned");
        }
        pruned
    }

    /// 整体替换节点状态；本次未出现的节点回落为默认 `UP`。
    pub fn replace_node_status(&self, statuses: Vec<NodeStatus>) {
        let map: NodeStatusMap = statuses
            .into_iter()
            .map(|status| (status.entry_id, status))
            .collect();
        let mut state = self.write();
        debug!(target: "fleet.snapshot", count = map.len(), "node_status_replaced");
        state.statuses = map;
    }

    pub fn replace_alerts(&self, alerts: Vec<SecurityAlert>, stats: AlertStats) {
        let mut state = self.write();
        state.alerts = alerts;
        state.alert_stats = stats;
    }

    /// 只替换告警列表（统计获取失败时保留原统计）。
    pub fn replace_alert_list(&self, alerts: Vec<SecurityAlert>) {
        self.write().alerts = alerts;
    }

    pub fn replace_alert_stats(&self, stats: AlertStats) {
        self.write().alert_stats = stats;
    }

    pub fn replace_resources(&self, snapshot: ResourceSnapshot) {
        self.write().resources = snapshot;
    }

    /// 以当前资源快照为底应用探针结果。
    pub fn apply_resource_patch(&self, patch: ResourcePatch) {
        let mut state = self.write();
        state.resources = ResourceSnapshot::apply(state.resources, patch);
    }

    pub fn replace_audit_logs(&self, logs: Vec<AuditLogEntry>) {
        self.write().audit_logs = logs;
    }

    pub fn replace_org(&self, org: OrgDirectory) {
        self.write().org = org;
    }

    pub fn set_last_sync(&self, at: DateTime<Local>) {
        self.write().last_sync = Some(at);
    }

    pub fn roster(&self) -> Vec<FleetEntry> {
        self.read().roster.clone()
    }

    pub fn entry(&self, entry_id: EntryId) -> Option<FleetEntry> {
        self.read()
            .roster
            .iter()
            .find(|entry| entry.id == entry_id)
            .cloned()
    }

    pub fn node_statuses(&self) -> NodeStatusMap {
        self.read().statuses.clone()
    }

    pub fn node_status(&self, entry_id: EntryId) -> Option<NodeStatus> {
        self.read().statuses.get(&entry_id).cloned()
    }

    /// 条目的有效节点状态（缺失时为 `UP`）。
    pub fn node_state(&self, entry_id: EntryId) -> NodeState {
        effective_state(&self.read().statuses, entry_id)
    }

    pub fn alerts(&self) -> Vec<SecurityAlert> {
        self.read().alerts.clone()
    }

    pub fn alert(&self, alert_id: i64) -> Option<SecurityAlert> {
        self.read()
            .alerts
            .iter()
            .find(|alert| alert.id == alert_id)
            .cloned()
    }

    pub fn alert_stats(&self) -> AlertStats {
        self.read().alert_stats
    }

    pub fn resources(&self) -> ResourceSnapshot {
        self.read().resources
    }

    pub fn audit_logs(&self) -> Vec<AuditLogEntry> {
        self.read().audit_logs.clone()
    }

    pub fn org(&self) -> OrgDirectory {
        self.read().org.clone()
    }

    pub fn last_sync(&self) -> Option<DateTime<Local>> {
        self.read().last_sync
    }

    pub fn roster_stats(&self) -> RosterStats {
        let state = self.read();
        let mut stats = RosterStats {
            total: state.roster.len(),
            ..RosterStats::default()
        };
        let mut facilities: HashSet<&str> = HashSet::new();
        for entry in &state.roster {
            match entry.role {
                Role::User => stats.users += 1,
                Role::Admin => stats.admins += 1,
                Role::Developer => stats.developers += 1,
                Role::Unknown(_) => stats.unknown_roles += 1,
            }
            facilities.insert(entry.facility.as_str());
        }
        stats.facilities = facilities.len();
        stats
    }

    /// 切换单个条目的勾选。名册中不存在的 id 被忽略，返回切换后是否选中。
    pub fn toggle(&self, entry_id: EntryId) -> bool {
        let mut state = self.write();
        if let Some(position) = state.selection.iter().position(|id| *id == entry_id) {
            state.selection.remove(position);
            return false;
        }
        if state.roster.iter().any(|entry| entry.id == entry_id) {
            state.selection.push(entry_id);
            return true;
        }
        false
    }

    /// 全选 ↔ 全不选：以选择集大小是否等于名册大小为准。
    pub fn toggle_all(&self) {
        let mut state = self.write();
        if state.selection.len() == state.roster.len() {
            state.selection.clear();
        } else {
            state.selection = state.roster.iter().map(|entry| entry.id).collect();
        }
    }

    pub fn clear_selection(&self) {
        self.write().selection.clear();
    }

    pub fn selection(&self) -> Vec<EntryId> {
        self.read().selection.clone()
    }

    pub fn is_selected(&self, entry_id: EntryId) -> bool {
        self.read().selection.contains(&entry_id)
    }
}
