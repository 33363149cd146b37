//! 网关内存实现
//!
//! 仅用于本地测试和演示。支持：
//! - 按操作注入一次性失败（`fail_next`）
//! - 按操作注入延迟（`set_delay`）
//! - 脚本化的批量删除结果与节点状态响应
//! - 调用计数与最近一次请求参数检查

use crate::error::GatewayError;
use crate::traits::RemoteGateway;
use async_trait::async_trait;
use domain::{
    AlertSeverity, AlertStats, AlertStatus, AuditLogEntry, BulkOutcome, CsvValidation, Department,
    EntryId, EntryUpdate, Facility, FleetEntry, NodeStatus, OperatorContext, OrgDirectory,
    RegistrationRequest, ResourcePatch, Role, SecurityAlert, TemporaryCredential,
};
use rand_core::{OsRng, RngCore};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const TEMP_PASSWORD_LEN: usize = 12;
const TEMP_PASSWORD_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";

/// 网关操作标识（用于注入失败、延迟与调用计数）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListFleet,
    ListFleetIncludingDeleted,
    ListNodeStatuses,
    GetDiagnostics,
    GetSystemResources,
    ListSecurityAlerts,
    GetSecurityAlertStats,
    AcknowledgeAlert,
    ResolveAlert,
    ListAuditLogs,
    ListFacilities,
    ListDepartments,
    UpdateEntry,
    BulkDelete,
    BulkResetProgress,
    RestoreEntry,
    ValidateBulkCsv,
    BulkRegister,
    IssueTemporaryCredential,
    ListComplianceFacilities,
    ExportComplianceCsv,
}

/// 合规导出的最近一次查询参数。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportQuery {
    pub facility: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Default)]
struct GatewayState {
    entries: Vec<FleetEntry>,
    statuses: Vec<NodeStatus>,
    scripted_statuses: VecDeque<(Vec<NodeStatus>, Duration)>,
    alerts: Vec<SecurityAlert>,
    alert_stats: Option<AlertStats>,
    diagnostics: ResourcePatch,
    system_resources: ResourcePatch,
    audit_logs: Vec<AuditLogEntry>,
    org: OrgDirectory,
    compliance_csv: Vec<u8>,
    failures: HashMap<Operation, VecDeque<GatewayError>>,
    bulk_delete_outcomes: VecDeque<BulkOutcome>,
    delays: HashMap<Operation, Duration>,
    calls: HashMap<Operation, usize>,
    last_bulk_delete_ids: Option<Vec<EntryId>>,
    last_reset_ids: Option<Vec<EntryId>>,
    last_update: Option<(EntryId, EntryUpdate)>,
    last_register: Option<(Vec<RegistrationRequest>, Vec<String>)>,
    last_export: Option<ExportQuery>,
    issued_credentials: Vec<(EntryId, String)>,
}

/// 网关内存实现。
#[derive(Default)]
pub struct InMemoryGateway {
    state: Mutex<GatewayState>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定名册创建。
    pub fn with_entries(entries: Vec<FleetEntry>) -> Self {
        let gateway = Self::new();
        gateway.set_entries(entries);
        gateway
    }

    fn state(&self) -> MutexGuard<'_, GatewayState> {
        // 测试替身：锁中毒时沿用内部数据
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 记录调用、应用延迟，并返回注入的失败（若有）。
    async fn begin(&self, operation: Operation) -> Result<(), GatewayError> {
        let (failure, delay) = {
            let mut state = self.state();
            *state.calls.entry(operation).or_insert(0) += 1;
            let failure = state
                .failures
                .get_mut(&operation)
                .and_then(|queue| queue.pop_front());
            let delay = state.delays.get(&operation).copied();
            (failure, delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// 下一次 `operation` 调用返回 `err`（可多次排队）。
    pub fn fail_next(&self, operation: Operation, err: GatewayError) {
        self.state()
            .failures
            .entry(operation)
            .or_default()
            .push_back(err);
    }

    /// 每次 `operation` 调用前等待 `delay`。
    pub fn set_delay(&self, operation: Operation, delay: Duration) {
        self.state().delays.insert(operation, delay);
    }

    pub fn clear_delay(&self, operation: Operation) {
        self.state().delays.remove(&operation);
    }

    /// 排队一个批量删除结果；结果为成功时才执行软删除。
    pub fn push_bulk_delete_outcome(&self, outcome: BulkOutcome) {
        self.state().bulk_delete_outcomes.push_back(outcome);
    }

    /// 排队一次节点状态响应（含响应前延迟），用于乱序到达场景。
    pub fn script_statuses(&self, statuses: Vec<NodeStatus>, delay: Duration) {
        self.state().scripted_statuses.push_back((statuses, delay));
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.state().calls.get(&operation).copied().unwrap_or(0)
    }

    pub fn set_entries(&self, entries: Vec<FleetEntry>) {
        self.state().entries = entries;
    }

    pub fn set_statuses(&self, statuses: Vec<NodeStatus>) {
        self.state().statuses = statuses;
    }

    pub fn set_alerts(&self, alerts: Vec<SecurityAlert>) {
        self.state().alerts = alerts;
    }

    /// 固定告警统计；未设置时按当前告警列表计算。
    pub fn set_alert_stats(&self, stats: AlertStats) {
        self.state().alert_stats = Some(stats);
    }

    pub fn set_resources(&self, diagnostics: ResourcePatch, system_resources: ResourcePatch) {
        let mut state = self.state();
        state.diagnostics = diagnostics;
        state.system_resources = system_resources;
    }

    pub fn set_audit_logs(&self, logs: Vec<AuditLogEntry>) {
        self.state().audit_logs = logs;
    }

    pub fn set_org(&self, facilities: Vec<Facility>, departments: Vec<Department>) {
        self.state().org = OrgDirectory::new(facilities, departments);
    }

    pub fn set_compliance_csv(&self, bytes: Vec<u8>) {
        self.state().compliance_csv = bytes;
    }

    /// 全量名册（含软删除条目）。
    pub fn entries(&self) -> Vec<FleetEntry> {
        self.state().entries.clone()
    }

    pub fn alerts(&self) -> Vec<SecurityAlert> {
        self.state().alerts.clone()
    }

    pub fn last_bulk_delete_ids(&self) -> Option<Vec<EntryId>> {
        self.state().last_bulk_delete_ids.clone()
    }

    pub fn last_reset_ids(&self) -> Option<Vec<EntryId>> {
        self.state().last_reset_ids.clone()
    }

    pub fn last_update(&self) -> Option<(EntryId, EntryUpdate)> {
        self.state().last_update.clone()
    }

    pub fn last_register(&self) -> Option<(Vec<RegistrationRequest>, Vec<String>)> {
        self.state().last_register.clone()
    }

    pub fn last_export(&self) -> Option<ExportQuery> {
        self.state().last_export.clone()
    }

    pub fn issued_credentials(&self) -> Vec<(EntryId, String)> {
        self.state().issued_credentials.clone()
    }
}

fn not_found(entry_id: EntryId) -> GatewayError {
    GatewayError::Remote(format!("user not found: {}", entry_id))
}

fn computed_stats(alerts: &[SecurityAlert]) -> AlertStats {
    let open: Vec<&SecurityAlert> = alerts
        .iter()
        .filter(|alert| alert.status == AlertStatus::Open)
        .collect();
    AlertStats {
        total_open: open.len() as u64,
        critical_open: open
            .iter()
            .filter(|alert| alert.severity == AlertSeverity::Critical)
            .count() as u64,
        alerts_24h: alerts.len() as u64,
    }
}

fn generate_temp_password() -> String {
    let mut bytes = [0u8; TEMP_PASSWORD_LEN];
    OsRng.fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|byte| TEMP_PASSWORD_CHARSET[*byte as usize % TEMP_PASSWORD_CHARSET.len()] as char)
        .collect()
}

fn deleted_stamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn advance_alert(
    alerts: &mut [SecurityAlert],
    alert_id: i64,
    next: AlertStatus,
) -> Result<(), GatewayError> {
    let alert = alerts
        .iter_mut()
        .find(|alert| alert.id == alert_id)
        .ok_or_else(|| GatewayError::Remote(format!("alert not found: {}", alert_id)))?;
    if !alert.status.can_advance_to(&next) {
        return Err(GatewayError::Remote(format!(
            "cannot move alert {} from {} to {}",
            alert_id,
            alert.status.as_str(),
            next.as_str()
        )));
    }
    alert.status = next;
    Ok(())
}

#[async_trait]
impl RemoteGateway for InMemoryGateway {
    async fn list_fleet(&self, _ctx: &OperatorContext) -> Result<Vec<FleetEntry>, GatewayError> {
        self.begin(Operation::ListFleet).await?;
        let state = self.state();
        Ok(state
            .entries
            .iter()
            .filter(|entry| !entry.is_deleted())
            .cloned()
            .collect())
    }

    async fn list_fleet_including_deleted(
        &self,
        _ctx: &OperatorContext,
    ) -> Result<Vec<FleetEntry>, GatewayError> {
        self.begin(Operation::ListFleetIncludingDeleted).await?;
        Ok(self.state().entries.clone())
    }

    async fn list_node_statuses(&self) -> Result<Vec<NodeStatus>, GatewayError> {
        let scripted = self.state().scripted_statuses.pop_front();
        if let Some((statuses, delay)) = scripted {
            self.begin(Operation::ListNodeStatuses).await?;
            tokio::time::sleep(delay).await;
            return Ok(statuses);
        }
        self.begin(Operation::ListNodeStatuses).await?;
        Ok(self.state().statuses.clone())
    }

    async fn get_diagnostics(&self, _ctx: &OperatorContext) -> Result<ResourcePatch, GatewayError> {
        self.begin(Operation::GetDiagnostics).await?;
        Ok(self.state().diagnostics)
    }

    async fn get_system_resources(
        &self,
        _ctx: &OperatorContext,
    ) -> Result<ResourcePatch, GatewayError> {
        self.begin(Operation::GetSystemResources).await?;
        Ok(self.state().system_resources)
    }

    async fn list_security_alerts(
        &self,
        _ctx: &OperatorContext,
    ) -> Result<Vec<SecurityAlert>, GatewayError> {
        self.begin(Operation::ListSecurityAlerts).await?;
        Ok(self.state().alerts.clone())
    }

    async fn get_security_alert_stats(
        &self,
        _ctx: &OperatorContext,
    ) -> Result<AlertStats, GatewayError> {
        self.begin(Operation::GetSecurityAlertStats).await?;
        let state = self.state();
        Ok(state
            .alert_stats
            .unwrap_or_else(|| computed_stats(&state.alerts)))
    }

    async fn acknowledge_alert(
        &self,
        _ctx: &OperatorContext,
        alert_id: i64,
    ) -> Result<(), GatewayError> {
        self.begin(Operation::AcknowledgeAlert).await?;
        advance_alert(&mut self.state().alerts, alert_id, AlertStatus::Acknowledged)
    }

    async fn resolve_alert(
        &self,
        _ctx: &OperatorContext,
        alert_id: i64,
    ) -> Result<(), GatewayError> {
        self.begin(Operation::ResolveAlert).await?;
        advance_alert(&mut self.state().alerts, alert_id, AlertStatus::Resolved)
    }

    async fn list_audit_logs(
        &self,
        _ctx: &OperatorContext,
    ) -> Result<Vec<AuditLogEntry>, GatewayError> {
        self.begin(Operation::ListAuditLogs).await?;
        Ok(self.state().audit_logs.clone())
    }

    async fn list_facilities(&self, _ctx: &OperatorContext) -> Result<Vec<Facility>, GatewayError> {
        self.begin(Operation::ListFacilities).await?;
        Ok(self.state().org.facilities.clone())
    }

    async fn list_departments(
        &self,
        _ctx: &OperatorContext,
    ) -> Result<Vec<Department>, GatewayError> {
        self.begin(Operation::ListDepartments).await?;
        Ok(self.state().org.departments.clone())
    }

    async fn update_entry(
        &self,
        _ctx: &OperatorContext,
        entry_id: EntryId,
        update: &EntryUpdate,
    ) -> Result<(), GatewayError> {
        self.begin(Operation::UpdateEntry).await?;
        let mut state = self.state();
        state.last_update = Some((entry_id, update.clone()));
        if let Some(days) = update.paid_leave_days {
            if !days.is_finite() || days < 0.0 {
                return Err(GatewayError::Remote(
                    "paid leave days must not be negative".to_string(),
                ));
            }
        }
        if let Some(Role::Unknown(raw)) = &update.role {
            return Err(GatewayError::Remote(format!("unknown role: {}", raw)));
        }
        let entry = state
            .entries
            .iter_mut()
            .find(|entry| entry.id == entry_id && !entry.is_deleted())
            .ok_or_else(|| not_found(entry_id))?;
        if let Some(role) = &update.role {
            entry.role = role.clone();
        }
        if let Some(facility) = &update.facility {
            entry.facility = facility.clone();
        }
        if let Some(department) = &update.department {
            entry.department = department.clone();
        }
        if let Some(email) = &update.email {
            entry.email = Some(email.clone());
        }
        if let Some(days) = update.paid_leave_days {
            entry.paid_leave_days = days;
        }
        if let Some(joined_date) = &update.joined_date {
            entry.joined_date = Some(joined_date.clone());
        }
        Ok(())
    }

    async fn bulk_delete(
        &self,
        _ctx: &OperatorContext,
        ids: &[EntryId],
    ) -> Result<BulkOutcome, GatewayError> {
        self.begin(Operation::BulkDelete).await?;
        let mut state = self.state();
        state.last_bulk_delete_ids = Some(ids.to_vec());
        let outcome = state
            .bulk_delete_outcomes
            .pop_front()
            .unwrap_or_else(BulkOutcome::ok);
        if outcome.success {
            let stamp = deleted_stamp();
            for entry in state.entries.iter_mut() {
                if ids.contains(&entry.id) && !entry.is_deleted() {
                    entry.deleted_at = Some(stamp.clone());
                }
            }
        }
        Ok(outcome)
    }

    async fn bulk_reset_progress(
        &self,
        _ctx: &OperatorContext,
        ids: &[EntryId],
    ) -> Result<(), GatewayError> {
        self.begin(Operation::BulkResetProgress).await?;
        self.state().last_reset_ids = Some(ids.to_vec());
        Ok(())
    }

    async fn restore_entry(
        &self,
        _ctx: &OperatorContext,
        entry_id: EntryId,
    ) -> Result<(), GatewayError> {
        self.begin(Operation::RestoreEntry).await?;
        let mut state = self.state();
        let entry = state
            .entries
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| not_found(entry_id))?;
        if !entry.is_deleted() {
            return Err(GatewayError::Remote(format!(
                "user is not deleted: {}",
                entry_id
            )));
        }
        entry.deleted_at = None;
        Ok(())
    }

    async fn validate_bulk_csv(
        &self,
        _ctx: &OperatorContext,
        rows: &[RegistrationRequest],
    ) -> Result<CsvValidation, GatewayError> {
        self.begin(Operation::ValidateBulkCsv).await?;
        let state = self.state();
        let mut errors = Vec::new();
        let mut restorable = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for (index, row) in rows.iter().enumerate() {
            let line = index + 1;
            if !seen.insert(row.employee_id.as_str()) {
                errors.push(format!(
                    "row {}: duplicate employee id {}",
                    line, row.employee_id
                ));
                continue;
            }
            if let Role::Unknown(raw) = &row.role {
                errors.push(format!("row {}: unknown role {}", line, raw));
            }
            let existing = state
                .entries
                .iter()
                .find(|entry| entry.employee_id == row.employee_id);
            match existing {
                Some(entry) if entry.is_deleted() => restorable.push(entry.clone()),
                Some(_) => errors.push(format!(
                    "row {}: employee id {} already exists",
                    line, row.employee_id
                )),
                None => {}
            }
        }
        Ok(CsvValidation {
            is_valid: errors.is_empty(),
            errors,
            restorable,
        })
    }

    async fn bulk_register(
        &self,
        _ctx: &OperatorContext,
        rows: &[RegistrationRequest],
        restore_ids: &[String],
    ) -> Result<BulkOutcome, GatewayError> {
        self.begin(Operation::BulkRegister).await?;
        let mut state = self.state();
        state.last_register = Some((rows.to_vec(), restore_ids.to_vec()));
        let mut next_id = state.entries.iter().map(|entry| entry.id).max().unwrap_or(0) + 1;
        let mut created = 0usize;
        let mut restored = 0usize;
        for row in rows {
            let existing = state
                .entries
                .iter_mut()
                .find(|entry| entry.employee_id == row.employee_id);
            match existing {
                Some(entry) if entry.is_deleted() => {
                    if restore_ids.contains(&row.employee_id) {
                        entry.deleted_at = None;
                        entry.name = row.name.clone();
                        entry.facility = row.facility.clone();
                        entry.department = row.department.clone();
                        entry.role = row.role.clone();
                        restored += 1;
                    }
                }
                Some(_) => {
                    return Ok(BulkOutcome::failed(format!(
                        "employee id {} already exists",
                        row.employee_id
                    )));
                }
                None => {
                    state.entries.push(FleetEntry {
                        id: next_id,
                        employee_id: row.employee_id.clone(),
                        name: row.name.clone(),
                        facility: row.facility.clone(),
                        department: row.department.clone(),
                        email: row.email.clone(),
                        role: row.role.clone(),
                        joined_date: row.joined_date.clone(),
                        paid_leave_days: row.paid_leave_days.unwrap_or(0.0),
                        deleted_at: None,
                    });
                    next_id += 1;
                    created += 1;
                }
            }
        }
        Ok(BulkOutcome {
            success: true,
            message: Some(format!("registered {}, restored {}", created, restored)),
        })
    }

    async fn issue_temporary_credential(
        &self,
        _ctx: &OperatorContext,
        entry_id: EntryId,
    ) -> Result<TemporaryCredential, GatewayError> {
        self.begin(Operation::IssueTemporaryCredential).await?;
        let mut state = self.state();
        if !state
            .entries
            .iter()
            .any(|entry| entry.id == entry_id && !entry.is_deleted())
        {
            return Err(not_found(entry_id));
        }
        let temp_password = generate_temp_password();
        state
            .issued_credentials
            .push((entry_id, temp_password.clone()));
        Ok(TemporaryCredential { temp_password })
    }

    async fn list_compliance_facilities(
        &self,
        _ctx: &OperatorContext,
    ) -> Result<Vec<String>, GatewayError> {
        self.begin(Operation::ListComplianceFacilities).await?;
        Ok(self.state().org.facility_names())
    }

    async fn export_compliance_csv(
        &self,
        _ctx: &OperatorContext,
        facility: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<u8>, GatewayError> {
        self.begin(Operation::ExportComplianceCsv).await?;
        let mut state = self.state();
        state.last_export = Some(ExportQuery {
            facility: facility.map(str::to_string),
            start_date: start_date.map(str::to_string),
            end_date: end_date.map(str::to_string),
        });
        Ok(state.compliance_csv.clone())
    }
}
