//! 命令流水线实现。

use crate::credential::CredentialPanel;
use crate::csv::parse_registration_csv;
use crate::error::CommandError;
use crate::inflight::{CommandFamily, InFlight, InFlightGuard};
use crate::notifier::OperatorNotifier;
use crate::restore::RestoreChecklist;
use chrono::{Local, NaiveDate};
use domain::{
    AlertStatus, BulkOutcome, EntryId, EntryUpdate, FleetEntry, OperatorContext,
    RegistrationRequest, TemporaryCredential,
};
use fleet_eventlog::EventLog;
use fleet_gateway::{GatewayError, RemoteGateway};
use fleet_poller::Poller;
use fleet_snapshot::SnapshotStore;
use fleet_telemetry::{
    record_command_failure, record_command_issued, record_command_rejected, record_command_success,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, warn};

/// 合规导出文件名：`compliance_report_<YYYY-MM-DD>.csv`。
pub fn compliance_report_file_name(date: NaiveDate) -> String {
    format!("compliance_report_{}.csv", date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub export_dir: PathBuf,
    pub copy_indicator: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("."),
            copy_indicator: Duration::from_secs(2),
        }
    }
}

/// CSV 导入结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// 直接注册完成。
    Registered { count: usize },
    /// 存在可恢复条目，已打开恢复清单等待确认。
    AwaitingRestore { restorable: usize },
}

#[derive(Debug)]
struct PendingImport {
    rows: Vec<RegistrationRequest>,
    checklist: RestoreChecklist,
}

#[derive(Debug, Default)]
struct PipelineState {
    delete_confirmation_open: bool,
    pending_import: Option<PendingImport>,
}

#[derive(Debug, Default)]
struct Flags {
    delete: InFlight,
    reset: InFlight,
    save: InFlight,
    register: InFlight,
    restore: InFlight,
    credential: InFlight,
    alert: InFlight,
    export: InFlight,
}

/// 命令流水线（确认 + 远端调用 + 事件 + 刷新）。
pub struct CommandPipeline {
    gateway: Arc<dyn RemoteGateway>,
    poller: Poller,
    notifier: Arc<dyn OperatorNotifier>,
    config: PipelineConfig,
    credentials: CredentialPanel,
    flags: Flags,
    state: Mutex<PipelineState>,
}

impl CommandPipeline {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        poller: Poller,
        notifier: Arc<dyn OperatorNotifier>,
        config: PipelineConfig,
    ) -> Self {
        let credentials = CredentialPanel::new(config.copy_indicator);
        Self {
            gateway,
            poller,
            notifier,
            config,
            credentials,
            flags: Flags::default(),
            state: Mutex::new(PipelineState::default()),
        }
    }

    fn store(&self) -> &SnapshotStore {
        self.poller.store()
    }

    fn events(&self) -> &EventLog {
        self.poller.events()
    }

    fn state(&self) -> MutexGuard<'_, PipelineState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn flag(&self, family: CommandFamily) -> &InFlight {
        match family {
            CommandFamily::Delete => &self.flags.delete,
            CommandFamily::Reset => &self.flags.reset,
            CommandFamily::Save => &self.flags.save,
            CommandFamily::Register => &self.flags.register,
            CommandFamily::Restore => &self.flags.restore,
            CommandFamily::Credential => &self.flags.credential,
            CommandFamily::Alert => &self.flags.alert,
            CommandFamily::Export => &self.flags.export,
        }
    }

    pub fn is_in_flight(&self, family: CommandFamily) -> bool {
        self.flag(family).is_busy()
    }

    pub fn credential_panel(&self) -> &CredentialPanel {
        &self.credentials
    }

    fn reject(&self, family: CommandFamily, reason: &'static str) -> CommandError {
        record_command_rejected();
        info!(
            target: "fleet.control",
            command = family.as_str(),
            reason = reason,
            "command_rejected"
        );
        CommandError::Precondition(reason)
    }

    fn begin(&self, family: CommandFamily) -> Result<InFlightGuard<'_>, CommandError> {
        self.flag(family)
            .try_begin()
            .ok_or_else(|| self.reject(family, "already in flight"))
    }

    fn issued(&self, family: CommandFamily, ctx: &OperatorContext, count: usize) {
        record_command_issued();
        info!(
            target: "fleet.control",
            command = family.as_str(),
            operator_id = ctx.operator_id,
            count = count,
            "command_issued"
        );
    }

    fn succeeded(&self, family: CommandFamily, message: String) {
        record_command_success();
        info!(target: "fleet.control", command = family.as_str(), "command_succeeded");
        self.events().success(message);
    }

    /// 失败：错误事件，必要时附加阻塞提示。
    fn failed(&self, family: CommandFamily, event: String, blocking: Option<String>) {
        record_command_failure();
        warn!(
            target: "fleet.control",
            command = family.as_str(),
            message = %event,
            "command_failed"
        );
        self.events().error(event);
        if let Some(message) = blocking {
            self.notifier.alert(&message);
        }
    }

    // ------------------------------------------------------------------
    // 批量删除（确认弹窗门控）
    // ------------------------------------------------------------------

    /// 打开删除确认；选择集为空时不可打开。
    pub fn open_delete_confirmation(&self) -> Result<usize, CommandError> {
        let count = self.store().selection().len();
        if count == 0 {
            return Err(self.reject(CommandFamily::Delete, "selection is empty"));
        }
        self.state().delete_confirmation_open = true;
        Ok(count)
    }

    pub fn cancel_delete_confirmation(&self) {
        self.state().delete_confirmation_open = false;
    }

    pub fn is_delete_confirmation_open(&self) -> bool {
        self.state().delete_confirmation_open
    }

    /// 确认按钮是否可用。
    pub fn can_confirm_bulk_delete(&self) -> bool {
        self.is_delete_confirmation_open()
            && !self.store().selection().is_empty()
            && !self.is_in_flight(CommandFamily::Delete)
    }

    /// 执行批量删除。成功时清空选择、关闭确认并全量刷新；失败时确认保持打开以便重试。
    pub async fn confirm_bulk_delete(&self, ctx: &OperatorContext) -> Result<usize, CommandError> {
        let family = CommandFamily::Delete;
        if !self.is_delete_confirmation_open() {
            return Err(self.reject(family, "not confirmed"));
        }
        let ids = self.store().selection();
        if ids.is_empty() {
            return Err(self.reject(family, "selection is empty"));
        }
        let _guard = self.begin(family)?;
        self.issued(family, ctx, ids.len());
        self.events()
            .info(format!("Attempting to delete {} entries...", ids.len()));

        match self.gateway.bulk_delete(ctx, &ids).await {
            Ok(outcome) if outcome.success => {
                self.store().clear_selection();
                self.state().delete_confirmation_open = false;
                self.succeeded(
                    family,
                    format!("Successfully deleted {} entries", ids.len()),
                );
                self.poller.refresh_all(ctx).await;
                Ok(ids.len())
            }
            Ok(outcome) => {
                let message = outcome
                    .message
                    .unwrap_or_else(|| "Bulk delete failed".to_string());
                self.failed(
                    family,
                    message.clone(),
                    Some(format!("Delete failed: {}", message)),
                );
                Err(CommandError::Rejected(message))
            }
            Err(err) => {
                self.failed(
                    family,
                    err.message().to_string(),
                    Some(format!("Delete error: {}", err.message())),
                );
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // 批量重置进度（阻塞确认）
    // ------------------------------------------------------------------

    pub async fn bulk_reset_progress(&self, ctx: &OperatorContext) -> Result<usize, CommandError> {
        let family = CommandFamily::Reset;
        let ids = self.store().selection();
        if ids.is_empty() {
            return Err(self.reject(family, "selection is empty"));
        }
        let _guard = self.begin(family)?;
        let prompt = format!("Reset progress for {} selected entries?", ids.len());
        if !self.notifier.confirm(&prompt).await {
            return Err(self.reject(family, "not confirmed"));
        }
        self.issued(family, ctx, ids.len());
        self.events()
            .info(format!("Resetting progress for {} entries...", ids.len()));

        match self.gateway.bulk_reset_progress(ctx, &ids).await {
            Ok(()) => {
                self.store().clear_selection();
                self.succeeded(family, "Bulk reset successful".to_string());
                self.poller.refresh_all(ctx).await;
                Ok(ids.len())
            }
            Err(err) => {
                self.failed(
                    family,
                    format!("Bulk reset failed: {}", err.message()),
                    None,
                );
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // 单条保存
    // ------------------------------------------------------------------

    /// 提交单条部分更新。失败时给出阻塞提示，调用方保留草稿。
    pub async fn save_entry(
        &self,
        ctx: &OperatorContext,
        entry_id: EntryId,
        update: &EntryUpdate,
    ) -> Result<(), CommandError> {
        let family = CommandFamily::Save;
        let _guard = self.begin(family)?;
        self.issued(family, ctx, 1);
        self.events().info(format!("Updating entry {}...", entry_id));

        match self.gateway.update_entry(ctx, entry_id, update).await {
            Ok(()) => {
                self.succeeded(family, format!("Entry {} updated", entry_id));
                self.poller.refresh_all(ctx).await;
                Ok(())
            }
            Err(err) => {
                self.failed(
                    family,
                    format!("Failed to update entry {}: {}", entry_id, err.message()),
                    Some(format!("Update failed: {}", err.message())),
                );
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // CSV 批量注册 + 恢复
    // ------------------------------------------------------------------

    /// 解析并校验 CSV；存在可恢复条目时打开恢复清单，否则直接注册。
    pub async fn import_csv(
        &self,
        ctx: &OperatorContext,
        text: &str,
    ) -> Result<ImportOutcome, CommandError> {
        let family = CommandFamily::Register;
        if self.state().pending_import.is_some() {
            return Err(self.reject(family, "restore confirmation pending"));
        }
        let _guard = self.begin(family)?;
        let rows = match parse_registration_csv(text) {
            Ok(rows) => rows,
            Err(err) => {
                record_command_rejected();
                self.events().error(format!("CSV Error: {}", err));
                return Err(err.into());
            }
        };
        self.issued(family, ctx, rows.len());
        self.events()
            .info(format!("Validating {} entries...", rows.len()));

        let validation = match self.gateway.validate_bulk_csv(ctx, &rows).await {
            Ok(validation) => validation,
            Err(err) => {
                self.failed(
                    family,
                    format!("CSV Error: {}", err.message()),
                    Some(err.message().to_string()),
                );
                return Err(err.into());
            }
        };
        if !validation.errors.is_empty() {
            let detail = validation.errors.join("\n");
            self.failed(
                family,
                "CSV validation failed".to_string(),
                Some(detail.clone()),
            );
            return Err(CommandError::Rejected(detail));
        }
        if !validation.restorable.is_empty() {
            let restorable = validation.restorable.len();
            self.state().pending_import = Some(PendingImport {
                rows,
                checklist: RestoreChecklist::new(validation.restorable),
            });
            self.events().info(format!(
                "Found {} restorable entries. Waiting for confirmation...",
                restorable
            ));
            return Ok(ImportOutcome::AwaitingRestore { restorable });
        }

        let count = rows.len();
        match self.gateway.bulk_register(ctx, &rows, &[]).await {
            Ok(outcome) if outcome.success => {
                self.succeeded(family, "Bulk registration successful".to_string());
                self.poller.refresh_all(ctx).await;
                Ok(ImportOutcome::Registered { count })
            }
            Ok(outcome) => Err(self.register_rejected(outcome)),
            Err(err) => {
                self.failed(
                    family,
                    format!("Bulk registration failed: {}", err.message()),
                    Some(err.message().to_string()),
                );
                Err(err.into())
            }
        }
    }

    fn register_rejected(&self, outcome: BulkOutcome) -> CommandError {
        let message = outcome
            .message
            .unwrap_or_else(|| "Bulk registration failed".to_string());
        self.failed(
            CommandFamily::Register,
            "Bulk registration failed".to_string(),
            Some(message.clone()),
        );
        CommandError::Rejected(message)
    }

    /// 当前的恢复清单（没有待确认导入时为 `None`）。
    pub fn restore_checklist(&self) -> Option<RestoreChecklist> {
        self.state()
            .pending_import
            .as_ref()
            .map(|pending| pending.checklist.clone())
    }

    pub fn toggle_restore_row(&self, employee_id: &str) -> bool {
        self.state()
            .pending_import
            .as_mut()
            .map(|pending| pending.checklist.toggle(employee_id))
            .unwrap_or(false)
    }

    pub fn toggle_all_restore_rows(&self) {
        if let Some(pending) = self.state().pending_import.as_mut() {
            pending.checklist.toggle_all();
        }
    }

    /// 以勾选的职员番号执行注册 + 恢复。没有勾选时不可确认；失败时清单保留。
    pub async fn confirm_restore(&self, ctx: &OperatorContext) -> Result<usize, CommandError> {
        let family = CommandFamily::Register;
        let pending = {
            let state = self.state();
            state
                .pending_import
                .as_ref()
                .map(|pending| (pending.rows.clone(), pending.checklist.checked().to_vec()))
        };
        let Some((rows, restore_ids)) = pending else {
            return Err(self.reject(family, "no pending import"));
        };
        if restore_ids.is_empty() {
            return Err(self.reject(family, "nothing to restore"));
        }
        let _guard = self.begin(family)?;
        self.issued(family, ctx, rows.len());

        match self.gateway.bulk_register(ctx, &rows, &restore_ids).await {
            Ok(outcome) if outcome.success => {
                self.state().pending_import = None;
                self.succeeded(
                    family,
                    format!(
                        "Bulk process completed: {} entries (restored: {})",
                        rows.len(),
                        restore_ids.len()
                    ),
                );
                self.poller.refresh_all(ctx).await;
                Ok(rows.len())
            }
            Ok(outcome) => Err(self.register_rejected(outcome)),
            Err(err) => {
                self.failed(
                    family,
                    format!("Bulk registration failed: {}", err.message()),
                    Some(err.message().to_string()),
                );
                Err(err.into())
            }
        }
    }

    /// 放弃待确认的导入。
    pub fn cancel_restore(&self) {
        if self.state().pending_import.take().is_some() {
            self.events().info("Restore cancelled");
        }
    }

    // ------------------------------------------------------------------
    // 归档视图：单条恢复
    // ------------------------------------------------------------------

    /// 已软删除的条目。
    pub async fn archived_entries(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<FleetEntry>, CommandError> {
        let entries = self.gateway.list_fleet_including_deleted(ctx).await?;
        Ok(entries.into_iter().filter(FleetEntry::is_deleted).collect())
    }

    pub async fn restore_entry(
        &self,
        ctx: &OperatorContext,
        entry_id: EntryId,
    ) -> Result<(), CommandError> {
        let family = CommandFamily::Restore;
        let _guard = self.begin(family)?;
        if !self
            .notifier
            .confirm(&format!("Restore entry {}?", entry_id))
            .await
        {
            return Err(self.reject(family, "not confirmed"));
        }
        self.issued(family, ctx, 1);

        match self.gateway.restore_entry(ctx, entry_id).await {
            Ok(()) => {
                self.succeeded(family, format!("Entry {} restored", entry_id));
                self.poller.refresh_all(ctx).await;
                Ok(())
            }
            Err(err) => {
                self.failed(
                    family,
                    format!("Failed to restore entry {}: {}", entry_id, err.message()),
                    Some(format!("Restore failed: {}", err.message())),
                );
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // 临时凭据
    // ------------------------------------------------------------------

    /// 签发一次性凭据并覆盖面板上的旧值。
    pub async fn issue_credential(
        &self,
        ctx: &OperatorContext,
        entry_id: EntryId,
    ) -> Result<TemporaryCredential, CommandError> {
        let family = CommandFamily::Credential;
        let _guard = self.begin(family)?;
        self.issued(family, ctx, 1);

        match self.gateway.issue_temporary_credential(ctx, entry_id).await {
            Ok(credential) => {
                self.credentials.show(entry_id, credential.clone());
                self.succeeded(
                    family,
                    format!("Issued temporary password for entry {}", entry_id),
                );
                Ok(credential)
            }
            Err(err) => {
                self.failed(
                    family,
                    format!(
                        "Failed to issue temporary password for entry {}: {}",
                        entry_id,
                        err.message()
                    ),
                    Some(format!("Issue failed: {}", err.message())),
                );
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // 安全告警处置
    // ------------------------------------------------------------------

    pub async fn acknowledge_alert(
        &self,
        ctx: &OperatorContext,
        alert_id: i64,
    ) -> Result<(), CommandError> {
        self.advance_alert(ctx, alert_id, AlertStatus::Acknowledged)
            .await
    }

    pub async fn resolve_alert(
        &self,
        ctx: &OperatorContext,
        alert_id: i64,
    ) -> Result<(), CommandError> {
        self.advance_alert(ctx, alert_id, AlertStatus::Resolved).await
    }

    async fn advance_alert(
        &self,
        ctx: &OperatorContext,
        alert_id: i64,
        next: AlertStatus,
    ) -> Result<(), CommandError> {
        let family = CommandFamily::Alert;
        let Some(alert) = self.store().alert(alert_id) else {
            return Err(self.reject(family, "unknown alert"));
        };
        if !alert.status.can_advance_to(&next) {
            record_command_rejected();
            info!(
                target: "fleet.control",
                alert_id = alert_id,
                from = alert.status.as_str(),
                to = next.as_str(),
                "alert_transition_rejected"
            );
            return Err(CommandError::InvalidTransition {
                from: alert.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        let _guard = self.begin(family)?;
        self.issued(family, ctx, 1);

        let result: Result<(), GatewayError> = match next {
            AlertStatus::Acknowledged => self.gateway.acknowledge_alert(ctx, alert_id).await,
            _ => self.gateway.resolve_alert(ctx, alert_id).await,
        };
        match result {
            Ok(()) => {
                self.succeeded(
                    family,
                    format!(
                        "Alert {} {}",
                        alert_id,
                        next.as_str().to_ascii_lowercase()
                    ),
                );
                let _ = self.poller.refresh_alerts(ctx).await;
                Ok(())
            }
            Err(err) => {
                self.failed(
                    family,
                    format!("Failed to update alert {}: {}", alert_id, err.message()),
                    Some(format!("Alert update failed: {}", err.message())),
                );
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // 合规报表导出
    // ------------------------------------------------------------------

    pub async fn compliance_facilities(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<String>, CommandError> {
        match self.gateway.list_compliance_facilities(ctx).await {
            Ok(facilities) => Ok(facilities),
            Err(err) => {
                self.events().error(format!(
                    "Failed to fetch compliance facilities: {}",
                    err.message()
                ));
                Err(err.into())
            }
        }
    }

    /// 下载合规报表 CSV 并写入导出目录。`facility` 为 `"all"` 或空串时不按施设过滤。
    pub async fn export_compliance_csv(
        &self,
        ctx: &OperatorContext,
        facility: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<PathBuf, CommandError> {
        let family = CommandFamily::Export;
        let _guard = self.begin(family)?;
        let facility = match facility.trim() {
            "" | "all" => None,
            name => Some(name),
        };
        self.issued(family, ctx, 1);

        let bytes = match self
            .gateway
            .export_compliance_csv(ctx, facility, start_date, end_date)
            .await
        {
            Ok(bytes) => bytes,
            Err(err) => {
                self.failed(
                    family,
                    format!("Compliance export failed: {}", err.message()),
                    Some(format!("Export failed: {}", err.message())),
                );
                return Err(err.into());
            }
        };

        let path = self
            .config
            .export_dir
            .join(compliance_report_file_name(Local::now().date_naive()));
        let written = async {
            tokio::fs::create_dir_all(&self.config.export_dir).await?;
            tokio::fs::write(&path, &bytes).await
        }
        .await;
        if let Err(err) = written {
            let message = format!("{}: {}", path.display(), err);
            self.failed(
                family,
                format!("Compliance export failed: {}", message),
                Some(format!("Export failed: {}", message)),
            );
            return Err(CommandError::Export(message));
        }
        self.succeeded(
            family,
            format!("Compliance report saved to {}", path.display()),
        );
        Ok(path)
    }
}
