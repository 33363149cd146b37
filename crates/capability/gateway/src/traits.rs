//! 远端网关接口 Trait 定义
//!
//! 设计原则：
//! - 所有需要身份的接口显式接收 OperatorContext
//! - 所有接口返回 GatewayError
//! - 使用 async_trait 支持动态分发（`Arc<dyn RemoteGateway>`）

use crate::error::GatewayError;
use async_trait::async_trait;
use domain::{
    AlertStats, AuditLogEntry, BulkOutcome, CsvValidation, Department, EntryId, EntryUpdate,
    Facility, FleetEntry, NodeStatus, OperatorContext, RegistrationRequest, ResourcePatch,
    SecurityAlert, TemporaryCredential,
};

#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// 在籍名册（不含软删除条目）。
    async fn list_fleet(&self, ctx: &OperatorContext) -> Result<Vec<FleetEntry>, GatewayError>;

    /// 含软删除条目的全量名册（归档视图）。
    async fn list_fleet_including_deleted(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<FleetEntry>, GatewayError>;

    async fn list_node_statuses(&self) -> Result<Vec<NodeStatus>, GatewayError>;

    /// 诊断探针（运行时长、内存、DB 延迟）。
    async fn get_diagnostics(&self, ctx: &OperatorContext) -> Result<ResourcePatch, GatewayError>;

    /// 系统资源探针（内存、磁盘）。
    async fn get_system_resources(
        &self,
        ctx: &OperatorContext,
    ) -> Result<ResourcePatch, GatewayError>;

    async fn list_security_alerts(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<SecurityAlert>, GatewayError>;

    async fn get_security_alert_stats(
        &self,
        ctx: &OperatorContext,
    ) -> Result<AlertStats, GatewayError>;

    async fn acknowledge_alert(
        &self,
        ctx: &OperatorContext,
        alert_id: i64,
    ) -> Result<(), GatewayError>;

    async fn resolve_alert(&self, ctx: &OperatorContext, alert_id: i64)
    -> Result<(), GatewayError>;

    async fn list_audit_logs(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<AuditLogEntry>, GatewayError>;

    async fn list_facilities(&self, ctx: &OperatorContext) -> Result<Vec<Facility>, GatewayError>;

    async fn list_departments(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<Department>, GatewayError>;

    /// 部分更新条目；属性非法时返回 `Remote`。
    async fn update_entry(
        &self,
        ctx: &OperatorContext,
        entry_id: EntryId,
        update: &EntryUpdate,
    ) -> Result<(), GatewayError>;

    /// 批量软删除。传输成功不代表删除成功，需检查 `success`。
    async fn bulk_delete(
        &self,
        ctx: &OperatorContext,
        ids: &[EntryId],
    ) -> Result<BulkOutcome, GatewayError>;

    async fn bulk_reset_progress(
        &self,
        ctx: &OperatorContext,
        ids: &[EntryId],
    ) -> Result<(), GatewayError>;

    /// 恢复单个软删除条目。
    async fn restore_entry(
        &self,
        ctx: &OperatorContext,
        entry_id: EntryId,
    ) -> Result<(), GatewayError>;

    async fn validate_bulk_csv(
        &self,
        ctx: &OperatorContext,
        rows: &[RegistrationRequest],
    ) -> Result<CsvValidation, GatewayError>;

    /// 批量注册；`restore_ids` 中的职员番号按恢复处理。
    async fn bulk_register(
        &self,
        ctx: &OperatorContext,
        rows: &[RegistrationRequest],
        restore_ids: &[String],
    ) -> Result<BulkOutcome, GatewayError>;

    /// 每次调用都签发新的一次性凭据。
    async fn issue_temporary_credential(
        &self,
        ctx: &OperatorContext,
        entry_id: EntryId,
    ) -> Result<TemporaryCredential, GatewayError>;

    async fn list_compliance_facilities(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<String>, GatewayError>;

    /// 合规报表 CSV 原始字节。`facility` 为 `None` 表示不过滤施设。
    async fn export_compliance_csv(
        &self,
        ctx: &OperatorContext,
        facility: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<u8>, GatewayError>;
}
