//! 远端管理 API 的 DTO 契约（camelCase JSON）及其到领域类型的转换。
//!
//! 反序列化尽量宽容：缺失字段取默认值，未知枚举值落入 `Unknown` 兜底变体。

use domain::{
    AlertKind, AlertSeverity, AlertStats, AlertStatus, AuditLogEntry, BulkOutcome, CsvValidation,
    Department, EntryUpdate, Facility, FleetEntry, HealthMetrics, NodeState, NodeStatus,
    RegistrationRequest, ResourcePatch, Role, SecurityAlert, TemporaryCredential,
};
use serde::{Deserialize, Serialize};

/// 远端失败响应体（非 2xx 时尽力解析）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

/// 名册条目返回结构。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetEntryDto {
    pub id: i64,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub facility: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub joined_date: Option<String>,
    #[serde(default)]
    pub paid_leave_days: Option<f64>,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

impl From<FleetEntryDto> for FleetEntry {
    fn from(dto: FleetEntryDto) -> Self {
        FleetEntry {
            id: dto.id,
            employee_id: dto.employee_id,
            name: dto.name,
            facility: dto.facility,
            department: dto.department,
            email: dto.email,
            role: Role::parse(&dto.role),
            joined_date: dto.joined_date,
            paid_leave_days: dto.paid_leave_days.unwrap_or(0.0).max(0.0),
            deleted_at: dto.deleted_at,
        }
    }
}

impl From<&FleetEntry> for FleetEntryDto {
    fn from(entry: &FleetEntry) -> Self {
        FleetEntryDto {
            id: entry.id,
            employee_id: entry.employee_id.clone(),
            name: entry.name.clone(),
            facility: entry.facility.clone(),
            department: entry.department.clone(),
            email: entry.email.clone(),
            role: entry.role.as_str().to_string(),
            joined_date: entry.joined_date.clone(),
            paid_leave_days: Some(entry.paid_leave_days),
            deleted_at: entry.deleted_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetricsDto {
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub facility: Option<String>,
    #[serde(default)]
    pub last_active_at: Option<i64>,
    #[serde(default)]
    pub warning_reason: Option<String>,
}

/// 节点状态返回结构。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusDto {
    pub user_id: i64,
    pub status: String,
    #[serde(default)]
    pub status_label: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub is_alert: Option<bool>,
    #[serde(default)]
    pub health_metrics: Option<HealthMetricsDto>,
}

impl From<NodeStatusDto> for NodeStatus {
    fn from(dto: NodeStatusDto) -> Self {
        let state = NodeState::parse(&dto.status);
        // 缺省时与服务端一致：非 UP 即告警
        let is_alert = dto.is_alert.unwrap_or(state != NodeState::Up);
        NodeStatus {
            entry_id: dto.user_id,
            state,
            status_label: dto.status_label,
            status_detail: dto.status_detail,
            is_alert,
            health_metrics: dto.health_metrics.map(|metrics| HealthMetrics {
                employee_id: metrics.employee_id,
                facility: metrics.facility,
                last_active_at_ms: metrics.last_active_at,
                warning_reason: metrics.warning_reason,
            }),
        }
    }
}

/// 安全告警返回结构。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlertDto {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub type_display_name: Option<String>,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub detected_at: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_employee_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

impl From<SecurityAlertDto> for SecurityAlert {
    fn from(dto: SecurityAlertDto) -> Self {
        SecurityAlert {
            id: dto.id,
            kind: AlertKind::parse(&dto.kind),
            kind_label: dto.type_display_name,
            severity: AlertSeverity::parse(&dto.severity),
            status: AlertStatus::parse(&dto.status),
            detected_at: dto.detected_at,
            user_id: dto.user_id,
            user_employee_id: dto.user_employee_id,
            user_name: dto.user_name,
            description: dto.description,
            ip_address: dto.ip_address,
        }
    }
}

/// 告警统计返回结构。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStatsDto {
    #[serde(default)]
    pub total_open: u64,
    #[serde(default)]
    pub critical_open: u64,
    #[serde(default, rename = "alerts24h")]
    pub alerts_24h: u64,
}

impl From<AlertStatsDto> for AlertStats {
    fn from(dto: AlertStatsDto) -> Self {
        AlertStats {
            total_open: dto.total_open,
            critical_open: dto.critical_open,
            alerts_24h: dto.alerts_24h,
        }
    }
}

/// 诊断探针 / 系统资源探针返回结构（两者字段不全相同）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesDto {
    #[serde(default)]
    pub uptime: Option<f64>,
    #[serde(default)]
    pub memory_used: Option<f64>,
    #[serde(default)]
    pub memory_max: Option<f64>,
    #[serde(default)]
    pub memory_total: Option<f64>,
    #[serde(default)]
    pub disk_used: Option<f64>,
    #[serde(default)]
    pub disk_total: Option<f64>,
    #[serde(default)]
    pub db_ping: Option<f64>,
}

fn non_negative(value: Option<f64>) -> Option<u64> {
    value.map(|value| if value.is_finite() && value > 0.0 { value as u64 } else { 0 })
}

impl From<ResourcesDto> for ResourcePatch {
    fn from(dto: ResourcesDto) -> Self {
        ResourcePatch {
            uptime_ms: non_negative(dto.uptime),
            memory_used: non_negative(dto.memory_used),
            memory_max: non_negative(dto.memory_max.or(dto.memory_total)),
            disk_used: non_negative(dto.disk_used),
            disk_total: non_negative(dto.disk_total),
            db_ping_ms: non_negative(dto.db_ping),
        }
    }
}

/// 审计日志返回结构。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogDto {
    pub id: i64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub performed_by: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

impl From<AuditLogDto> for AuditLogEntry {
    fn from(dto: AuditLogDto) -> Self {
        AuditLogEntry {
            id: dto.id,
            timestamp: dto.timestamp,
            action: dto.action,
            target: dto.target,
            description: dto.description,
            performed_by: dto.performed_by,
            ip_address: dto.ip_address,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityDto {
    pub id: i64,
    pub name: String,
}

impl From<FacilityDto> for Facility {
    fn from(dto: FacilityDto) -> Self {
        Facility {
            id: dto.id,
            name: dto.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDto {
    pub id: i64,
    pub name: String,
    pub facility_id: i64,
}

impl From<DepartmentDto> for Department {
    fn from(dto: DepartmentDto) -> Self {
        Department {
            id: dto.id,
            name: dto.name,
            facility_id: dto.facility_id,
        }
    }
}

/// 条目部分更新请求体（未设置字段不序列化）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_leave_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined_date: Option<String>,
}

impl From<&EntryUpdate> for UpdateEntryRequest {
    fn from(update: &EntryUpdate) -> Self {
        UpdateEntryRequest {
            role: update.role.as_ref().map(|role| role.as_str().to_string()),
            facility: update.facility.clone(),
            department: update.department.clone(),
            email: update.email.clone(),
            paid_leave_days: update.paid_leave_days,
            joined_date: update.joined_date.clone(),
        }
    }
}

/// 批量操作返回结构（`success` 缺失视为失败）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcomeDto {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<BulkOutcomeDto> for BulkOutcome {
    fn from(dto: BulkOutcomeDto) -> Self {
        BulkOutcome {
            success: dto.success,
            message: dto.message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempPasswordDto {
    pub temp_password: String,
}

impl From<TempPasswordDto> for TemporaryCredential {
    fn from(dto: TempPasswordDto) -> Self {
        TemporaryCredential {
            temp_password: dto.temp_password,
        }
    }
}

/// 注册请求体。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequestDto {
    pub employee_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub password: Option<String>,
    pub facility: String,
    pub department: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub paid_leave_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub joined_date: Option<String>,
}

impl From<&RegistrationRequest> for RegistrationRequestDto {
    fn from(request: &RegistrationRequest) -> Self {
        RegistrationRequestDto {
            employee_id: request.employee_id.clone(),
            name: request.name.clone(),
            password: request.password.clone(),
            facility: request.facility.clone(),
            department: request.department.clone(),
            role: request.role.as_str().to_string(),
            email: request.email.clone(),
            paid_leave_days: request.paid_leave_days,
            joined_date: request.joined_date.clone(),
        }
    }
}

/// 批量注册（含恢复）请求体。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRegisterRequest {
    pub users: Vec<RegistrationRequestDto>,
    pub restore_ids: Vec<String>,
}

/// CSV 校验返回结构。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvValidationDto {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub restorable_users: Vec<FleetEntryDto>,
}

impl From<CsvValidationDto> for CsvValidation {
    fn from(dto: CsvValidationDto) -> Self {
        CsvValidation {
            is_valid: dto.is_valid,
            errors: dto.errors,
            restorable: dto.restorable_users.into_iter().map(FleetEntry::from).collect(),
        }
    }
}
