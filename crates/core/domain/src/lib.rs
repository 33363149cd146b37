pub mod fleet;
pub mod org;
pub mod resources;
pub mod security;
pub mod status;

pub use fleet::{
    BulkOutcome, CsvValidation, EntryId, EntryUpdate, FleetEntry, RegistrationRequest, Role,
    TemporaryCredential,
};
pub use org::{Department, Facility, OrgDirectory};
pub use resources::{AuditLogEntry, ResourcePatch, ResourceSnapshot, clamp_percent};
pub use security::{AlertKind, AlertSeverity, AlertStats, AlertStatus, SecurityAlert};
pub use status::{HealthMetrics, NodeState, NodeStatus, NodeStatusMap, effective_state};

/// 操作员上下文：所有网关调用与命令显式携带，替代隐式的全局会话身份。
#[derive(Debug, Clone)]
pub struct OperatorContext {
    pub operator_id: i64,
    pub role: Role,
    pub facility: Option<String>,
}

impl OperatorContext {
    /// 构造显式身份的操作员上下文。
    pub fn new(operator_id: i64, role: Role, facility: Option<String>) -> Self {
        Self {
            operator_id,
            role,
            facility,
        }
    }

    /// 开发者身份（可见系统诊断、节点状态与安全告警）。
    pub fn developer(operator_id: i64) -> Self {
        Self::new(operator_id, Role::Developer, None)
    }

    pub fn is_developer(&self) -> bool {
        self.role == Role::Developer
    }

    /// 是否能解析出有效的操作员身份（组织主数据只在此时拉取）。
    pub fn has_identity(&self) -> bool {
        self.operator_id > 0
    }
}

impl Default for OperatorContext {
    /// 空上下文（仅用于测试或占位）。
    fn default() -> Self {
        Self {
            operator_id: 0,
            role: Role::User,
            facility: None,
        }
    }
}
