//! 名册条目（用户/终端记录）及其变更输入。

pub type EntryId = i64;

/// 条目角色。未知取值保留原文，避免静默归入某个已知角色。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Admin,
    Developer,
    Unknown(String),
}

impl Role {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "USER" => Role::User,
            "ADMIN" => Role::Admin,
            "DEVELOPER" => Role::Developer,
            _ => Role::Unknown(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
            Role::Developer => "DEVELOPER",
            Role::Unknown(raw) => raw.as_str(),
        }
    }
}

/// 名册条目。
///
/// 由远端注册创建；本地只会经编辑或恢复变更，批量删除仅设置 `deleted_at`（软删除）。
#[derive(Debug, Clone, PartialEq)]
pub struct FleetEntry {
    pub id: EntryId,
    pub employee_id: String,
    pub name: String,
    pub facility: String,
    pub department: String,
    pub email: Option<String>,
    pub role: Role,
    pub joined_date: Option<String>,
    pub paid_leave_days: f64,
    pub deleted_at: Option<String>,
}

impl FleetEntry {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// 条目部分更新（未设置的字段不提交）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryUpdate {
    pub role: Option<Role>,
    pub facility: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub paid_leave_days: Option<f64>,
    pub joined_date: Option<String>,
}

/// 远端批量操作结果（传输成功但可能逻辑失败）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl BulkOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// 一次性临时凭据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryCredential {
    pub temp_password: String,
}

/// 注册请求（CSV 导入的一行）。
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRequest {
    pub employee_id: String,
    pub name: String,
    pub password: Option<String>,
    pub facility: String,
    pub department: String,
    pub role: Role,
    pub email: Option<String>,
    pub paid_leave_days: Option<f64>,
    pub joined_date: Option<String>,
}

/// 远端 CSV 校验结果。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    /// 可恢复的已软删除条目。
    pub restorable: Vec<FleetEntry>,
}
