//! 安全告警与统计。

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlertKind {
    LateNightAccess,
    RapidAccess,
    MassDownload,
    LoginFailure,
    Unknown(String),
}

impl AlertKind {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "LATE_NIGHT_ACCESS" => AlertKind::LateNightAccess,
            "RAPID_ACCESS" => AlertKind::RapidAccess,
            "MASS_DOWNLOAD" => AlertKind::MassDownload,
            "LOGIN_FAILURE" => AlertKind::LoginFailure,
            _ => AlertKind::Unknown(value.to_string()),
        }
    }
}

/// 告警级别，按严重程度排序（未知值排在最低）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlertSeverity {
    Unknown(String),
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => AlertSeverity::Low,
            "MEDIUM" => AlertSeverity::Medium,
            "HIGH" => AlertSeverity::High,
            "CRITICAL" => AlertSeverity::Critical,
            _ => AlertSeverity::Unknown(value.to_string()),
        }
    }
}

/// 告警处置状态。
///
/// 单调推进：OPEN → ACKNOWLEDGED → RESOLVED，不允许回退。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlertStatus {
    Open,
    Acknowledged,
    Resolved,
    Unknown(String),
}

impl AlertStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "OPEN" => AlertStatus::Open,
            "ACKNOWLEDGED" => AlertStatus::Acknowledged,
            "RESOLVED" => AlertStatus::Resolved,
            _ => AlertStatus::Unknown(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AlertStatus::Open => "OPEN",
            AlertStatus::Acknowledged => "ACKNOWLEDGED",
            AlertStatus::Resolved => "RESOLVED",
            AlertStatus::Unknown(raw) => raw.as_str(),
        }
    }

    fn rank(&self) -> Option<u8> {
        match self {
            AlertStatus::Open => Some(0),
            AlertStatus::Acknowledged => Some(1),
            AlertStatus::Resolved => Some(2),
            AlertStatus::Unknown(_) => None,
        }
    }

    /// 仅允许严格向前的迁移；未知状态不可迁移。
    pub fn can_advance_to(&self, next: &AlertStatus) -> bool {
        match (self.rank(), next.rank()) {
            (Some(current), Some(next)) => next > current,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityAlert {
    pub id: i64,
    pub kind: AlertKind,
    pub kind_label: Option<String>,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub detected_at: String,
    pub user_id: Option<i64>,
    pub user_employee_id: Option<String>,
    pub user_name: Option<String>,
    pub description: Option<String>,
    pub ip_address: Option<String>,
}

/// 服务端聚合的告警统计，原样信任，不在本地重算。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertStats {
    pub total_open: u64,
    pub critical_open: u64,
    pub alerts_24h: u64,
}
