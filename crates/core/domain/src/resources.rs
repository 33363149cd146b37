//! 系统资源快照与审计日志。

/// 资源快照（原始值存储，百分比按需派生）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub uptime_ms: u64,
    pub memory_used: u64,
    pub memory_max: u64,
    pub disk_used: u64,
    pub disk_total: u64,
    pub db_ping_ms: u64,
}

/// 资源探针的部分结果：诊断探针与系统资源探针各自只带一部分字段。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourcePatch {
    pub uptime_ms: Option<u64>,
    pub memory_used: Option<u64>,
    pub memory_max: Option<u64>,
    pub disk_used: Option<u64>,
    pub disk_total: Option<u64>,
    pub db_ping_ms: Option<u64>,
}

impl ResourcePatch {
    /// 叠加另一个探针结果，重叠字段以后者为准。
    pub fn merged_with(self, later: ResourcePatch) -> ResourcePatch {
        ResourcePatch {
            uptime_ms: later.uptime_ms.or(self.uptime_ms),
            memory_used: later.memory_used.or(self.memory_used),
            memory_max: later.memory_max.or(self.memory_max),
            disk_used: later.disk_used.or(self.disk_used),
            disk_total: later.disk_total.or(self.disk_total),
            db_ping_ms: later.db_ping_ms.or(self.db_ping_ms),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ResourcePatch::default()
    }
}

impl ResourceSnapshot {
    /// 以 `base` 为底应用探针结果（缺失字段保留原值）。
    pub fn apply(base: ResourceSnapshot, patch: ResourcePatch) -> ResourceSnapshot {
        ResourceSnapshot {
            uptime_ms: patch.uptime_ms.unwrap_or(base.uptime_ms),
            memory_used: patch.memory_used.unwrap_or(base.memory_used),
            memory_max: patch.memory_max.unwrap_or(base.memory_max),
            disk_used: patch.disk_used.unwrap_or(base.disk_used),
            disk_total: patch.disk_total.unwrap_or(base.disk_total),
            db_ping_ms: patch.db_ping_ms.unwrap_or(base.db_ping_ms),
        }
    }

    /// 原始内存占用百分比（未钳制）。
    pub fn memory_percent(&self) -> f64 {
        ratio_percent(self.memory_used, self.memory_max)
    }

    /// 原始磁盘占用百分比（未钳制）。
    pub fn disk_percent(&self) -> f64 {
        ratio_percent(self.disk_used, self.disk_total)
    }

    pub fn disk_free(&self) -> u64 {
        self.disk_total.saturating_sub(self.disk_used)
    }
}

fn ratio_percent(used: u64, max: u64) -> f64 {
    if max == 0 {
        return 0.0;
    }
    used as f64 / max as f64 * 100.0
}

/// 展示用钳制到 [0, 100]。
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// 远端审计日志条目。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub target: Option<String>,
    pub description: Option<String>,
    pub performed_by: Option<String>,
    pub ip_address: Option<String>,
}
