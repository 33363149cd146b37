//! 在途标记。

use std::sync::atomic::{AtomicBool, Ordering};

/// 命令族。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandFamily {
    Delete,
    Reset,
    Save,
    Register,
    Restore,
    Credential,
    Alert,
    Export,
}

impl CommandFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandFamily::Delete => "bulk_delete",
            CommandFamily::Reset => "bulk_reset_progress",
            CommandFamily::Save => "save_entry",
            CommandFamily::Register => "bulk_register",
            CommandFamily::Restore => "restore_entry",
            CommandFamily::Credential => "issue_credential",
            CommandFamily::Alert => "alert_triage",
            CommandFamily::Export => "compliance_export",
        }
    }
}

#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// 抢占标记；已在途时返回 `None`。
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { busy: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// drop 时释放标记（成功、失败或 future 被丢弃都会释放）。
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_refused_until_guard_drops() {
        let flag = InFlight::new();
        let guard = flag.try_begin().expect("first");
        assert!(flag.is_busy());
        assert!(flag.try_begin().is_none());
        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_begin().is_some());
    }
}
