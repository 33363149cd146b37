//! 操作员可见的事件日志。
//!
//! 有界环形缓冲（默认容量 50），最新在前；`add` 是唯一写入口，不做去重。
//! 每条事件同时镜像到 tracing（`error` → `warn!`，其余 → `info!`）。

use chrono::{DateTime, Local};
use fleet_telemetry::record_event_logged;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// 默认容量。
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Info,
    Success,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Info => "info",
            EventKind::Success => "success",
            EventKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventEntry {
    /// 单调递增。
    pub id: u64,
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub kind: EventKind,
}

/// 事件日志。
pub struct EventLog {
    capacity: usize,
    next_id: AtomicU64,
    entries: RwLock<VecDeque<EventEntry>>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            next_id: AtomicU64::new(1),
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<EventEntry>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<EventEntry>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 追加一条事件，超出容量时淘汰最旧的一条。返回事件 id。
    ///
    /// id 在写锁内分配，环内顺序与 id 顺序一致。
    pub fn add(&self, message: impl Into<String>, kind: EventKind) -> u64 {
        let message = message.into();
        let id = {
            let mut entries = self.write();
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            entries.push_front(EventEntry {
                id,
                timestamp: Local::now(),
                message: message.clone(),
                kind,
            });
            entries.truncate(self.capacity);
            id
        };
        match kind {
            EventKind::Error => {
                warn!(target: "fleet.eventlog", event_id = id, kind = kind.as_str(), message = %message, "operator_event");
            }
            _ => {
                info!(target: "fleet.eventlog", event_id = id, kind = kind.as_str(), message = %message, "operator_event");
            }
        }
        record_event_logged();
        id
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.add(message, EventKind::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.add(message, EventKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.add(message, EventKind::Error)
    }

    /// 当前事件（最新在前）。
    pub fn entries(&self) -> Vec<EventEntry> {
        self.read().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<EventEntry> {
        self.read().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
