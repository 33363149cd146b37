//! 节点运行状态。每次轮询整体替换，不做字段级合并。

use crate::fleet::EntryId;
use std::collections::HashMap;

/// 节点状态（封闭枚举 + 未知值兜底）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeState {
    Up,
    Warning,
    Down,
    Unknown(String),
}

impl NodeState {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "UP" => NodeState::Up,
            "WARNING" => NodeState::Warning,
            "DOWN" => NodeState::Down,
            _ => NodeState::Unknown(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeState::Up => "UP",
            NodeState::Warning => "WARNING",
            NodeState::Down => "DOWN",
            NodeState::Unknown(raw) => raw.as_str(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthMetrics {
    pub employee_id: Option<String>,
    pub facility: Option<String>,
    pub last_active_at_ms: Option<i64>,
    pub warning_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeStatus {
    pub entry_id: EntryId,
    pub state: NodeState,
    pub status_label: String,
    pub status_detail: Option<String>,
    pub is_alert: bool,
    pub health_metrics: Option<HealthMetrics>,
}

pub type NodeStatusMap = HashMap<EntryId, NodeStatus>;

/// 条目的有效状态：本次轮询未出现的节点按 `UP` 处理，绝不沿用上次的异常状态。
pub fn effective_state(statuses: &NodeStatusMap, entry_id: EntryId) -> NodeState {
    statuses
        .get(&entry_id)
        .map(|status| status.state.clone())
        .unwrap_or(NodeState::Up)
}
