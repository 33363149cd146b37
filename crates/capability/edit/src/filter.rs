//! 名册过滤。

use domain::{FleetEntry, NodeState, NodeStatusMap, effective_state};

/// 状态过滤：`all` 或某一节点状态。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    State(NodeState),
}

impl StatusFilter {
    /// `"all"`（大小写不敏感）或空串为全部，其余按节点状态解析。
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            StatusFilter::All
        } else {
            StatusFilter::State(NodeState::parse(value))
        }
    }

    fn matches(&self, state: &NodeState) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::State(wanted) => wanted == state,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FacilityFilter {
    #[default]
    All,
    Named(String),
}

impl FacilityFilter {
    pub fn parse(value: &str) -> Self {
        if value.is_empty() || value == "all" {
            FacilityFilter::All
        } else {
            FacilityFilter::Named(value.to_string())
        }
    }

    fn matches(&self, facility: &str) -> bool {
        match self {
            FacilityFilter::All => true,
            FacilityFilter::Named(name) => name == facility,
        }
    }
}

/// 过滤条件。不持久化。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    pub status: StatusFilter,
    pub facility: FacilityFilter,
}

impl FilterState {
    pub fn new(query: impl Into<String>, status: &str, facility: &str) -> Self {
        Self {
            query: query.into(),
            status: StatusFilter::parse(status),
            facility: FacilityFilter::parse(facility),
        }
    }

    fn matches_query(&self, entry: &FleetEntry) -> bool {
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&entry.facility, &entry.name, &entry.department]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

/// 三个条件同时满足才保留；没有状态的条目按 `UP` 参与状态过滤。保持名册顺序。
pub fn filter_entries(
    roster: &[FleetEntry],
    statuses: &NodeStatusMap,
    filter: &FilterState,
) -> Vec<FleetEntry> {
    roster
        .iter()
        .filter(|entry| filter.matches_query(entry))
        .filter(|entry| {
            filter
                .status
                .matches(&effective_state(statuses, entry.id))
        })
        .filter(|entry| filter.facility.matches(&entry.facility))
        .cloned()
        .collect()
}
