use domain::{FleetEntry, NodeState, NodeStatus, NodeStatusMap, Role};
use fleet_edit::{FilterState, filter_entries};

fn entry(id: i64, name: &str, facility: &str, department: &str) -> FleetEntry {
    FleetEntry {
        id,
        employee_id: format!("E{:03}", id),
        name: name.to_string(),
        facility: facility.to_string(),
        department: department.to_string(),
        email: None,
        role: Role::User,
        joined_date: None,
        paid_leave_days: 0.0,
        deleted_at: None,
    }
}

fn statuses(states: &[(i64, NodeState)]) -> NodeStatusMap {
    states
        .iter()
        .map(|(id, state)| {
            (
                *id,
                NodeStatus {
                    entry_id: *id,
                    state: state.clone(),
                    status_label: state.as_str().to_string(),
                    status_detail: None,
                    is_alert: *state != NodeState::Up,
                    health_metrics: None,
                },
            )
        })
        .collect()
}

fn roster() -> Vec<FleetEntry> {
    vec![
        entry(1, "山田 太郎", "Tokyo Clinic", "Reception"),
        entry(2, "佐藤 花子", "Tokyo Clinic", "Radiology"),
        entry(3, "鈴木 一郎", "Osaka Branch", "Tokyo Liaison"),
        entry(4, "高橋 次郎", "Nagoya Office", "Finance"),
        entry(5, "田中 三郎", "Kyoto Annex", "Nursing"),
    ]
}

#[test]
fn query_status_and_facility_must_all_match() {
    let statuses = statuses(&[
        (1, NodeState::Down),
        (3, NodeState::Warning),
        (4, NodeState::Down),
    ]);
    let filter = FilterState::new("tokyo", "DOWN", "all");

    let result = filter_entries(&roster(), &statuses, &filter);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, 1);
}

#[test]
fn empty_filter_keeps_roster_order() {
    let result = filter_entries(&roster(), &NodeStatusMap::new(), &FilterState::default());
    let ids: Vec<i64> = result.iter().map(|entry| entry.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn missing_status_counts_as_up() {
    let statuses = statuses(&[(1, NodeState::Down)]);
    let up = filter_entries(&roster(), &statuses, &FilterState::new("", "UP", "all"));
    assert_eq!(up.len(), 4);
    assert!(up.iter().all(|entry| entry.id != 1));
}

#[test]
fn query_is_case_insensitive_across_fields() {
    let statuses = NodeStatusMap::new();
    let by_department = filter_entries(&roster(), &statuses, &FilterState::new("FINANCE", "all", "all"));
    assert_eq!(by_department.len(), 1);
    assert_eq!(by_department[0].id, 4);

    let by_name = filter_entries(&roster(), &statuses, &FilterState::new("花子", "all", "all"));
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, 2);
}

#[test]
fn facility_filter_is_exact() {
    let statuses = NodeStatusMap::new();
    let result = filter_entries(
        &roster(),
        &statuses,
        &FilterState::new("", "all", "Tokyo Clinic"),
    );
    assert_eq!(result.len(), 2);

    let none = filter_entries(&roster(), &statuses, &FilterState::new("", "all", "Tokyo"));
    assert!(none.is_empty());
}
