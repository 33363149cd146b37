use api_contract::{
    AlertStatsDto, BulkOutcomeDto, FleetEntryDto, NodeStatusDto, ResourcesDto,
    SecurityAlertDto, UpdateEntryRequest,
};
use domain::{
    AlertSeverity, AlertStats, AlertStatus, BulkOutcome, EntryUpdate, FleetEntry, NodeState,
    NodeStatus, ResourcePatch, Role,
};

#[test]
fn fleet_entry_parses_camel_case() {
    let payload = r#"{
        "id": 3,
        "employeeId": "1003",
        "name": "山田 太郎",
        "facility": "Tokyo Clinic",
        "department": "外来",
        "role": "ADMIN",
        "paidLeaveDays": 12.5,
        "deletedAt": null
    }"#;
    let dto: FleetEntryDto = serde_json::from_str(payload).expect("parse");
    let entry = FleetEntry::from(dto);
    assert_eq!(entry.employee_id, "1003");
    assert_eq!(entry.role, Role::Admin);
    assert_eq!(entry.paid_leave_days, 12.5);
    assert!(!entry.is_deleted());
    assert!(entry.email.is_none());
}

#[test]
fn node_status_defaults_alert_flag_from_state() {
    let payload = r#"{"userId":5,"status":"WARNING","statusLabel":"警告あり"}"#;
    let dto: NodeStatusDto = serde_json::from_str(payload).expect("parse");
    let status = NodeStatus::from(dto);
    assert_eq!(status.entry_id, 5);
    assert_eq!(status.state, NodeState::Warning);
    assert!(status.is_alert);

    let payload = r#"{"userId":6,"status":"REBOOTING","isAlert":false}"#;
    let dto: NodeStatusDto = serde_json::from_str(payload).expect("parse");
    let status = NodeStatus::from(dto);
    assert_eq!(status.state, NodeState::Unknown("REBOOTING".to_string()));
    assert!(!status.is_alert);
}

#[test]
fn security_alert_maps_type_field() {
    let payload = r#"{
        "id": 9,
        "type": "MASS_DOWNLOAD",
        "severity": "CRITICAL",
        "status": "OPEN",
        "detectedAt": "2026-10-01T03:00:00"
    }"#;
    let dto: SecurityAlertDto = serde_json::from_str(payload).expect("parse");
    assert_eq!(dto.kind, "MASS_DOWNLOAD");
    let alert = domain::SecurityAlert::from(dto);
    assert_eq!(alert.severity, AlertSeverity::Critical);
    assert_eq!(alert.status, AlertStatus::Open);
}

#[test]
fn alert_stats_reads_alerts24h() {
    let payload = r#"{"totalOpen":4,"criticalOpen":1,"alerts24h":2}"#;
    let dto: AlertStatsDto = serde_json::from_str(payload).expect("parse");
    let stats = AlertStats::from(dto);
    assert_eq!(stats.total_open, 4);
    assert_eq!(stats.alerts_24h, 2);
}

#[test]
fn diagnostics_memory_total_fills_memory_max() {
    let payload = r#"{"uptime":3600000,"memoryTotal":2048,"memoryUsed":1024,"dbPing":3}"#;
    let dto: ResourcesDto = serde_json::from_str(payload).expect("parse");
    let patch = ResourcePatch::from(dto);
    assert_eq!(patch.memory_max, Some(2048));
    assert_eq!(patch.uptime_ms, Some(3_600_000));
    assert!(patch.disk_total.is_none());
}

#[test]
fn update_request_skips_unset_fields() {
    let update = EntryUpdate {
        role: Some(Role::Developer),
        department: Some("薬局".to_string()),
        ..EntryUpdate::default()
    };
    let value = serde_json::to_value(UpdateEntryRequest::from(&update)).expect("serialize");
    assert_eq!(value.get("role").and_then(|v| v.as_str()), Some("DEVELOPER"));
    assert!(value.get("department").is_some());
    assert!(value.get("facility").is_none());
    assert!(value.get("paidLeaveDays").is_none());
}

#[test]
fn bulk_outcome_without_success_is_failure() {
    let dto: BulkOutcomeDto = serde_json::from_str(r#"{"message":"locked"}"#).expect("parse");
    let outcome = BulkOutcome::from(dto);
    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("locked"));
}
