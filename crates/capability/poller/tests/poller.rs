use domain::{
    AlertKind, AlertSeverity, AlertStatus, Department, Facility, FleetEntry, NodeState,
    NodeStatus, OperatorContext, ResourcePatch, Role, SecurityAlert,
};
use fleet_eventlog::{EventKind, EventLog};
use fleet_gateway::{GatewayError, InMemoryGateway, Operation};
use fleet_poller::{Poller, Slice};
use fleet_snapshot::SnapshotStore;
use std::sync::Arc;
use std::time::Duration;

fn entry(id: i64) -> FleetEntry {
    FleetEntry {
        id,
        employee_id: format!("E{:03}", id),
        name: format!("山田 {}", id),
        facility: "Tokyo".to_string(),
        department: "Sales".to_string(),
        email: None,
        role: Role::User,
        joined_date: None,
        paid_leave_days: 0.0,
        deleted_at: None,
    }
}

fn status(id: i64, state: NodeState) -> NodeStatus {
    NodeStatus {
        entry_id: id,
        is_alert: state != NodeState::Up,
        status_label: state.as_str().to_string(),
        state,
        status_detail: None,
        health_metrics: None,
    }
}

fn alert(id: i64) -> SecurityAlert {
    SecurityAlert {
        id,
        kind: AlertKind::LoginFailure,
        kind_label: None,
        severity: AlertSeverity::High,
        status: AlertStatus::Open,
        detected_at: "2026-10-01T00:00:00Z".to_string(),
        user_id: None,
        user_employee_id: None,
        user_name: None,
        description: None,
        ip_address: None,
    }
}

struct Fixture {
    gateway: Arc<InMemoryGateway>,
    store: Arc<SnapshotStore>,
    events: Arc<EventLog>,
    poller: Poller,
}

fn fixture() -> Fixture {
    let gateway = Arc::new(InMemoryGateway::with_entries(vec![entry(1), entry(2)]));
    gateway.set_statuses(vec![status(2, NodeState::Down)]);
    gateway.set_alerts(vec![alert(10)]);
    gateway.set_org(
        vec![Facility {
            id: 1,
            name: "Tokyo".to_string(),
        }],
        vec![Department {
            id: 1,
            name: "Sales".to_string(),
            facility_id: 1,
        }],
    );
    let store = Arc::new(SnapshotStore::new());
    let events = Arc::new(EventLog::default());
    let poller = Poller::new(gateway.clone(), store.clone(), events.clone());
    Fixture {
        gateway,
        store,
        events,
        poller,
    }
}

#[tokio::test]
async fn initial_load_fills_every_slice() {
    let fx = fixture();
    let report = fx.poller.refresh_all(&OperatorContext::developer(1)).await;
    assert!(report.is_complete());
    assert_eq!(report.roster_count, Some(2));
    assert_eq!(fx.store.roster().len(), 2);
    assert_eq!(fx.store.node_state(2), NodeState::Down);
    assert_eq!(fx.store.alerts().len(), 1);
    assert_eq!(fx.store.alert_stats().total_open, 1);
    assert_eq!(fx.store.org().facility_names(), vec!["Tokyo".to_string()]);
    assert!(fx.store.last_sync().is_some());

    let latest = fx.events.latest().expect("event");
    assert_eq!(latest.kind, EventKind::Success);
    assert_eq!(latest.message, "Loaded 2 entries and checked system health");
}

#[tokio::test]
async fn failed_slices_keep_previous_values() {
    let fx = fixture();
    let ctx = OperatorContext::developer(1);
    fx.poller.refresh_all(&ctx).await;

    fx.gateway.set_entries(vec![entry(5)]);
    fx.gateway.set_alerts(Vec::new());
    fx.gateway.fail_next(
        Operation::ListFleet,
        GatewayError::Transport("timeout".to_string()),
    );
    fx.gateway.fail_next(
        Operation::ListSecurityAlerts,
        GatewayError::Remote("boom".to_string()),
    );
    let report = fx.poller.refresh_all(&ctx).await;

    assert!(report.failed.contains(&Slice::Roster));
    assert!(report.failed.contains(&Slice::Alerts));
    assert_eq!(report.roster_count, None);
    let ids: Vec<i64> = fx.store.roster().iter().map(|entry| entry.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(fx.store.alerts().len(), 1);
    assert!(
        fx.events
            .entries()
            .iter()
            .any(|event| event.kind == EventKind::Error && event.message == "Failed to fetch data")
    );
}

#[tokio::test]
async fn non_developer_only_loads_roster() {
    let fx = fixture();
    let ctx = OperatorContext::new(3, Role::Admin, Some("Tokyo".to_string()));
    let report = fx.poller.refresh_all(&ctx).await;
    assert!(report.is_complete());
    assert_eq!(fx.gateway.calls(Operation::ListNodeStatuses), 0);
    assert_eq!(fx.gateway.calls(Operation::GetDiagnostics), 0);
    assert_eq!(fx.gateway.calls(Operation::ListSecurityAlerts), 0);
    assert_eq!(fx.gateway.calls(Operation::ListFacilities), 1);
}

#[tokio::test]
async fn org_phase_requires_operator_identity() {
    let fx = fixture();
    let ctx = OperatorContext::developer(0);
    fx.poller.refresh_all(&ctx).await;
    assert_eq!(fx.gateway.calls(Operation::ListFacilities), 0);
    assert_eq!(fx.gateway.calls(Operation::ListDepartments), 0);
    assert!(fx.store.org().facilities.is_empty());
}

#[tokio::test]
async fn system_resources_win_over_diagnostics() {
    let fx = fixture();
    fx.gateway.set_resources(
        ResourcePatch {
            uptime_ms: Some(90_000),
            memory_used: Some(10),
            memory_max: Some(100),
            db_ping_ms: Some(4),
            ..ResourcePatch::default()
        },
        ResourcePatch {
            memory_used: Some(20),
            disk_used: Some(5),
            disk_total: Some(50),
            ..ResourcePatch::default()
        },
    );
    fx.poller
        .refresh_resources(&OperatorContext::developer(1))
        .await
        .expect("resources");
    let resources = fx.store.resources();
    assert_eq!(resources.uptime_ms, 90_000);
    assert_eq!(resources.memory_used, 20);
    assert_eq!(resources.memory_max, 100);
    assert_eq!(resources.disk_total, 50);
    assert_eq!(resources.db_ping_ms, 4);
}

#[tokio::test]
async fn status_failure_retains_previous_map() {
    let fx = fixture();
    fx.poller.refresh_statuses().await.expect("first poll");
    fx.gateway.fail_next(
        Operation::ListNodeStatuses,
        GatewayError::Transport("reset".to_string()),
    );
    assert!(fx.poller.refresh_statuses().await.is_err());
    assert_eq!(fx.store.node_state(2), NodeState::Down);
}

#[tokio::test(start_paused = true)]
async fn periodic_poll_ticks_and_stops() {
    let fx = fixture();
    let handle = fx.poller.start_status_polling(Duration::from_secs(5));
    assert!(handle.is_running());

    tokio::time::sleep(Duration::from_millis(4_900)).await;
    assert_eq!(fx.gateway.calls(Operation::ListNodeStatuses), 0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(fx.gateway.calls(Operation::ListNodeStatuses), 1);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fx.gateway.calls(Operation::ListNodeStatuses), 2);

    handle.stop().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fx.gateway.calls(Operation::ListNodeStatuses), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_cancels_timer() {
    let fx = fixture();
    let handle = fx.poller.start_status_polling(Duration::from_secs(5));
    drop(handle);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fx.gateway.calls(Operation::ListNodeStatuses), 0);
}

#[tokio::test(start_paused = true)]
async fn last_arriving_response_wins() {
    let fx = fixture();
    // tick@5s 慢响应（@12s 到达），tick@10s 快响应（@11s 到达）
    fx.gateway
        .script_statuses(vec![status(1, NodeState::Down)], Duration::from_secs(7));
    fx.gateway
        .script_statuses(vec![status(1, NodeState::Warning)], Duration::from_secs(1));
    fx.gateway.set_statuses(vec![status(1, NodeState::Up)]);
    let handle = fx.poller.start_status_polling(Duration::from_secs(5));

    tokio::time::sleep(Duration::from_millis(11_500)).await;
    assert_eq!(fx.store.node_state(1), NodeState::Warning);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fx.store.node_state(1), NodeState::Down);

    handle.stop().await;
}
