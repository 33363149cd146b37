use domain::{
    AlertKind, AlertSeverity, AlertStatus, BulkOutcome, EntryUpdate, FleetEntry, OperatorContext,
    Role, SecurityAlert,
};
use fleet_control::{
    CommandError, CommandFamily, CommandPipeline, ImportOutcome, PipelineConfig, ScriptedNotifier,
    compliance_report_file_name,
};
use fleet_eventlog::{EventKind, EventLog};
use fleet_gateway::{GatewayError, InMemoryGateway, Operation};
use fleet_poller::Poller;
use fleet_snapshot::SnapshotStore;
use std::sync::Arc;
use std::time::Duration;

fn entry(id: i64) -> FleetEntry {
    FleetEntry {
        id,
        employee_id: format!("E{:03}", id),
        name: format!("山田 {}", id),
        facility: "本館".to_string(),
        department: "事務部".to_string(),
        email: None,
        role: Role::User,
        joined_date: None,
        paid_leave_days: 5.0,
        deleted_at: None,
    }
}

struct Fixture {
    gateway: Arc<InMemoryGateway>,
    store: Arc<SnapshotStore>,
    events: Arc<EventLog>,
    notifier: Arc<ScriptedNotifier>,
    poller: Poller,
    pipeline: CommandPipeline,
    ctx: OperatorContext,
}

async fn fixture_with(config: PipelineConfig) -> Fixture {
    let gateway = Arc::new(InMemoryGateway::with_entries(
        [1, 3, 5, 7].into_iter().map(entry).collect(),
    ));
    let store = Arc::new(SnapshotStore::new());
    let events = Arc::new(EventLog::default());
    let notifier = Arc::new(ScriptedNotifier::new(true));
    let poller = Poller::new(gateway.clone(), store.clone(), events.clone());
    let ctx = OperatorContext::developer(1);
    poller.refresh_all(&ctx).await;
    let pipeline = CommandPipeline::new(gateway.clone(), poller.clone(), notifier.clone(), config);
    Fixture {
        gateway,
        store,
        events,
        notifier,
        poller,
        pipeline,
        ctx,
    }
}

async fn fixture() -> Fixture {
    fixture_with(PipelineConfig::default()).await
}

fn select(fx: &Fixture, ids: &[i64]) {
    for id in ids {
        assert!(fx.store.toggle(*id));
    }
}

#[tokio::test]
async fn bulk_delete_success_clears_selection_and_refreshes() {
    let fx = fixture().await;
    select(&fx, &[3, 7]);
    let list_calls = fx.gateway.calls(Operation::ListFleet);

    assert_eq!(fx.pipeline.open_delete_confirmation().expect("open"), 2);
    assert!(fx.pipeline.can_confirm_bulk_delete());
    let deleted = fx
        .pipeline
        .confirm_bulk_delete(&fx.ctx)
        .await
        .expect("delete");

    assert_eq!(deleted, 2);
    assert!(fx.store.selection().is_empty());
    assert!(!fx.pipeline.is_delete_confirmation_open());
    assert_eq!(fx.gateway.last_bulk_delete_ids(), Some(vec![3, 7]));
    assert_eq!(fx.gateway.calls(Operation::ListFleet), list_calls + 1);
    assert_eq!(fx.store.roster().len(), 2);
    assert!(
        fx.events
            .entries()
            .iter()
            .any(|event| event.kind == EventKind::Success
                && event.message == "Successfully deleted 2 entries")
    );
}

#[tokio::test]
async fn bulk_delete_failure_keeps_selection_and_confirmation() {
    let fx = fixture().await;
    select(&fx, &[3, 7]);
    fx.gateway
        .push_bulk_delete_outcome(BulkOutcome::failed("locked"));

    fx.pipeline.open_delete_confirmation().expect("open");
    let err = fx
        .pipeline
        .confirm_bulk_delete(&fx.ctx)
        .await
        .expect_err("locked");

    assert!(matches!(err, CommandError::Rejected(ref message) if message == "locked"));
    assert_eq!(fx.store.selection(), vec![3, 7]);
    assert!(fx.pipeline.is_delete_confirmation_open());
    let latest = fx.events.latest().expect("event");
    assert_eq!(latest.kind, EventKind::Error);
    assert!(latest.message.contains("locked"));
    assert_eq!(fx.notifier.alerts().len(), 1);

    // 同一选择重试
    let deleted = fx
        .pipeline
        .confirm_bulk_delete(&fx.ctx)
        .await
        .expect("retry");
    assert_eq!(deleted, 2);
}

#[tokio::test]
async fn bulk_delete_transport_error_keeps_confirmation() {
    let fx = fixture().await;
    select(&fx, &[5]);
    fx.gateway.fail_next(
        Operation::BulkDelete,
        GatewayError::Transport("connection reset".to_string()),
    );
    fx.pipeline.open_delete_confirmation().expect("open");
    let err = fx
        .pipeline
        .confirm_bulk_delete(&fx.ctx)
        .await
        .expect_err("transport");
    assert!(matches!(err, CommandError::Gateway(GatewayError::Transport(_))));
    assert!(fx.pipeline.is_delete_confirmation_open());
    assert_eq!(fx.store.selection(), vec![5]);
}

#[tokio::test]
async fn empty_selection_never_reaches_remote() {
    let fx = fixture().await;
    let err = fx
        .pipeline
        .open_delete_confirmation()
        .expect_err("empty");
    assert!(err.is_local());
    assert!(!fx.pipeline.can_confirm_bulk_delete());
    assert!(fx.pipeline.confirm_bulk_delete(&fx.ctx).await.is_err());
    assert!(fx.pipeline.bulk_reset_progress(&fx.ctx).await.is_err());
    assert_eq!(fx.gateway.calls(Operation::BulkDelete), 0);
    assert_eq!(fx.gateway.calls(Operation::BulkResetProgress), 0);
}

#[tokio::test]
async fn bulk_reset_requires_confirmation() {
    let fx = fixture().await;
    select(&fx, &[1, 3]);

    fx.notifier.push_answer(false);
    let err = fx
        .pipeline
        .bulk_reset_progress(&fx.ctx)
        .await
        .expect_err("declined");
    assert!(matches!(err, CommandError::Precondition("not confirmed")));
    assert_eq!(fx.gateway.calls(Operation::BulkResetProgress), 0);

    fx.gateway.fail_next(
        Operation::BulkResetProgress,
        GatewayError::Remote("busy".to_string()),
    );
    assert!(fx.pipeline.bulk_reset_progress(&fx.ctx).await.is_err());
    assert_eq!(fx.store.selection(), vec![1, 3]);
    assert!(fx.notifier.alerts().is_empty());

    let count = fx
        .pipeline
        .bulk_reset_progress(&fx.ctx)
        .await
        .expect("reset");
    assert_eq!(count, 2);
    assert_eq!(fx.gateway.last_reset_ids(), Some(vec![1, 3]));
    assert!(fx.store.selection().is_empty());
    assert_eq!(
        fx.notifier.prompts()[0],
        "Reset progress for 2 selected entries?"
    );
}

#[tokio::test]
async fn save_failure_surfaces_blocking_alert() {
    let fx = fixture().await;
    let update = EntryUpdate {
        paid_leave_days: Some(-3.0),
        ..EntryUpdate::default()
    };
    let err = fx
        .pipeline
        .save_entry(&fx.ctx, 1, &update)
        .await
        .expect_err("invalid");
    assert!(matches!(err, CommandError::Gateway(GatewayError::Remote(_))));
    assert_eq!(fx.notifier.alerts().len(), 1);
    assert_eq!(fx.events.latest().expect("event").kind, EventKind::Error);
    assert!(!fx.pipeline.is_in_flight(CommandFamily::Save));
}

#[tokio::test(start_paused = true)]
async fn concurrent_save_is_refused_while_in_flight() {
    let fx = fixture().await;
    fx.gateway
        .set_delay(Operation::UpdateEntry, Duration::from_secs(1));
    let update = EntryUpdate {
        email: Some("a@example.com".to_string()),
        ..EntryUpdate::default()
    };
    let (first, second) = tokio::join!(
        fx.pipeline.save_entry(&fx.ctx, 1, &update),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            fx.pipeline.save_entry(&fx.ctx, 3, &update).await
        }
    );
    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(CommandError::Precondition("already in flight"))
    ));
    assert_eq!(fx.gateway.calls(Operation::UpdateEntry), 1);
}

const CSV: &str = "employeeId,name,facility,department,role\n\
                   E003,山田 三郎,本館,事務部,USER\n\
                   E100,田中 太郎,南棟,透析室,ADMIN\n";

#[tokio::test]
async fn csv_import_opens_restore_checklist() {
    let fx = fixture().await;
    let mut archived = fx.gateway.entries();
    archived
        .iter_mut()
        .filter(|entry| entry.id == 3)
        .for_each(|entry| entry.deleted_at = Some("2026-09-01T00:00:00Z".to_string()));
    fx.gateway.set_entries(archived);

    let outcome = fx.pipeline.import_csv(&fx.ctx, CSV).await.expect("import");
    assert_eq!(outcome, ImportOutcome::AwaitingRestore { restorable: 1 });
    let checklist = fx.pipeline.restore_checklist().expect("checklist");
    assert_eq!(checklist.checked(), ["E003".to_string()]);

    assert!(!fx.pipeline.toggle_restore_row("E003"));
    let err = fx
        .pipeline
        .confirm_restore(&fx.ctx)
        .await
        .expect_err("nothing checked");
    assert!(matches!(err, CommandError::Precondition("nothing to restore")));
    assert_eq!(fx.gateway.calls(Operation::BulkRegister), 0);

    fx.pipeline.toggle_all_restore_rows();
    let count = fx
        .pipeline
        .confirm_restore(&fx.ctx)
        .await
        .expect("restore");
    assert_eq!(count, 2);
    let (rows, restore_ids) = fx.gateway.last_register().expect("register");
    assert_eq!(rows.len(), 2);
    assert_eq!(restore_ids, vec!["E003".to_string()]);
    assert!(fx.pipeline.restore_checklist().is_none());
    assert!(fx.store.roster().iter().any(|entry| entry.employee_id == "E100"));
}

#[tokio::test]
async fn csv_import_without_restorable_registers_directly() {
    let fx = fixture().await;
    let csv = "header\nE200,鈴木 一郎,本館,事務部,user\n";
    let outcome = fx.pipeline.import_csv(&fx.ctx, csv).await.expect("import");
    assert_eq!(outcome, ImportOutcome::Registered { count: 1 });
    let (_, restore_ids) = fx.gateway.last_register().expect("register");
    assert!(restore_ids.is_empty());
}

#[tokio::test]
async fn csv_import_reports_validation_errors() {
    let fx = fixture().await;
    // E003 仍在籍 → 冲突
    let err = fx
        .pipeline
        .import_csv(&fx.ctx, CSV)
        .await
        .expect_err("conflict");
    assert!(matches!(err, CommandError::Rejected(_)));
    assert_eq!(fx.notifier.alerts().len(), 1);
    assert!(fx.pipeline.restore_checklist().is_none());

    let err = fx
        .pipeline
        .import_csv(&fx.ctx, "header\nE1,山田太郎,本館,事務部,USER\n")
        .await
        .expect_err("name");
    assert!(matches!(err, CommandError::Csv(_)));
    assert_eq!(fx.gateway.calls(Operation::ValidateBulkCsv), 1);
}

#[tokio::test]
async fn cancel_restore_drops_pending_import() {
    let fx = fixture().await;
    let mut archived = fx.gateway.entries();
    archived[1].deleted_at = Some("2026-09-01T00:00:00Z".to_string());
    fx.gateway.set_entries(archived);
    fx.pipeline.import_csv(&fx.ctx, CSV).await.expect("import");
    fx.pipeline.cancel_restore();
    assert!(fx.pipeline.restore_checklist().is_none());
    assert_eq!(fx.gateway.calls(Operation::BulkRegister), 0);
}

#[tokio::test]
async fn archive_restore_needs_confirmation() {
    let fx = fixture().await;
    let mut archived = fx.gateway.entries();
    archived[0].deleted_at = Some("2026-09-01T00:00:00Z".to_string());
    fx.gateway.set_entries(archived);
    fx.poller.refresh_roster(&fx.ctx).await.expect("roster");
    assert!(fx.store.entry(1).is_none());

    let deleted = fx.pipeline.archived_entries(&fx.ctx).await.expect("archive");
    assert_eq!(deleted.len(), 1);

    fx.notifier.push_answer(false);
    assert!(fx.pipeline.restore_entry(&fx.ctx, 1).await.is_err());
    assert_eq!(fx.gateway.calls(Operation::RestoreEntry), 0);
    fx.pipeline.restore_entry(&fx.ctx, 1).await.expect("restore");
    assert!(fx.store.entry(1).is_some());
}

#[tokio::test(start_paused = true)]
async fn credential_issue_overwrites_and_copy_indicator_reverts() {
    let fx = fixture_with(PipelineConfig {
        copy_indicator: Duration::from_secs(2),
        ..PipelineConfig::default()
    })
    .await;
    let panel = fx.pipeline.credential_panel();
    assert!(panel.mark_copied().is_none());

    let first = fx.pipeline.issue_credential(&fx.ctx, 3).await.expect("first");
    let second = fx.pipeline.issue_credential(&fx.ctx, 5).await.expect("second");
    let shown = panel.current().expect("shown");
    assert_eq!(shown.entry_id, 5);
    assert_eq!(shown.temp_password, second.temp_password);
    assert!(!first.temp_password.is_empty());

    assert_eq!(panel.mark_copied(), Some(second.temp_password.clone()));
    assert!(panel.is_copied());
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    panel.mark_copied();
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert!(panel.is_copied());
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert!(!panel.is_copied());
}

fn alert(id: i64, status: AlertStatus) -> SecurityAlert {
    SecurityAlert {
        id,
        kind: AlertKind::LateNightAccess,
        kind_label: None,
        severity: AlertSeverity::Medium,
        status,
        detected_at: "2026-10-01T02:00:00Z".to_string(),
        user_id: Some(3),
        user_employee_id: None,
        user_name: None,
        description: None,
        ip_address: None,
    }
}

#[tokio::test]
async fn alert_transitions_are_monotonic() {
    let fx = fixture().await;
    fx.gateway.set_alerts(vec![alert(10, AlertStatus::Open)]);
    fx.poller
        .refresh_alerts(&fx.ctx)
        .await
        .expect("alerts");

    fx.pipeline
        .resolve_alert(&fx.ctx, 10)
        .await
        .expect("resolve");
    assert_eq!(
        fx.store.alert(10).expect("alert").status,
        AlertStatus::Resolved
    );

    let err = fx
        .pipeline
        .acknowledge_alert(&fx.ctx, 10)
        .await
        .expect_err("reverse");
    assert!(matches!(err, CommandError::InvalidTransition { .. }));
    assert_eq!(fx.gateway.calls(Operation::AcknowledgeAlert), 0);
}

#[tokio::test]
async fn compliance_export_writes_dated_file() {
    let dir = std::env::temp_dir().join(format!("fleet-export-{}", uuid::Uuid::new_v4()));
    let fx = fixture_with(PipelineConfig {
        export_dir: dir.clone(),
        ..PipelineConfig::default()
    })
    .await;
    fx.gateway
        .set_compliance_csv("facility,count\n本館,3\n".as_bytes().to_vec());

    let path = fx
        .pipeline
        .export_compliance_csv(&fx.ctx, "all", Some("2026-01-01"), None)
        .await
        .expect("export");
    let expected = compliance_report_file_name(chrono::Local::now().date_naive());
    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some(expected.as_str())
    );
    let written = tokio::fs::read(&path).await.expect("read");
    assert_eq!(written, "facility,count\n本館,3\n".as_bytes().to_vec());
    let query = fx.gateway.last_export().expect("query");
    assert_eq!(query.facility, None);
    assert_eq!(query.start_date.as_deref(), Some("2026-01-01"));

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
