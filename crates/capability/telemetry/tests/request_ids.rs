use fleet_telemetry::{metrics, new_request_ids, record_command_rejected, record_poll_failure};

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
    assert_ne!(ids.request_id, ids.trace_id);
}

#[test]
fn counters_only_grow() {
    let before = metrics().snapshot();
    record_poll_failure();
    record_command_rejected();
    let after = metrics().snapshot();
    assert!(after.polls_failed > before.polls_failed);
    assert!(after.commands_rejected > before.commands_rejected);
}
