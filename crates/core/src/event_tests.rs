// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_status_event_carries_status_only() {
    let event = WorkflowEvent::job_status(RuntimeStatus::Running, "job is running");
    assert!(event.is_job_update());
    assert!(!event.is_watch_err());
    assert_eq!(event.extra.status, RuntimeStatus::Running);
    assert!(event.extra.view.is_none());
    assert_eq!(event.extra.pk, 0);
}

#[test]
fn watch_error_event() {
    let event = WorkflowEvent::watch_error("stream reset");
    assert!(event.is_watch_err());
    assert_eq!(event.message, "stream reset");
}

#[test]
fn event_serde_round_trip() {
    let event = WorkflowEvent::new(
        EventKind::DagUpdate,
        "children terminal",
        EventExtra {
            run_id: "run-1".to_string(),
            pk: 7,
            status: RuntimeStatus::Succeeded,
            component_name: "main".to_string(),
            view: None,
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    let back: WorkflowEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back.kind, EventKind::DagUpdate);
    assert_eq!(back.extra.pk, 7);
    assert_eq!(back.extra.run_id, "run-1");
}

#[test]
fn kind_display() {
    assert_eq!(EventKind::JobStopErr.to_string(), "job_stop_err");
    assert_eq!(EventKind::RunUpdate.to_string(), "run_update");
}
