// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn job_view(name: &str, seq: usize, status: RuntimeStatus) -> JobView {
    JobView {
        job_id: format!("job-{name}"),
        job_name: name.to_string(),
        status,
        seq,
        ..Default::default()
    }
}

#[test]
fn component_view_accessors() {
    let view = ComponentView::Job(job_view("extract", 2, RuntimeStatus::Succeeded));
    assert_eq!(view.status(), RuntimeStatus::Succeeded);
    assert_eq!(view.seq(), 2);
    assert_eq!(view.name(), "extract");

    let dag = ComponentView::Dag(DagView {
        dag_id: "dag-1".to_string(),
        name: "main".to_string(),
        status: RuntimeStatus::Running,
        ..Default::default()
    });
    assert_eq!(dag.status(), RuntimeStatus::Running);
    assert_eq!(dag.name(), "main");
}

#[test]
fn view_serde_keeps_kind_tag() {
    let view = ComponentView::Job(job_view("step", 0, RuntimeStatus::Failed));
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["kind"], "job");
    assert_eq!(json["status"], "failed");
}

#[test]
fn run_state_view_lookup_by_runtime_name() {
    let mut state = RunStateView::default();
    state.jobs.insert("wf.extract-0".to_string(), job_view("extract", 0, RuntimeStatus::Running));
    assert!(state.job("wf.extract-0").is_some());
    assert!(state.job("wf.extract-1").is_none());
}
