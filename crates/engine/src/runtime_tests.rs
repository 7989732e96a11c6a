// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn runtime_name_appends_seq() {
    let meta = RuntimeMeta::new("wf.extract", "extract", 2, "dag-1");
    assert_eq!(meta.name, "wf.extract-2");
    assert_eq!(meta.short_name, "extract");
    assert_eq!(meta.status(), RuntimeStatus::Pending);
    assert!(!meta.is_done());
}

#[test]
fn terminal_transition_sets_done_once() {
    let meta = RuntimeMeta::new("wf.extract", "extract", 0, "dag-1");
    assert!(meta.update_status(RuntimeStatus::Running));
    assert!(meta.update_status(RuntimeStatus::Succeeded));
    assert!(meta.is_done());

    // terminal runtimes reject every further transition
    assert!(!meta.update_status(RuntimeStatus::Failed));
    assert_eq!(meta.status(), RuntimeStatus::Succeeded);
    assert!(meta.is_done());
}

#[test]
fn pk_assignment() {
    let meta = RuntimeMeta::new("wf.extract", "extract", 0, "dag-1");
    assert_eq!(meta.pk(), 0);
    meta.set_pk(42);
    assert_eq!(meta.pk(), 42);
}

#[parameterized(
    first = { 0, "run-9-train" },
    second = { 1, "run-9-train-1" },
    tenth = { 10, "run-9-train-10" },
)]
fn job_name_generation(seq: usize, expect: &str) {
    assert_eq!(generate_job_name("run-9", "train", seq), expect);
}
