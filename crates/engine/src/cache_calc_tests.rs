// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::template::{build_sys_params, InnerSolver, ResolveMode};
use crate::test_support::MemoryCallbacks;
use dagrun_core::{Artifacts, FakeClock, JobView, LogCacheRequest, RunConfig};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn first_fingerprint_ignores_declaration_order() {
    let a = first_fingerprint("img:v1", "run", &names(&["a", "b"]), &names(&["x"]), &[]);
    let b = first_fingerprint("img:v1", "run", &names(&["b", "a"]), &names(&["x"]), &[]);
    assert_eq!(a, b);
}

#[test]
fn first_fingerprint_changes_with_structure() {
    let base = first_fingerprint("img:v1", "run", &names(&["a"]), &[], &[]);
    assert_ne!(base, first_fingerprint("img:v2", "run", &names(&["a"]), &[], &[]));
    assert_ne!(base, first_fingerprint("img:v1", "run --x", &names(&["a"]), &[], &[]));
    assert_ne!(base, first_fingerprint("img:v1", "run", &names(&["a", "b"]), &[], &[]));
    assert_ne!(base, first_fingerprint("img:v1", "run", &names(&["a"]), &names(&["in"]), &[]));
    assert_ne!(base, first_fingerprint("img:v1", "run", &names(&["a"]), &[], &names(&["out"])));
}

#[test]
fn second_fingerprint_tracks_values() {
    let params_a = IndexMap::from([("p".to_string(), "1".to_string())]);
    let params_b = IndexMap::from([("p".to_string(), "2".to_string())]);
    let inputs = IndexMap::from([("rows".to_string(), "digest-1".to_string())]);
    let image = image_digest("img:v1");

    let a = second_fingerprint(&params_a, &inputs, &image);
    let b = second_fingerprint(&params_b, &inputs, &image);
    assert_ne!(a, b);
    assert_eq!(a, second_fingerprint(&params_a, &inputs, &image));
}

/// A step resolved for cache fingerprints, persisted to a view, rehydrated,
/// and resolved again yields identical fingerprints.
#[test]
fn fingerprints_round_trip_through_job_view() {
    let config = RunConfig::new("run-1").fs_id("fs-1").pipeline_source("ppl-1");
    let sys = build_sys_params(&config, "train", None);
    let mut artifacts = Artifacts::default();
    artifacts.input.insert("rows".to_string(), "/fs/rows".to_string());
    artifacts.output.insert("model".to_string(), String::new());

    let mut solver = InnerSolver::new(
        "wf.train",
        IndexMap::from([("epochs".to_string(), json!(10))]),
        IndexMap::new(),
        "train --epochs {{ epochs }} --out {{ model }}",
        artifacts.clone(),
        sys.clone(),
        IndexMap::new(),
    );
    solver.resolve_parameters().unwrap();
    solver.resolve_artifacts().unwrap();

    let command = solver.resolve_command(ResolveMode::CacheFingerprint).unwrap();
    let first = first_fingerprint(
        "img:v1",
        &command,
        &names(&["epochs"]),
        &names(&["rows"]),
        &names(&["model"]),
    );
    let inputs = IndexMap::from([("rows".to_string(), "digest-rows".to_string())]);
    let second = second_fingerprint(solver.parameters(), &inputs, &image_digest("img:v1"));

    // persist and rehydrate
    let view = JobView {
        parameters: solver.parameters().clone(),
        artifacts: solver.artifacts().clone(),
        ..Default::default()
    };
    let mut rehydrated = InnerSolver::new(
        "wf.train",
        IndexMap::new(),
        IndexMap::new(),
        "train --epochs {{ epochs }} --out {{ model }}",
        Artifacts::default(),
        sys,
        IndexMap::new(),
    );
    rehydrated.adopt_parameters(view.parameters.clone());
    rehydrated.adopt_artifacts(view.artifacts.clone());

    let command2 = rehydrated.resolve_command(ResolveMode::CacheFingerprint).unwrap();
    let first2 = first_fingerprint(
        "img:v1",
        &command2,
        &names(&["epochs"]),
        &names(&["rows"]),
        &names(&["model"]),
    );
    let second2 = second_fingerprint(rehydrated.parameters(), &inputs, &image_digest("img:v1"));

    assert_eq!(first, first2);
    assert_eq!(second, second2);
}

async fn log_entry(
    callbacks: &MemoryCallbacks,
    run_id: &str,
    second_fp: &str,
    expired_time: &str,
) {
    callbacks
        .log_cache(LogCacheRequest {
            first_fp: "fp1".to_string(),
            second_fp: second_fp.to_string(),
            source: "ppl-1".to_string(),
            run_id: run_id.to_string(),
            step_name: "wf.train-0".to_string(),
            job_id: format!("job-{run_id}"),
            fs_id: "fs-1".to_string(),
            expired_time: expired_time.to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn lookup_prefers_newest_matching_entry() {
    let clock = Arc::new(FakeClock::new());
    let callbacks = MemoryCallbacks::new(clock.clone());

    log_entry(&callbacks, "run-old", "fp2", "-1").await;
    clock.advance(Duration::from_secs(10));
    log_entry(&callbacks, "run-new", "fp2", "-1").await;
    clock.advance(Duration::from_secs(10));
    log_entry(&callbacks, "run-other", "different", "-1").await;

    let hit = find_cache_hit(callbacks.as_ref(), clock.as_ref(), "fp1", "fp2", "fs-1", "ppl-1")
        .await
        .expect("hit");
    assert_eq!(hit.run_id, "run-new");
}

#[tokio::test]
async fn lookup_honors_expiry_window() {
    let clock = Arc::new(FakeClock::new());
    let callbacks = MemoryCallbacks::new(clock.clone());
    log_entry(&callbacks, "run-1", "fp2", "60").await;

    clock.advance(Duration::from_secs(30));
    assert!(
        find_cache_hit(callbacks.as_ref(), clock.as_ref(), "fp1", "fp2", "fs-1", "ppl-1")
            .await
            .is_some(),
        "still inside the window"
    );

    clock.advance(Duration::from_secs(31));
    assert!(
        find_cache_hit(callbacks.as_ref(), clock.as_ref(), "fp1", "fp2", "fs-1", "ppl-1")
            .await
            .is_none(),
        "expired"
    );
}

#[tokio::test]
async fn never_expiring_entries_survive_any_clock() {
    let clock = Arc::new(FakeClock::new());
    let callbacks = MemoryCallbacks::new(clock.clone());
    log_entry(&callbacks, "run-1", "fp2", "-1").await;

    clock.advance(Duration::from_secs(100_000_000));
    assert!(
        find_cache_hit(callbacks.as_ref(), clock.as_ref(), "fp1", "fp2", "fs-1", "ppl-1")
            .await
            .is_some()
    );
}

#[tokio::test]
async fn mismatched_scope_misses() {
    let clock = Arc::new(FakeClock::new());
    let callbacks = MemoryCallbacks::new(clock.clone());
    log_entry(&callbacks, "run-1", "fp2", "-1").await;

    assert!(
        find_cache_hit(callbacks.as_ref(), clock.as_ref(), "fp1", "fp2", "fs-2", "ppl-1")
            .await
            .is_none(),
        "different fs scope"
    );
    assert!(
        find_cache_hit(callbacks.as_ref(), clock.as_ref(), "other", "fp2", "fs-1", "ppl-1")
            .await
            .is_none(),
        "different first fingerprint"
    );
}
