// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

fn step(name: &str) -> Component {
    Component::Step(StepSpec { name: name.to_string(), ..Default::default() })
}

#[test]
fn parse_workflow_source() {
    let source: WorkflowSource = serde_json::from_value(json!({
        "name": "etl",
        "parallelism": 2,
        "failure_options": "continue_after_fail",
        "disabled": ["etl.cleanup"],
        "entry_points": {
            "extract": {
                "type": "step",
                "name": "extract",
                "docker_env": "etl:v1",
                "command": "run extract",
                "artifacts": { "output": { "rows": "" } },
                "cache": { "enable": true, "max_expired_time": "600" }
            },
            "transform": {
                "type": "step",
                "name": "transform",
                "docker_env": "etl:v1",
                "command": "run transform {{ extract.rows }}",
                "deps": ["extract"],
                "artifacts": { "input": { "rows": "{{ extract.rows }}" } }
            }
        }
    }))
    .unwrap();

    assert_eq!(source.parallelism, 2);
    assert_eq!(source.failure_options, FailureStrategy::ContinueAfterFail);
    assert!(source.is_disabled("etl.cleanup"));
    assert!(!source.is_disabled("etl.extract"));

    let extract = &source.entry_points["extract"];
    assert!(extract.is_step());
    assert!(extract.deps().is_empty());
    match extract {
        Component::Step(s) => {
            assert!(s.cache.enable);
            assert_eq!(s.cache.max_expired_time, "600");
        }
        Component::Dag(_) => panic!("expected step"),
    }

    let transform = &source.entry_points["transform"];
    assert_eq!(transform.deps(), vec!["extract".to_string()]);
}

#[parameterized(
    plain = { vec!["a".into(), "b".into()], vec!["a", "b"] },
    comma = { vec!["a,b".into()], vec!["a", "b"] },
    spaced = { vec![" a , b ".into()], vec!["a", "b"] },
    empty_entries = { vec!["a,,b,".into()], vec!["a", "b"] },
)]
fn deps_splitting(raw: Vec<String>, expect: Vec<&str>) {
    let component = Component::Step(StepSpec {
        name: "s".to_string(),
        deps: raw,
        ..Default::default()
    });
    assert_eq!(component.deps(), expect);
}

#[test]
fn default_cache_policy_never_expires() {
    let policy = CachePolicy::default();
    assert!(!policy.enable);
    assert_eq!(policy.max_expired_time, crate::cache::CACHE_EXPIRED_TIME_NEVER);
}

#[test]
fn default_parallelism_applied_when_missing() {
    let source: WorkflowSource = serde_json::from_value(json!({ "name": "w" })).unwrap();
    assert_eq!(source.parallelism, 10);
}

#[test]
fn component_accessors_cover_both_kinds() {
    let dag = Component::Dag(DagSpec {
        name: "group".to_string(),
        condition: Some("{{ PF.run }} == 1".to_string()),
        entry_points: IndexMap::from([("inner".to_string(), step("inner"))]),
        ..Default::default()
    });
    assert_eq!(dag.name(), "group");
    assert_eq!(dag.condition(), Some("{{ PF.run }} == 1"));
    assert!(dag.loop_argument().is_none());
    assert!(!dag.is_step());
}
