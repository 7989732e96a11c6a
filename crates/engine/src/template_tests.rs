// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn test_config() -> RunConfig {
    RunConfig::new("run-1")
        .fs_id("fs-1")
        .fs_name("shared")
        .user_name("alice")
        .pipeline_source("ppl-1")
}

fn sibling_with(param: (&str, &str), output: (&str, &str)) -> ResolvedSibling {
    let mut sibling = ResolvedSibling::default();
    sibling.parameters.insert(param.0.to_string(), param.1.to_string());
    sibling.artifacts.output.insert(output.0.to_string(), output.1.to_string());
    sibling
}

fn solver(siblings: IndexMap<String, ResolvedSibling>) -> InnerSolver {
    let sys = build_sys_params(&test_config(), "transform", Some(&json!("2")));
    let mut artifacts = Artifacts::default();
    artifacts.input.insert("rows".to_string(), "{{ extract.rows }}".to_string());
    artifacts.output.insert("report".to_string(), String::new());
    InnerSolver::new(
        "wf.transform",
        IndexMap::from([
            ("threshold".to_string(), json!(5)),
            ("upstream_count".to_string(), json!("{{ extract.count }}")),
        ]),
        IndexMap::from([("MODE".to_string(), "t-{{ threshold }}".to_string())]),
        "run --rows {{ rows }} --out {{ report }} --run {{ PF.RUN_ID }}",
        artifacts,
        sys,
        siblings,
    )
}

fn ready_solver() -> InnerSolver {
    let siblings = IndexMap::from([(
        "extract".to_string(),
        sibling_with(("count", "42"), ("rows", "/fs/run-1/extract-0/rows")),
    )]);
    let mut s = solver(siblings);
    s.resolve_parameters().unwrap();
    s.resolve_artifacts().unwrap();
    s
}

#[test]
fn sys_params_include_loop_argument() {
    let sys = build_sys_params(&test_config(), "transform", Some(&json!(3)));
    assert_eq!(sys[SYS_PARAM_RUN_ID], "run-1");
    assert_eq!(sys[SYS_PARAM_STEP_NAME], "transform");
    assert_eq!(sys[SYS_PARAM_USER_NAME], "alice");
    assert_eq!(sys[SYS_PARAM_LOOP_ARGUMENT], "3");

    let no_loop = build_sys_params(&test_config(), "transform", None);
    assert_eq!(no_loop[SYS_PARAM_LOOP_ARGUMENT], "");
}

#[test]
fn parameters_resolve_sibling_references() {
    let s = ready_solver();
    assert_eq!(s.parameters()["threshold"], "5");
    assert_eq!(s.parameters()["upstream_count"], "42");
}

#[test]
fn input_artifacts_resolve_to_sibling_output_paths() {
    let s = ready_solver();
    assert_eq!(s.artifacts().input["rows"], "/fs/run-1/extract-0/rows");
}

#[test]
fn unknown_reference_fails() {
    let mut s = solver(IndexMap::new());
    let err = s.resolve_parameters().unwrap_err();
    match err {
        ResolveError::UnknownReference { reference, component } => {
            assert_eq!(reference, "extract.count");
            assert_eq!(component, "wf.transform");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn execution_command_substitutes_everything() {
    let mut s = ready_solver();
    s.set_output_artifact("report", "/fs/run-1/transform-0/report".to_string());
    let command = s.resolve_command(ResolveMode::Execution).unwrap();
    assert_eq!(
        command,
        "run --rows /fs/run-1/extract-0/rows --out /fs/run-1/transform-0/report --run run-1"
    );
}

#[test]
fn cache_command_keeps_pf_and_output_placeholders() {
    let s = ready_solver();
    let command = s.resolve_command(ResolveMode::CacheFingerprint).unwrap();
    assert!(command.contains("{{ report }}"), "output placeholder kept: {command}");
    assert!(command.contains("{{ PF.RUN_ID }}"), "PF placeholder kept: {command}");
    assert!(command.contains("/fs/run-1/extract-0/rows"), "input substituted: {command}");
}

#[test]
fn execution_env_exports_sys_and_artifact_vars() {
    let mut s = ready_solver();
    s.set_output_artifact("report", "/out/report".to_string());
    let env = s.resolve_env(ResolveMode::Execution).unwrap();
    assert_eq!(env["MODE"], "t-5");
    assert_eq!(env[SYS_PARAM_RUN_ID], "run-1");
    assert_eq!(env[SYS_PARAM_LOOP_ARGUMENT], "2");
    assert_eq!(env["PF_INPUT_ARTIFACT_ROWS"], "/fs/run-1/extract-0/rows");
    assert_eq!(env["PF_OUTPUT_ARTIFACT_REPORT"], "/out/report");
}

#[test]
fn cache_env_excludes_sys_and_artifact_vars() {
    let s = ready_solver();
    let env = s.resolve_env(ResolveMode::CacheFingerprint).unwrap();
    assert_eq!(env.len(), 1);
    assert_eq!(env["MODE"], "t-5");
}

#[test]
fn adopt_output_artifacts_requires_every_declared_output() {
    let mut s = ready_solver();
    let cached = IndexMap::from([("report".to_string(), "/old/report".to_string())]);
    s.adopt_output_artifacts(&cached).unwrap();
    assert_eq!(s.artifacts().output["report"], "/old/report");

    let empty = IndexMap::new();
    assert!(s.adopt_output_artifacts(&empty).is_err());
}

#[test]
fn loop_argument_forms() {
    let s = ready_solver();

    let array = s.resolve_loop(&json!([1, 2, 3])).unwrap();
    assert_eq!(array, vec![json!(1), json!(2), json!(3)]);

    let json_string = s.resolve_loop(&json!("[\"a\", \"b\"]")).unwrap();
    assert_eq!(json_string, vec![json!("a"), json!("b")]);

    let comma = s.resolve_loop(&json!("x, y")).unwrap();
    assert_eq!(comma, vec![json!("x"), json!("y")]);

    let templated = s.resolve_loop(&json!("{{ upstream_count }}")).unwrap();
    assert_eq!(templated, vec![json!("42")]);

    let empty = s.resolve_loop(&json!("")).unwrap();
    assert!(empty.is_empty());

    assert!(s.resolve_loop(&json!(12)).is_err());
    assert!(s.resolve_loop(&json!("[broken")).is_err());
}

#[test]
fn artifact_env_names_are_uppercased() {
    assert_eq!(input_artifact_env_name("rows"), "PF_INPUT_ARTIFACT_ROWS");
    assert_eq!(output_artifact_env_name("report-v2"), "PF_OUTPUT_ARTIFACT_REPORT-V2");
}
