// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference resolution for the five templated slots: parameters, env,
//! command, condition, loop_argument.
//!
//! Reference syntax is `{{ scope.name }}` where `scope` is a sibling
//! component short-name or the literal `PF` for system parameters, and
//! `{{ name }}` for the component's own parameters and artifacts.

use crate::error::ResolveError;
use dagrun_core::{Artifacts, RunConfig};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

/// Regex pattern for `{{ name }}` or `{{ scope.name }}`.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static REF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_-]*(?:\.[a-zA-Z_][a-zA-Z0-9_-]*)?)\s*\}\}")
        .expect("constant regex pattern is valid")
});

pub const SYS_PARAM_RUN_ID: &str = "PF_RUN_ID";
pub const SYS_PARAM_FS_ID: &str = "PF_FS_ID";
pub const SYS_PARAM_FS_NAME: &str = "PF_FS_NAME";
pub const SYS_PARAM_STEP_NAME: &str = "PF_STEP_NAME";
pub const SYS_PARAM_USER_NAME: &str = "PF_USER_NAME";
pub const SYS_PARAM_LOOP_ARGUMENT: &str = "PF_LOOP_ARGUMENT";

/// Env var name exposing an input artifact path to the job.
pub fn input_artifact_env_name(artifact_name: &str) -> String {
    format!("PF_INPUT_ARTIFACT_{}", artifact_name.to_uppercase())
}

/// Env var name exposing an output artifact path to the job.
pub fn output_artifact_env_name(artifact_name: &str) -> String {
    format!("PF_OUTPUT_ARTIFACT_{}", artifact_name.to_uppercase())
}

/// Which substitutions apply.
///
/// Cache-fingerprint resolution leaves `PF` references and output artifact
/// paths intact so the first fingerprint stays stable across runs;
/// execution resolution substitutes everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    CacheFingerprint,
    Execution,
}

/// Terminal outputs of a sibling, consulted by downstream references.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSibling {
    pub parameters: IndexMap<String, String>,
    pub artifacts: Artifacts,
}

/// System parameters of one runtime instance.
pub fn build_sys_params(
    config: &RunConfig,
    step_name: &str,
    loop_value: Option<&Value>,
) -> IndexMap<String, String> {
    IndexMap::from([
        (SYS_PARAM_RUN_ID.to_string(), config.run_id.clone()),
        (SYS_PARAM_FS_ID.to_string(), config.fs_id.clone()),
        (SYS_PARAM_FS_NAME.to_string(), config.fs_name.clone()),
        (SYS_PARAM_STEP_NAME.to_string(), step_name.to_string()),
        (SYS_PARAM_USER_NAME.to_string(), config.user_name.clone()),
        (
            SYS_PARAM_LOOP_ARGUMENT.to_string(),
            loop_value.map(value_to_string).unwrap_or_default(),
        ),
    ])
}

/// Render a JSON value the way it appears in commands and env vars.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolves references inside one component runtime.
///
/// Holds the component's raw slots plus the context they resolve against:
/// sys params fixed at construction, and the sibling table snapshotted by
/// the parent dag when the instance became ready.
pub struct InnerSolver {
    component_full_name: String,
    raw_parameters: IndexMap<String, Value>,
    raw_env: IndexMap<String, String>,
    command: String,
    parameters: IndexMap<String, String>,
    artifacts: Artifacts,
    sys_params: IndexMap<String, String>,
    siblings: IndexMap<String, ResolvedSibling>,
}

impl InnerSolver {
    pub fn new(
        component_full_name: impl Into<String>,
        raw_parameters: IndexMap<String, Value>,
        raw_env: IndexMap<String, String>,
        command: impl Into<String>,
        artifacts: Artifacts,
        sys_params: IndexMap<String, String>,
        siblings: IndexMap<String, ResolvedSibling>,
    ) -> Self {
        Self {
            component_full_name: component_full_name.into(),
            raw_parameters,
            raw_env,
            command: command.into(),
            parameters: IndexMap::new(),
            artifacts,
            sys_params,
            siblings,
        }
    }

    /// Resolve the declared parameters in declaration order. Earlier
    /// parameters may be referenced by later ones.
    pub fn resolve_parameters(&mut self) -> Result<(), ResolveError> {
        let raw = self.raw_parameters.clone();
        for (name, value) in &raw {
            let resolved = match value {
                Value::String(s) => self.resolve_text(s, ResolveMode::Execution)?,
                other => value_to_string(other),
            };
            self.parameters.insert(name.clone(), resolved);
        }
        Ok(())
    }

    /// Resolve input artifact references. Output paths stay empty until the
    /// resource handler fills them.
    pub fn resolve_artifacts(&mut self) -> Result<(), ResolveError> {
        let inputs = self.artifacts.input.clone();
        for (name, value) in &inputs {
            let resolved = self.resolve_text(value, ResolveMode::Execution)?;
            self.artifacts.input.insert(name.clone(), resolved);
        }
        Ok(())
    }

    pub fn set_output_artifact(&mut self, name: &str, path: String) {
        self.artifacts.output.insert(name.to_string(), path);
    }

    /// Copy output artifact paths from a cached job's view. Every declared
    /// output must be present there.
    pub fn adopt_output_artifacts(
        &mut self,
        cached: &IndexMap<String, String>,
    ) -> Result<(), ResolveError> {
        let names: Vec<String> = self.artifacts.output.keys().cloned().collect();
        for name in names {
            let path = cached.get(&name).ok_or_else(|| ResolveError::UnknownReference {
                reference: name.clone(),
                component: self.component_full_name.clone(),
            })?;
            self.artifacts.output.insert(name, path.clone());
        }
        Ok(())
    }

    /// Replace resolved parameters wholesale, as rehydrated from a view.
    pub fn adopt_parameters(&mut self, parameters: IndexMap<String, String>) {
        self.parameters = parameters;
    }

    /// Replace artifacts wholesale, as rehydrated from a view.
    pub fn adopt_artifacts(&mut self, artifacts: Artifacts) {
        self.artifacts = artifacts;
    }

    pub fn parameters(&self) -> &IndexMap<String, String> {
        &self.parameters
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    pub fn sys_params(&self) -> &IndexMap<String, String> {
        &self.sys_params
    }

    /// Resolve the condition expression for evaluation.
    pub fn resolve_condition(&self, condition: &str) -> Result<String, ResolveError> {
        self.resolve_text(condition, ResolveMode::Execution)
    }

    /// The command with substitutions for the given mode applied.
    pub fn resolve_command(&self, mode: ResolveMode) -> Result<String, ResolveError> {
        self.resolve_text(&self.command, mode)
    }

    /// The env map handed to the job.
    ///
    /// Execution mode additionally exports sys params and artifact paths as
    /// `PF_*` variables; cache-fingerprint mode leaves them out so the
    /// fingerprint only sees declared env.
    pub fn resolve_env(&self, mode: ResolveMode) -> Result<IndexMap<String, String>, ResolveError> {
        let mut env = IndexMap::new();
        for (name, value) in &self.raw_env {
            env.insert(name.clone(), self.resolve_text(value, mode)?);
        }

        if mode == ResolveMode::Execution {
            for (name, value) in &self.sys_params {
                env.insert(name.clone(), value.clone());
            }
            for (name, path) in &self.artifacts.input {
                env.insert(input_artifact_env_name(name), path.clone());
            }
            for (name, path) in &self.artifacts.output {
                env.insert(output_artifact_env_name(name), path.clone());
            }
        }
        Ok(env)
    }

    /// Expand a loop argument into the per-seq values.
    ///
    /// Accepts a JSON array, a template resolving to a JSON array, or a
    /// comma-separated string. An empty sequence means the component is
    /// skipped.
    pub fn resolve_loop(&self, raw: &Value) -> Result<Vec<Value>, ResolveError> {
        match raw {
            Value::Array(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => resolved.push(Value::String(
                            self.resolve_text(s, ResolveMode::Execution)?,
                        )),
                        other => resolved.push(other.clone()),
                    }
                }
                Ok(resolved)
            }
            Value::String(s) => {
                let resolved = self.resolve_text(s, ResolveMode::Execution)?;
                let trimmed = resolved.trim();
                if trimmed.is_empty() {
                    return Ok(Vec::new());
                }
                if trimmed.starts_with('[') {
                    let parsed: Value = serde_json::from_str(trimmed).map_err(|e| {
                        ResolveError::BadLoopArgument {
                            component: self.component_full_name.clone(),
                            detail: e.to_string(),
                        }
                    })?;
                    return match parsed {
                        Value::Array(items) => Ok(items),
                        _ => Err(ResolveError::BadLoopArgument {
                            component: self.component_full_name.clone(),
                            detail: "expected a JSON array".to_string(),
                        }),
                    };
                }
                Ok(trimmed
                    .split(',')
                    .map(|part| Value::String(part.trim().to_string()))
                    .collect())
            }
            other => Err(ResolveError::BadLoopArgument {
                component: self.component_full_name.clone(),
                detail: format!("unsupported loop_argument: {other}"),
            }),
        }
    }

    /// Substitute every `{{ ... }}` reference in `text`.
    pub fn resolve_text(&self, text: &str, mode: ResolveMode) -> Result<String, ResolveError> {
        let mut first_err = None;
        let resolved = REF_PATTERN
            .replace_all(text, |caps: &Captures| {
                match self.lookup(&caps[1], &caps[0], mode) {
                    Ok(value) => value,
                    Err(err) => {
                        first_err.get_or_insert(err);
                        String::new()
                    }
                }
            })
            .to_string();
        match first_err {
            Some(err) => Err(err),
            None => Ok(resolved),
        }
    }

    fn lookup(
        &self,
        reference: &str,
        original: &str,
        mode: ResolveMode,
    ) -> Result<String, ResolveError> {
        let unknown = || ResolveError::UnknownReference {
            reference: reference.to_string(),
            component: self.component_full_name.clone(),
        };

        if let Some(rest) = reference.strip_prefix("PF.") {
            if mode == ResolveMode::CacheFingerprint {
                return Ok(original.to_string());
            }
            let key = format!("PF_{rest}");
            return self.sys_params.get(&key).cloned().ok_or_else(unknown);
        }

        if let Some((scope, name)) = reference.split_once('.') {
            let sibling = self.siblings.get(scope).ok_or_else(unknown)?;
            return sibling
                .parameters
                .get(name)
                .or_else(|| sibling.artifacts.output.get(name))
                .or_else(|| sibling.artifacts.input.get(name))
                .cloned()
                .ok_or_else(unknown);
        }

        if let Some(value) = self.parameters.get(reference) {
            return Ok(value.clone());
        }
        if let Some(path) = self.artifacts.input.get(reference) {
            return Ok(path.clone());
        }
        if let Some(path) = self.artifacts.output.get(reference) {
            if mode == ResolveMode::CacheFingerprint {
                return Ok(original.to_string());
            }
            return Ok(path.clone());
        }
        Err(unknown())
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
