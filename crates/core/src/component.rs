// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static component tree parsed from a workflow source.
//!
//! Components describe *what* to run; they are never mutated by execution.
//! One component may fan out into several runtime instances when it carries
//! a loop argument.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input and output artifact declarations of a component.
///
/// Keys are artifact names. For a step's outputs the values start empty and
/// are filled with generated paths at runtime; inputs reference upstream
/// outputs via `{{ sibling.name }}` templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    #[serde(default)]
    pub input: IndexMap<String, String>,
    #[serde(default)]
    pub output: IndexMap<String, String>,
}

impl Artifacts {
    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_empty()
    }
}

/// Cache policy of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    #[serde(default)]
    pub enable: bool,
    /// Seconds a cache entry stays valid, or `"-1"` for never expiring.
    #[serde(default = "default_max_expired_time")]
    pub max_expired_time: String,
    #[serde(default)]
    pub fs_scope: String,
}

fn default_max_expired_time() -> String {
    crate::cache::CACHE_EXPIRED_TIME_NEVER.to_string()
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enable: false,
            max_expired_time: default_max_expired_time(),
            fs_scope: String::new(),
        }
    }
}

/// Run-level policy governing sibling cancellation on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStrategy {
    /// Failures do not cancel siblings; the dag finishes everything it can.
    ContinueAfterFail,
    /// The first child failure stops all not-yet-terminal siblings.
    FailFast,
}

impl Default for FailureStrategy {
    fn default() -> Self {
        FailureStrategy::FailFast
    }
}

crate::simple_display! {
    FailureStrategy {
        ContinueAfterFail => "continue_after_fail",
        FailFast => "fail_fast",
    }
}

/// A leaf component: one container-image job per runtime instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,
    /// Container image the job runs in.
    #[serde(default)]
    pub docker_env: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
    #[serde(default)]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub artifacts: Artifacts,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_argument: Option<Value>,
    #[serde(default)]
    pub cache: CachePolicy,
}

/// An interior component grouping children with dependencies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DagSpec {
    pub name: String,
    /// Named children; dependency edges stay inside this set.
    #[serde(default)]
    pub entry_points: IndexMap<String, Component>,
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
    #[serde(default)]
    pub artifacts: Artifacts,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_argument: Option<Value>,
}

/// Either a step or a dag, as the workflow source declares it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Step(StepSpec),
    Dag(DagSpec),
}

impl Component {
    pub fn name(&self) -> &str {
        match self {
            Component::Step(s) => &s.name,
            Component::Dag(d) => &d.name,
        }
    }

    pub fn condition(&self) -> Option<&str> {
        match self {
            Component::Step(s) => s.condition.as_deref(),
            Component::Dag(d) => d.condition.as_deref(),
        }
    }

    pub fn loop_argument(&self) -> Option<&Value> {
        match self {
            Component::Step(s) => s.loop_argument.as_ref(),
            Component::Dag(d) => d.loop_argument.as_ref(),
        }
    }

    pub fn parameters(&self) -> &IndexMap<String, Value> {
        match self {
            Component::Step(s) => &s.parameters,
            Component::Dag(d) => &d.parameters,
        }
    }

    pub fn artifacts(&self) -> &Artifacts {
        match self {
            Component::Step(s) => &s.artifacts,
            Component::Dag(d) => &d.artifacts,
        }
    }

    /// Dependency short-names, split on commas and trimmed.
    ///
    /// Sources may write `deps = ["a", "b"]` or `deps = ["a,b"]`; both forms
    /// yield the same list.
    pub fn deps(&self) -> Vec<String> {
        let raw = match self {
            Component::Step(s) => &s.deps,
            Component::Dag(d) => &d.deps,
        };
        split_deps(raw)
    }

    pub fn is_step(&self) -> bool {
        matches!(self, Component::Step(_))
    }
}

/// A parsed workflow: the component tree plus run-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSource {
    pub name: String,
    #[serde(default)]
    pub entry_points: IndexMap<String, Component>,
    /// Upper bound on concurrently running step runtimes.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Full names of components excluded from execution.
    #[serde(default)]
    pub disabled: Vec<String>,
    #[serde(default)]
    pub failure_options: FailureStrategy,
}

fn default_parallelism() -> usize {
    10
}

/// Split raw dependency entries on commas and trim whitespace.
pub fn split_deps(deps: &[String]) -> Vec<String> {
    deps.iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|dep| !dep.is_empty())
        .map(str::to_string)
        .collect()
}

impl WorkflowSource {
    /// Whether the component with the given full name is in the disabled list.
    pub fn is_disabled(&self, component_full_name: &str) -> bool {
        self.disabled.iter().any(|name| name == component_full_name)
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
