// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted runtime views.
//!
//! Views are what the external store keeps per runtime and what a resumed
//! run is rehydrated from. They are always fully populated; `end_time` is
//! set only once the runtime is terminal.

use crate::component::Artifacts;
use crate::status::RuntimeStatus;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persisted view of one step runtime and its backend job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: String,
    pub job_name: String,
    /// Full component name (dotted ancestry path) of the emitting step.
    #[serde(default)]
    pub step_name: String,
    pub command: String,
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
    #[serde(default)]
    pub env: IndexMap<String, String>,
    pub status: RuntimeStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub deps: Vec<String>,
    /// Container image of the job.
    #[serde(default)]
    pub docker_env: String,
    #[serde(default)]
    pub artifacts: Artifacts,
    /// `YYYY-MM-DD HH:MM:SS` local time; empty until the job started.
    #[serde(default)]
    pub start_time: String,
    /// Set only for terminal statuses.
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub parent_dag_id: String,
    /// Run whose successful job this step reused, when the cache matched.
    #[serde(default)]
    pub cache_run_id: String,
    #[serde(default)]
    pub cache_job_id: String,
    #[serde(default)]
    pub seq: usize,
}

/// Persisted view of one dag runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DagView {
    pub dag_id: String,
    pub name: String,
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
    #[serde(default)]
    pub artifacts: Artifacts,
    #[serde(default)]
    pub deps: Vec<String>,
    pub status: RuntimeStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub parent_dag_id: String,
    #[serde(default)]
    pub seq: usize,
    /// Child views, one entry per child short-name, one view per seq.
    #[serde(default)]
    pub entry_points: IndexMap<String, Vec<ComponentView>>,
}

/// Either kind of persisted view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentView {
    Job(JobView),
    Dag(DagView),
}

impl ComponentView {
    pub fn status(&self) -> RuntimeStatus {
        match self {
            ComponentView::Job(v) => v.status,
            ComponentView::Dag(v) => v.status,
        }
    }

    pub fn seq(&self) -> usize {
        match self {
            ComponentView::Job(v) => v.seq,
            ComponentView::Dag(v) => v.seq,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ComponentView::Job(v) => &v.job_name,
            ComponentView::Dag(v) => &v.name,
        }
    }
}

/// Final view of a whole run, flushed by the run driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunView {
    pub run_id: String,
    pub status: RuntimeStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub entry_points: IndexMap<String, Vec<ComponentView>>,
}

/// Persisted job views of a previous attempt, keyed by runtime name
/// (`full_name-seq`). The restart path consults this to decide, per step,
/// whether to adopt, re-attach, or start fresh.
#[derive(Debug, Clone, Default)]
pub struct RunStateView {
    pub jobs: HashMap<String, JobView>,
}

impl RunStateView {
    pub fn job(&self, runtime_name: &str) -> Option<&JobView> {
        self.jobs.get(runtime_name)
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
