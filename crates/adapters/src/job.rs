// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job backend abstraction.
//!
//! A [`Job`] is one backend submission owned by a step runtime. The backend
//! watches the job asynchronously and posts [`WorkflowEvent`]s onto the
//! inbox sender handed over at creation; the step runtime never polls.

use async_trait::async_trait;
use dagrun_core::{Artifacts, RuntimeStatus, WorkflowEvent};
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from job backend operations.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job validation failed: {0}")]
    Validate(String),
    #[error("job start failed: {0}")]
    Start(String),
    #[error("job stop failed: {0}")]
    Stop(String),
    #[error("job has not been started")]
    NotStarted,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Resolved values applied to a job before submission.
#[derive(Debug, Clone, Default)]
pub struct JobValues {
    pub command: String,
    pub parameters: IndexMap<String, String>,
    pub env: IndexMap<String, String>,
    pub artifacts: Artifacts,
}

/// Snapshot of a job's backend-side state, used to build persisted views.
#[derive(Debug, Clone, Default)]
pub struct JobInfo {
    /// Backend job id; empty until started.
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: RuntimeStatus,
    pub command: String,
    pub parameters: IndexMap<String, String>,
    pub env: IndexMap<String, String>,
    pub artifacts: Artifacts,
    /// `YYYY-MM-DD HH:MM:SS` local time; empty until started.
    pub start_time: String,
    /// Set once the backend reports a terminal status.
    pub end_time: String,
}

/// One backend job, owned by a single step runtime.
#[async_trait]
pub trait Job: Send + Sync {
    /// Current backend-side snapshot.
    fn info(&self) -> JobInfo;

    /// Apply resolved command, parameters, env, and artifacts.
    fn update(&mut self, values: JobValues);

    /// Pre-submission sanity check.
    fn validate(&self) -> Result<(), JobError>;

    /// Non-blocking submission. Returns the backend job id. Watching starts
    /// as a side effect; status updates arrive on the inbox.
    async fn start(&mut self) -> Result<String, JobError>;

    /// Best-effort cancellation. Terminal status still arrives via the watch
    /// stream once the backend confirms.
    async fn stop(&mut self) -> Result<(), JobError>;

    /// Re-attach to an existing backend job after a restart; resumes
    /// watching without resubmitting.
    async fn attach(&mut self, job_id: &str) -> Result<(), JobError>;

    /// Whether `start` (or `attach`) has been called successfully.
    fn started(&self) -> bool;
}

/// Factory for [`Job`]s against one backend.
pub trait JobBackend: Send + Sync {
    /// Create an unsubmitted job. The backend keeps the inbox sender and
    /// posts `JobUpdate` / `JobWatchErr` events on it once the job runs.
    fn create_job(
        &self,
        name: &str,
        image: &str,
        inbox: mpsc::Sender<WorkflowEvent>,
    ) -> Box<dyn Job>;
}
