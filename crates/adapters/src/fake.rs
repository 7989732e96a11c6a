// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted in-memory job backend for tests.
//!
//! Each job follows a [`JobScript`]: it posts `Running` on its inbox, then
//! its scripted terminal status after a delay. `stop` cancels the script and
//! the job confirms with `Terminated`, mirroring how a real backend
//! acknowledges cancellation asynchronously.

use crate::job::{Job, JobBackend, JobError, JobInfo, JobValues};
use async_trait::async_trait;
use dagrun_core::{format_local, Clock, RuntimeStatus, SystemClock, WorkflowEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// What a fake job does once started.
#[derive(Debug, Clone)]
pub enum JobScript {
    /// Post `Running`, wait, post `Succeeded`.
    Succeed { delay: Duration },
    /// Post `Running`, wait, post `Failed`.
    Fail { delay: Duration },
    /// Post `Running` and wait for `stop`.
    HangUntilStopped,
    /// `start` errors without submitting.
    StartError(String),
    /// `validate` rejects the job.
    ValidateError(String),
}

impl Default for JobScript {
    fn default() -> Self {
        JobScript::Succeed { delay: Duration::from_millis(10) }
    }
}

#[derive(Default)]
struct BackendState {
    /// Scripts matched by substring against the job name.
    scripts: Vec<(String, JobScript)>,
    /// Remaining forced `stop` failures per name key.
    stop_errors: HashMap<String, u32>,
    started: Vec<String>,
    attached: Vec<String>,
    stopped: Vec<String>,
    running: usize,
    max_running: usize,
}

impl BackendState {
    fn script_for(&self, job_name: &str) -> JobScript {
        self.scripts
            .iter()
            .find(|(key, _)| job_name.contains(key.as_str()))
            .map(|(_, script)| script.clone())
            .unwrap_or_default()
    }
}

/// In-memory [`JobBackend`] recording every call for assertions.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script jobs whose name contains `key` (usually the step name).
    pub fn script(&self, key: impl Into<String>, script: JobScript) {
        self.state.lock().scripts.push((key.into(), script));
    }

    /// Make the first `count` stop calls for matching jobs fail.
    pub fn fail_first_stops(&self, key: impl Into<String>, count: u32) {
        self.state.lock().stop_errors.insert(key.into(), count);
    }

    /// Names of jobs that were submitted (not re-attached).
    pub fn started_jobs(&self) -> Vec<String> {
        self.state.lock().started.clone()
    }

    pub fn attached_jobs(&self) -> Vec<String> {
        self.state.lock().attached.clone()
    }

    pub fn stopped_jobs(&self) -> Vec<String> {
        self.state.lock().stopped.clone()
    }

    /// High-water mark of concurrently running jobs.
    pub fn max_running(&self) -> usize {
        self.state.lock().max_running
    }
}

impl JobBackend for FakeBackend {
    fn create_job(
        &self,
        name: &str,
        image: &str,
        inbox: mpsc::Sender<WorkflowEvent>,
    ) -> Box<dyn Job> {
        Box::new(FakeJob {
            name: name.to_string(),
            image: image.to_string(),
            id: String::new(),
            values: JobValues::default(),
            started: false,
            inbox,
            state: self.state.clone(),
            meta: Arc::new(Mutex::new(JobMeta::default())),
            stop_token: CancellationToken::new(),
        })
    }
}

#[derive(Default, Clone)]
struct JobMeta {
    status: RuntimeStatus,
    start_time: String,
    end_time: String,
}

struct FakeJob {
    name: String,
    image: String,
    id: String,
    values: JobValues,
    started: bool,
    inbox: mpsc::Sender<WorkflowEvent>,
    state: Arc<Mutex<BackendState>>,
    meta: Arc<Mutex<JobMeta>>,
    stop_token: CancellationToken,
}

impl FakeJob {
    fn spawn_watcher(&self, script: JobScript) {
        let inbox = self.inbox.clone();
        let state = self.state.clone();
        let meta = self.meta.clone();
        let token = self.stop_token.clone();
        tokio::spawn(async move {
            {
                let mut guard = state.lock();
                guard.running += 1;
                guard.max_running = guard.max_running.max(guard.running);
            }
            meta.lock().status = RuntimeStatus::Running;
            let _ = inbox.send(WorkflowEvent::job_status(RuntimeStatus::Running, "job running")).await;

            let (status, message) = match script {
                JobScript::Succeed { delay } => tokio::select! {
                    _ = tokio::time::sleep(delay) => (RuntimeStatus::Succeeded, "job finished"),
                    _ = token.cancelled() => (RuntimeStatus::Terminated, "job terminated by stop"),
                },
                JobScript::Fail { delay } => tokio::select! {
                    _ = tokio::time::sleep(delay) => (RuntimeStatus::Failed, "job exited nonzero"),
                    _ = token.cancelled() => (RuntimeStatus::Terminated, "job terminated by stop"),
                },
                JobScript::HangUntilStopped => {
                    token.cancelled().await;
                    (RuntimeStatus::Terminated, "job terminated by stop")
                }
                // start() rejects these before a watcher exists
                JobScript::StartError(_) | JobScript::ValidateError(_) => return,
            };

            state.lock().running -= 1;
            {
                let mut guard = meta.lock();
                guard.status = status;
                guard.end_time = format_local(SystemClock.epoch_ms());
            }
            let _ = inbox.send(WorkflowEvent::job_status(status, message)).await;
        });
    }
}

#[async_trait]
impl Job for FakeJob {
    fn info(&self) -> JobInfo {
        let meta = self.meta.lock().clone();
        JobInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            status: meta.status,
            command: self.values.command.clone(),
            parameters: self.values.parameters.clone(),
            env: self.values.env.clone(),
            artifacts: self.values.artifacts.clone(),
            start_time: meta.start_time,
            end_time: meta.end_time,
        }
    }

    fn update(&mut self, values: JobValues) {
        self.values = values;
    }

    fn validate(&self) -> Result<(), JobError> {
        match self.state.lock().script_for(&self.name) {
            JobScript::ValidateError(msg) => Err(JobError::Validate(msg)),
            _ => Ok(()),
        }
    }

    async fn start(&mut self) -> Result<String, JobError> {
        let script = self.state.lock().script_for(&self.name);
        if let JobScript::StartError(msg) = script {
            return Err(JobError::Start(msg));
        }
        self.id = format!("job-{}", Uuid::new_v4());
        self.started = true;
        self.meta.lock().start_time = format_local(SystemClock.epoch_ms());
        self.state.lock().started.push(self.name.clone());
        tracing::debug!(job = %self.name, id = %self.id, "fake job started");
        self.spawn_watcher(script);
        Ok(self.id.clone())
    }

    async fn stop(&mut self) -> Result<(), JobError> {
        if !self.started {
            return Err(JobError::NotStarted);
        }
        {
            let mut guard = self.state.lock();
            let remaining = guard
                .stop_errors
                .iter_mut()
                .find(|(key, _)| self.name.contains(key.as_str()))
                .map(|(_, n)| n);
            if let Some(n) = remaining {
                if *n > 0 {
                    *n -= 1;
                    return Err(JobError::Stop("backend rejected stop".to_string()));
                }
            }
            guard.stopped.push(self.name.clone());
        }
        tracing::debug!(job = %self.name, "fake job stop accepted");
        self.stop_token.cancel();
        Ok(())
    }

    async fn attach(&mut self, job_id: &str) -> Result<(), JobError> {
        let script = self.state.lock().script_for(&self.name);
        self.id = job_id.to_string();
        self.started = true;
        self.state.lock().attached.push(self.name.clone());
        self.spawn_watcher(script);
        Ok(())
    }

    fn started(&self) -> bool {
        self.started
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
