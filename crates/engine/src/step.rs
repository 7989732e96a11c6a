// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step runtime: one backend job instance through its lifecycle.
//!
//! A step runtime takes a parallelism slot, resolves its templates, checks
//! the cache, submits its job, and then reacts to watcher events until it
//! reaches a terminal status. The slot is released exactly once, on the
//! first emission after the runtime becomes terminal.

use crate::cache_calc;
use crate::callbacks;
use crate::condition::ConditionEvaluator;
use crate::error::EngineError;
use crate::runtime::{generate_job_name, sync_event, RunEnv, RuntimeMeta};
use crate::template::{build_sys_params, InnerSolver, ResolveMode, ResolvedSibling};
use dagrun_core::component::split_deps;
use dagrun_core::{
    format_local, ArtifactKind, CacheStrategy, ComponentView, EventKind, JobView,
    LogArtifactRequest, LogCacheRequest, RuntimeStatus, StepSpec, WorkflowEvent,
};
use dagrun_adapters::{Job, JobValues};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How often a step re-reads the view of a still-running cached job.
const CACHE_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Backoff between failed stop attempts.
const STOP_RETRY_INTERVAL: Duration = Duration::from_secs(3);

enum CacheCheck {
    /// The step adopted a cached job's result and is terminal.
    Adopted,
    Miss,
}

#[derive(Default)]
struct StepState {
    job_id: String,
    start_time: String,
    end_time: String,
    first_fp: String,
    second_fp: String,
    cache_run_id: String,
    cache_job_id: String,
    job_values: JobValues,
    submitted: bool,
}

struct SlotState {
    holds: bool,
}

pub(crate) struct StepRuntime {
    meta: RuntimeMeta,
    spec: StepSpec,
    deps: Vec<String>,
    job_name: String,
    env: Arc<RunEnv>,
    ctx: CancellationToken,
    failure_ctx: CancellationToken,
    parent_tx: mpsc::Sender<WorkflowEvent>,
    inbox: Mutex<Option<mpsc::Receiver<WorkflowEvent>>>,
    /// Also serves as the process-job lock: the done-check before `start`
    /// and the whole stop path are serialized through it.
    job: tokio::sync::Mutex<Box<dyn Job>>,
    solver: Mutex<InnerSolver>,
    state: Mutex<StepState>,
    slot: Mutex<SlotState>,
}

impl StepRuntime {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        full_name: String,
        spec: StepSpec,
        seq: usize,
        loop_value: Option<Value>,
        siblings: IndexMap<String, ResolvedSibling>,
        parent_dag_id: String,
        ctx: CancellationToken,
        failure_ctx: CancellationToken,
        parent_tx: mpsc::Sender<WorkflowEvent>,
        env: Arc<RunEnv>,
    ) -> Arc<Self> {
        let sys_params = build_sys_params(&env.config, &spec.name, loop_value.as_ref());
        let (inbox_tx, inbox_rx) = mpsc::channel(16);
        let job_name = generate_job_name(&env.config.run_id, &spec.name, seq);
        let job = env.backend.create_job(&job_name, &spec.docker_env, inbox_tx);
        let solver = InnerSolver::new(
            full_name.clone(),
            spec.parameters.clone(),
            spec.env.clone(),
            spec.command.clone(),
            spec.artifacts.clone(),
            sys_params,
            siblings,
        );
        let deps = split_deps(&spec.deps);
        let meta = RuntimeMeta::new(full_name, spec.name.clone(), seq, parent_dag_id);

        tracing::debug!(
            step = %meta.name,
            run = %env.config.run_id,
            image = %spec.docker_env,
            "created step runtime"
        );

        Arc::new(Self {
            meta,
            spec,
            deps,
            job_name,
            env,
            ctx,
            failure_ctx,
            parent_tx,
            inbox: Mutex::new(Some(inbox_rx)),
            job: tokio::sync::Mutex::new(job),
            solver: Mutex::new(solver),
            state: Mutex::new(StepState::default()),
            slot: Mutex::new(SlotState { holds: false }),
        })
    }

    pub(crate) fn runtime_name(&self) -> &str {
        &self.meta.name
    }

    /// Run the step from scratch.
    pub(crate) async fn start(self: Arc<Self>) {
        // a step waiting for a slot is still cancellable
        tokio::select! {
            () = self.env.gate.increase() => {}
            _ = self.ctx.cancelled() => {
                self.finish_abnormal(RuntimeStatus::Cancelled, "receive stop signal").await;
                return;
            }
            _ = self.failure_ctx.cancelled() => {
                self.finish_abnormal(
                    RuntimeStatus::Cancelled,
                    "stop by failure options, some component has been failed",
                )
                .await;
                return;
            }
        }
        self.slot.lock().holds = true;
        tracing::debug!(
            step = %self.meta.name,
            parallelism = self.env.gate.current_parallelism(),
            "begin to run step"
        );

        let resolve_err = {
            let mut solver = self.solver.lock();
            solver.resolve_parameters().and_then(|()| solver.resolve_artifacts()).err()
        };
        if let Some(err) = resolve_err {
            let msg = format!("resolve templates for step [{}] failed: {err}", self.meta.name);
            self.finish_abnormal(RuntimeStatus::Failed, &msg).await;
            return;
        }

        match self.should_run() {
            Err(err) => {
                let msg = format!(
                    "calculate the condition field for step [{}] failed: {err}",
                    self.meta.name
                );
                self.finish_abnormal(RuntimeStatus::Failed, &msg).await;
                return;
            }
            Ok(false) => {
                let msg = format!(
                    "the condition of step [{}] evaluates to false, skip running",
                    self.meta.name
                );
                tracing::info!("{msg}");
                self.finish_abnormal(RuntimeStatus::Skipped, &msg).await;
                return;
            }
            Ok(true) => {}
        }

        if self.env.source.is_disabled(&self.meta.full_name) {
            let msg = format!("step [{}] is disabled, skip running", self.meta.name);
            tracing::info!("{msg}");
            self.finish_abnormal(RuntimeStatus::Skipped, &msg).await;
            return;
        }

        Self::spawn_listener(&self);

        if let Err(err) = self.execute().await {
            if !self.meta.is_done() {
                self.finish_abnormal(RuntimeStatus::Failed, &err.to_string()).await;
            }
        }
    }

    /// Construct-and-terminate path: used by the parent when the step
    /// cannot be scheduled at all (loop or dependency trouble).
    pub(crate) async fn start_with_status(
        self: Arc<Self>,
        status: RuntimeStatus,
        message: &str,
    ) {
        if self.meta.update_status(status) {
            if status.is_terminal() {
                self.state.lock().end_time = format_local(self.env.clock.epoch_ms());
            }
            self.sync(EventKind::JobUpdate, message).await;
        }
    }

    /// Resume from a persisted view.
    ///
    /// `Succeeded` is adopted outright; `Running` re-attaches the watcher to
    /// the recorded backend job; everything else starts fresh.
    pub(crate) async fn restart(self: Arc<Self>, view: JobView) {
        match view.status {
            RuntimeStatus::Succeeded => {
                {
                    let mut solver = self.solver.lock();
                    solver.adopt_parameters(view.parameters.clone());
                    solver.adopt_artifacts(view.artifacts.clone());
                }
                {
                    let mut state = self.state.lock();
                    state.job_id = view.job_id.clone();
                    state.start_time = view.start_time.clone();
                    state.end_time = view.end_time.clone();
                    state.cache_run_id = view.cache_run_id.clone();
                    state.cache_job_id = view.cache_job_id.clone();
                    state.job_values.command = view.command.clone();
                    state.job_values.env = view.env.clone();
                }
                let msg = format!(
                    "step [{}] adopted from previous run, no resubmission",
                    self.meta.name
                );
                tracing::info!("{msg}");
                if self.meta.update_status(RuntimeStatus::Succeeded) {
                    self.sync(EventKind::JobUpdate, &msg).await;
                }
            }
            RuntimeStatus::Running => {
                self.env.gate.increase().await;
                self.slot.lock().holds = true;

                {
                    let mut solver = self.solver.lock();
                    solver.adopt_parameters(view.parameters.clone());
                    solver.adopt_artifacts(view.artifacts.clone());
                }
                {
                    let mut state = self.state.lock();
                    state.job_id = view.job_id.clone();
                    state.start_time = view.start_time.clone();
                    state.job_values.command = view.command.clone();
                    state.job_values.env = view.env.clone();
                    state.submitted = true;
                }

                Self::spawn_listener(&self);

                let attach = {
                    let mut job = self.job.lock().await;
                    job.attach(&view.job_id).await
                };
                if let Err(err) = attach {
                    let msg = format!(
                        "re-attach to job [{}] for step [{}] failed: {err}",
                        view.job_id, self.meta.name
                    );
                    self.finish_abnormal(RuntimeStatus::Failed, &msg).await;
                    return;
                }

                if self.meta.update_status(RuntimeStatus::Running) {
                    let msg =
                        format!("step [{}] re-attached to running job", self.meta.name);
                    self.sync(EventKind::JobUpdate, &msg).await;
                }
            }
            _ => self.start().await,
        }
    }

    fn spawn_listener(this: &Arc<Self>) {
        let rx = this.inbox.lock().take();
        if let Some(rx) = rx {
            let this = this.clone();
            tokio::spawn(async move { this.listen(rx).await });
        }
    }

    fn should_run(&self) -> Result<bool, EngineError> {
        let resolved = match self.spec.condition.as_deref() {
            None => None,
            Some(raw) => Some(self.solver.lock().resolve_condition(raw)?),
        };
        Ok(ConditionEvaluator::should_run(resolved.as_deref())?)
    }

    /// Watcher loop: job events, hard cancel, failure-options cancel.
    async fn listen(self: Arc<Self>, mut rx: mpsc::Receiver<WorkflowEvent>) {
        let mut stopping = false;
        loop {
            tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(event) => {
                        self.process_job_event(event).await;
                        if self.meta.is_done() {
                            return;
                        }
                    }
                    None => return,
                },
                _ = self.ctx.cancelled(), if !stopping => {
                    stopping = true;
                    self.stop("receive stop signal").await;
                    if self.meta.is_done() {
                        return;
                    }
                }
                _ = self.failure_ctx.cancelled(), if !stopping => {
                    stopping = true;
                    self.stop("stop by failure options, some component has been failed").await;
                    if self.meta.is_done() {
                        return;
                    }
                }
            }
        }
    }

    async fn execute(&self) -> Result<(), EngineError> {
        tracing::info!(step = %self.meta.name, run = %self.env.config.run_id, "start execute step");

        if self.spec.cache.enable {
            if let CacheCheck::Adopted = self.check_cached().await? {
                return Ok(());
            }
        }

        if !self.spec.artifacts.output.is_empty() {
            self.generate_output_paths()?;
        }

        let values = self.build_job_values(ResolveMode::Execution)?;
        {
            let mut job = self.job.lock().await;
            job.update(values.clone());
            job.validate().map_err(|err| EngineError::Validate(err.to_string()))?;
        }
        self.state.lock().job_values = values;

        self.start_job().await?;
        self.log_artifacts(ArtifactKind::Input).await;
        Ok(())
    }

    /// Compute fingerprints and look for a reusable execution.
    async fn check_cached(&self) -> Result<CacheCheck, EngineError> {
        let (command, cache_env, parameters, input_paths) = {
            let solver = self.solver.lock();
            (
                solver.resolve_command(ResolveMode::CacheFingerprint)?,
                solver.resolve_env(ResolveMode::CacheFingerprint)?,
                solver.parameters().clone(),
                solver.artifacts().input.clone(),
            )
        };

        // validate the job shape before fingerprinting, like the execution
        // path does before submission
        {
            let mut job = self.job.lock().await;
            job.update(JobValues {
                command: command.clone(),
                parameters: parameters.clone(),
                env: cache_env,
                artifacts: self.solver.lock().artifacts().clone(),
            });
            job.validate().map_err(|err| EngineError::Validate(err.to_string()))?;
        }

        let param_names: Vec<String> = parameters.keys().cloned().collect();
        let input_names: Vec<String> = input_paths.keys().cloned().collect();
        let output_names: Vec<String> =
            self.spec.artifacts.output.keys().cloned().collect();
        let first_fp = cache_calc::first_fingerprint(
            &self.spec.docker_env,
            &command,
            &param_names,
            &input_names,
            &output_names,
        );

        let mut input_digests = IndexMap::new();
        for (name, path) in &input_paths {
            match self.env.resource.input_artifact_digest(path) {
                Ok(digest) => {
                    input_digests.insert(name.clone(), digest);
                }
                Err(err) => {
                    tracing::warn!(
                        step = %self.meta.name,
                        artifact = %name,
                        error = %err,
                        "input artifact digest failed, treating cache as miss"
                    );
                    self.state.lock().first_fp = first_fp;
                    return Ok(CacheCheck::Miss);
                }
            }
        }
        let second_fp = cache_calc::second_fingerprint(
            &parameters,
            &input_digests,
            &cache_calc::image_digest(&self.spec.docker_env),
        );

        {
            let mut state = self.state.lock();
            state.first_fp = first_fp.clone();
            state.second_fp = second_fp.clone();
        }

        let hit = cache_calc::find_cache_hit(
            self.env.callbacks.as_ref(),
            self.env.clock.as_ref(),
            &first_fp,
            &second_fp,
            &self.env.config.fs_id,
            &self.env.config.pipeline_source,
        )
        .await;

        match hit {
            None => {
                tracing::info!(
                    step = %self.meta.name,
                    first_fp = %first_fp,
                    "no cache found"
                );
                Ok(CacheCheck::Miss)
            }
            Some(entry) => {
                {
                    let mut state = self.state.lock();
                    state.cache_run_id = entry.run_id.clone();
                    state.cache_job_id = entry.job_id.clone();
                }
                tracing::info!(
                    step = %self.meta.name,
                    cache_run = %entry.run_id,
                    cache_job = %entry.job_id,
                    "cache found in former run"
                );
                self.adopt_cached().await
            }
        }
    }

    /// Follow a matched cache entry to its terminal outcome.
    ///
    /// A still-running cached job is polled until it terminates. An outcome
    /// of `Cancelled` or `Terminated` abandons the cache and runs fresh.
    async fn adopt_cached(&self) -> Result<CacheCheck, EngineError> {
        let cache_job_id = self.state.lock().cache_job_id.clone();
        loop {
            if self.meta.is_done() {
                // cancellation won while we were polling
                return Ok(CacheCheck::Adopted);
            }

            let view = match self
                .env
                .callbacks
                .get_job(&cache_job_id, &self.meta.full_name)
                .await
            {
                Ok(view) => view,
                Err(err) => {
                    tracing::warn!(
                        step = %self.meta.name,
                        cache_job = %cache_job_id,
                        error = %err,
                        "get cached job view failed, abandoning cache"
                    );
                    let mut state = self.state.lock();
                    state.cache_run_id.clear();
                    state.cache_job_id.clear();
                    return Ok(CacheCheck::Miss);
                }
            };

            match view.status {
                RuntimeStatus::Succeeded | RuntimeStatus::Failed => {
                    self.solver.lock().adopt_output_artifacts(&view.artifacts.output)?;
                    let values = self.build_job_values(ResolveMode::Execution)?;
                    let cache_run_id = {
                        let mut state = self.state.lock();
                        state.job_values = values;
                        state.end_time = format_local(self.env.clock.epoch_ms());
                        state.cache_run_id.clone()
                    };
                    let msg = format!(
                        "skip job for step [{}], use cache of run [{}]",
                        self.meta.name, cache_run_id
                    );
                    tracing::info!("{msg}");
                    if self.meta.update_status(view.status) {
                        self.sync(EventKind::JobUpdate, &msg).await;
                    }
                    return Ok(CacheCheck::Adopted);
                }
                RuntimeStatus::Init
                | RuntimeStatus::Pending
                | RuntimeStatus::Running
                | RuntimeStatus::Terminating => {
                    tokio::time::sleep(CACHE_POLL_INTERVAL).await;
                }
                RuntimeStatus::Cancelled | RuntimeStatus::Terminated | RuntimeStatus::Skipped => {
                    // nothing reusable came out of that job
                    let mut state = self.state.lock();
                    state.cache_run_id.clear();
                    state.cache_job_id.clear();
                    return Ok(CacheCheck::Miss);
                }
            }
        }
    }

    fn generate_output_paths(&self) -> Result<(), EngineError> {
        let names: Vec<String> = self.spec.artifacts.output.keys().cloned().collect();
        for name in names {
            let path = self
                .env
                .resource
                .output_artifact_path(
                    &self.env.source.name,
                    &self.env.config.run_id,
                    &self.meta.name,
                    &name,
                )
                .map_err(|err| {
                    EngineError::OutputArtifactPath(format!(
                        "output artifact [{name}] of step [{}]: {err}",
                        self.meta.name
                    ))
                })?;
            self.solver.lock().set_output_artifact(&name, path);
        }
        Ok(())
    }

    fn build_job_values(&self, mode: ResolveMode) -> Result<JobValues, EngineError> {
        let solver = self.solver.lock();
        Ok(JobValues {
            command: solver.resolve_command(mode)?,
            parameters: solver.parameters().clone(),
            env: solver.resolve_env(mode)?,
            artifacts: solver.artifacts().clone(),
        })
    }

    /// Submit the job unless cancellation already made the runtime terminal.
    async fn start_job(&self) -> Result<(), EngineError> {
        let mut job = self.job.lock().await;
        if self.meta.is_done() {
            return Ok(());
        }
        let job_id = job.start().await.map_err(|err| {
            EngineError::BackendStart(format!(
                "start job for step [{}] with run [{}] failed: {err}",
                self.meta.name, self.env.config.run_id
            ))
        })?;

        let mut state = self.state.lock();
        state.job_id = job_id;
        state.submitted = true;
        state.start_time = format_local(self.env.clock.epoch_ms());
        Ok(())
    }

    /// Stop the backend job, retrying with backoff until the backend
    /// accepts. Terminal status arrives via the watcher afterwards.
    async fn stop(&self, message: &str) {
        let mut job = self.job.lock().await;
        let submitted = self.state.lock().submitted;
        tracing::info!(
            step = %self.meta.name,
            submitted,
            "begin to stop step: {message}"
        );

        if self.meta.is_done() {
            return;
        }

        if !job.started() {
            // cancellation won the race with submission; the done flag set
            // here makes the pending start a no-op
            if self.meta.update_status(RuntimeStatus::Cancelled) {
                self.state.lock().end_time = format_local(self.env.clock.epoch_ms());
                drop(job);
                self.sync(EventKind::JobUpdate, message).await;
            }
            return;
        }

        let mut try_count = 1u32;
        loop {
            if self.meta.is_done() {
                return;
            }
            match job.stop().await {
                Ok(()) => return,
                Err(err) => {
                    let job_id = self.state.lock().job_id.clone();
                    let err_msg = format!(
                        "stop job [{job_id}] for step [{}] with run [{}] failed [{try_count}] times: {err}",
                        self.meta.name, self.env.config.run_id
                    );
                    tracing::error!("{err_msg}");
                    self.sync(EventKind::JobStopErr, &err_msg).await;
                    try_count += 1;
                    tokio::time::sleep(STOP_RETRY_INTERVAL).await;
                }
            }
        }
    }

    async fn process_job_event(&self, event: WorkflowEvent) {
        tracing::debug!(
            step = %self.meta.name,
            kind = %event.kind,
            status = %event.extra.status,
            "receive event from job"
        );

        if event.is_watch_err() {
            // persistence callback only; the watcher may recover, so the
            // status stays untouched and nothing bubbles to the parent
            let err_msg = format!(
                "receive watch error of job for step [{}]: {}",
                self.meta.name, event.message
            );
            tracing::error!("{err_msg}");
            let watch_event = self.build_event(EventKind::JobWatchErr, &err_msg);
            let _ = callbacks::update_with_retry(
                self.env.callbacks.as_ref(),
                &self.env.config.run_id,
                &watch_event,
            )
            .await;
            return;
        }

        let status = event.extra.status;
        if status.is_terminal() {
            self.state.lock().end_time = format_local(self.env.clock.epoch_ms());
        }
        if status == RuntimeStatus::Succeeded {
            self.log_artifacts(ArtifactKind::Output).await;
            self.maybe_log_cache().await;
        }

        if !self.meta.update_status(status) {
            return;
        }
        self.sync(EventKind::JobUpdate, &event.message).await;
    }

    /// Record a cache entry for a successful self-executed job.
    async fn maybe_log_cache(&self) {
        let req = {
            let state = self.state.lock();
            if !self.spec.cache.enable
                || !state.cache_run_id.is_empty()
                || state.first_fp.is_empty()
                || state.second_fp.is_empty()
            {
                return;
            }
            LogCacheRequest {
                first_fp: state.first_fp.clone(),
                second_fp: state.second_fp.clone(),
                source: self.env.config.pipeline_source.clone(),
                run_id: self.env.config.run_id.clone(),
                step_name: self.meta.name.clone(),
                job_id: state.job_id.clone(),
                fs_id: self.env.config.fs_id.clone(),
                fs_name: self.env.config.fs_name.clone(),
                user_name: self.env.config.user_name.clone(),
                expired_time: self.spec.cache.max_expired_time.clone(),
                strategy: CacheStrategy::Conservative,
            }
        };
        // a failed cache write never fails the step
        match self.env.callbacks.log_cache(req).await {
            Ok(_) => tracing::info!(step = %self.meta.name, "log cache success"),
            Err(err) => {
                tracing::error!(step = %self.meta.name, error = %err, "log cache failed")
            }
        }
    }

    async fn log_artifacts(&self, kind: ArtifactKind) {
        let (job_id, artifacts) = {
            let solver = self.solver.lock();
            let state = self.state.lock();
            let map = match kind {
                ArtifactKind::Input => solver.artifacts().input.clone(),
                ArtifactKind::Output => solver.artifacts().output.clone(),
            };
            (state.job_id.clone(), map)
        };
        for (name, path) in artifacts {
            let req = LogArtifactRequest {
                run_id: self.env.config.run_id.clone(),
                fs_id: self.env.config.fs_id.clone(),
                fs_name: self.env.config.fs_name.clone(),
                user_name: self.env.config.user_name.clone(),
                artifact_path: path,
                step_name: self.meta.full_name.clone(),
                job_id: job_id.clone(),
                artifact_name: name,
                kind,
            };
            callbacks::log_artifact_with_retry(self.env.callbacks.as_ref(), req).await;
        }
    }

    /// Terminate with `status` outside the normal watcher path and emit.
    async fn finish_abnormal(&self, status: RuntimeStatus, message: &str) {
        if status == RuntimeStatus::Failed {
            tracing::error!("{message}");
        }
        if self.meta.update_status(status) {
            if status.is_terminal() {
                self.state.lock().end_time = format_local(self.env.clock.epoch_ms());
            }
            self.sync(EventKind::JobUpdate, message).await;
        }
    }

    /// Sync one event to the store and the parent, releasing the
    /// parallelism slot on the first emission after becoming terminal.
    async fn sync(&self, kind: EventKind, message: &str) {
        if self.meta.is_done() {
            let mut slot = self.slot.lock();
            if slot.holds {
                self.env.gate.decrease();
                slot.holds = false;
                tracing::debug!(
                    step = %self.meta.name,
                    parallelism = self.env.gate.current_parallelism(),
                    "step finished, released slot"
                );
            }
        }

        let view = self.build_view(message);
        sync_event(
            &self.env,
            &self.meta,
            &self.parent_tx,
            kind,
            message,
            ComponentView::Job(view),
        )
        .await;
    }

    fn build_event(&self, kind: EventKind, message: &str) -> WorkflowEvent {
        WorkflowEvent::new(
            kind,
            message,
            dagrun_core::EventExtra {
                run_id: self.env.config.run_id.clone(),
                pk: self.meta.pk(),
                status: self.meta.status(),
                component_name: self.meta.short_name.clone(),
                view: Some(ComponentView::Job(self.build_view(message))),
            },
        )
    }

    fn build_view(&self, message: &str) -> JobView {
        let solver = self.solver.lock();
        let state = self.state.lock();
        JobView {
            job_id: state.job_id.clone(),
            job_name: self.job_name.clone(),
            step_name: self.meta.full_name.clone(),
            command: state.job_values.command.clone(),
            parameters: solver.parameters().clone(),
            env: state.job_values.env.clone(),
            status: self.meta.status(),
            message: message.to_string(),
            deps: self.deps.clone(),
            docker_env: self.spec.docker_env.clone(),
            artifacts: solver.artifacts().clone(),
            start_time: state.start_time.clone(),
            end_time: state.end_time.clone(),
            parent_dag_id: self.meta.parent_dag_id.clone(),
            cache_run_id: state.cache_run_id.clone(),
            cache_job_id: state.cache_job_id.clone(),
            seq: self.meta.seq,
        }
    }

}
