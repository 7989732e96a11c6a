// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run driver: wires a workflow source to a root dag runtime and consumes
//! its events until the run terminates.

use crate::callbacks::{self, RunCallbacks};
use crate::dag::DagRuntime;
use crate::gate::ParallelismGate;
use crate::runtime::RunEnv;
use dagrun_core::{
    Clock, ComponentView, DagSpec, EventExtra, EventKind, RunConfig, RunStateView, RunView,
    RuntimeStatus, SystemClock, WorkflowEvent, WorkflowSource,
};
use dagrun_adapters::{JobBackend, ResourceHandler};
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One workflow run: builds the root dag runtime, observes it, and flushes
/// the final view.
pub struct WorkflowRuntime {
    env: Arc<RunEnv>,
    ctx: CancellationToken,
    failure_ctx: CancellationToken,
}

impl WorkflowRuntime {
    pub fn new(
        source: WorkflowSource,
        config: RunConfig,
        backend: Arc<dyn JobBackend>,
        resource: Arc<dyn ResourceHandler>,
        callbacks: Arc<dyn RunCallbacks>,
    ) -> Self {
        Self::with_clock(source, config, backend, resource, callbacks, Arc::new(SystemClock))
    }

    /// Like [`WorkflowRuntime::new`], with an injected clock for cache
    /// expiry arithmetic and view timestamps.
    pub fn with_clock(
        source: WorkflowSource,
        config: RunConfig,
        backend: Arc<dyn JobBackend>,
        resource: Arc<dyn ResourceHandler>,
        callbacks: Arc<dyn RunCallbacks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gate = ParallelismGate::new(source.parallelism);
        Self {
            env: Arc::new(RunEnv { gate, source, config, backend, resource, callbacks, clock }),
            ctx: CancellationToken::new(),
            failure_ctx: CancellationToken::new(),
        }
    }

    /// Request cancellation of the whole run. Steps stop their backend jobs
    /// and the run terminates once every runtime is terminal.
    pub fn stop(&self) {
        self.ctx.cancel();
    }

    /// Execute the run from scratch.
    pub async fn start(&self) -> RunView {
        self.drive(Arc::new(RunStateView::default())).await
    }

    /// Resume a run from persisted job views.
    ///
    /// Steps persisted as `Succeeded` are adopted without resubmission;
    /// `Running` steps re-attach to their backend jobs; everything else
    /// starts fresh.
    pub async fn restart(&self, saved: RunStateView) -> RunView {
        self.drive(Arc::new(saved)).await
    }

    /// The parallelism gate of this run, exposed for invariant checks.
    pub fn gate(&self) -> &ParallelismGate {
        &self.env.gate
    }

    async fn drive(&self, saved: Arc<RunStateView>) -> RunView {
        let source = &self.env.source;
        let (root_tx, mut root_rx) = mpsc::channel::<WorkflowEvent>(64);

        let root_spec = DagSpec {
            name: source.name.clone(),
            entry_points: source.entry_points.clone(),
            ..Default::default()
        };
        let root = DagRuntime::new(
            source.name.clone(),
            root_spec,
            0,
            None,
            IndexMap::new(),
            String::new(),
            self.ctx.child_token(),
            self.failure_ctx.clone(),
            root_tx,
            self.env.clone(),
            saved,
        );
        tokio::spawn(root.start());

        let mut view = RunView {
            run_id: self.env.config.run_id.clone(),
            status: RuntimeStatus::Running,
            message: String::new(),
            entry_points: IndexMap::new(),
        };

        while let Some(event) = root_rx.recv().await {
            if let Some(ComponentView::Dag(dag_view)) = &event.extra.view {
                view.entry_points = dag_view.entry_points.clone();
            }
            if event.extra.status.is_terminal() {
                view.status = run_status(event.extra.status);
                view.message = event.message.clone();
                self.flush_final(&view).await;
                tracing::info!(
                    run = %view.run_id,
                    status = %view.status,
                    "run finished"
                );
                return view;
            }
        }

        // the root task went away without a terminal event
        view.status = RuntimeStatus::Failed;
        view.message = "root runtime ended without a terminal event".to_string();
        self.flush_final(&view).await;
        view
    }

    async fn flush_final(&self, view: &RunView) {
        let event = WorkflowEvent::new(
            EventKind::RunUpdate,
            &view.message,
            EventExtra {
                run_id: view.run_id.clone(),
                pk: 0,
                status: view.status,
                component_name: self.env.source.name.clone(),
                view: None,
            },
        );
        let _ = callbacks::update_with_retry(
            self.env.callbacks.as_ref(),
            &self.env.config.run_id,
            &event,
        )
        .await;
    }
}

/// Map the root dag's terminal status to the run status.
fn run_status(root: RuntimeStatus) -> RuntimeStatus {
    match root {
        // a skipped root still counts as a completed run
        RuntimeStatus::Skipped => RuntimeStatus::Skipped,
        other => other,
    }
}
