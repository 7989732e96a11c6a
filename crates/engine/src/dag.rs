// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dag runtime: expands children, schedules them by dependency order,
//! aggregates their terminal statuses.
//!
//! Children run in their own tasks and bubble events onto the dag's inbox.
//! The dag owns all of its scheduling state; nothing here is shared with
//! siblings, so the whole loop is single-task.

use crate::condition::ConditionEvaluator;
use crate::runtime::{sync_event, RunEnv, RuntimeMeta};
use crate::step::StepRuntime;
use crate::template::{build_sys_params, InnerSolver, ResolvedSibling};
use dagrun_core::component::split_deps;
use dagrun_core::{
    Artifacts, Component, ComponentView, DagSpec, DagView, EventKind, FailureStrategy,
    RunStateView, RuntimeStatus, WorkflowEvent,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Instance {
    status: RuntimeStatus,
    view: Option<ComponentView>,
}

#[derive(Default)]
struct Group {
    started: bool,
    instances: BTreeMap<usize, Instance>,
}

impl Group {
    fn terminal(&self) -> bool {
        self.started
            && !self.instances.is_empty()
            && self.instances.values().all(|i| i.status.is_terminal())
    }

    fn active(&self) -> bool {
        self.started && self.instances.values().any(|i| !i.status.is_terminal())
    }
}

/// Scheduling state of one dag instance: child components, their runtime
/// instances, and the resolved outputs downstream references read.
#[derive(Default)]
struct ChildTable {
    components: IndexMap<String, Component>,
    groups: IndexMap<String, Group>,
    siblings: IndexMap<String, ResolvedSibling>,
}

impl ChildTable {
    fn new(entry_points: &IndexMap<String, Component>) -> Self {
        let mut groups = IndexMap::new();
        for name in entry_points.keys() {
            groups.insert(name.clone(), Group::default());
        }
        Self { components: entry_points.clone(), groups, siblings: IndexMap::new() }
    }

    fn ready_children(&self) -> Vec<String> {
        self.components
            .iter()
            .filter(|(name, component)| {
                let group = &self.groups[name.as_str()];
                !group.started
                    && component.deps().iter().all(|dep| {
                        self.groups.get(dep).map(Group::terminal).unwrap_or(false)
                    })
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn mark_started(&mut self, name: &str) {
        if let Some(group) = self.groups.get_mut(name) {
            group.started = true;
        }
    }

    fn add_instance(&mut self, name: &str, seq: usize) {
        if let Some(group) = self.groups.get_mut(name) {
            group.instances.insert(seq, Instance { status: RuntimeStatus::Init, view: None });
        }
    }

    fn update_instance(
        &mut self,
        name: &str,
        seq: usize,
        status: RuntimeStatus,
        view: ComponentView,
    ) {
        if let Some(instance) =
            self.groups.get_mut(name).and_then(|g| g.instances.get_mut(&seq))
        {
            instance.status = status;
            instance.view = Some(view);
        }
    }

    fn all_terminal(&self) -> bool {
        self.groups.values().all(Group::terminal)
    }

    fn any_active(&self) -> bool {
        self.groups.values().any(Group::active)
    }

    fn unstarted_children(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|(_, group)| !group.started)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn any_status(&self, status: RuntimeStatus) -> bool {
        self.groups
            .values()
            .flat_map(|g| g.instances.values())
            .any(|i| i.status == status)
    }

    fn views(&self) -> IndexMap<String, Vec<ComponentView>> {
        let mut views = IndexMap::new();
        for (name, group) in &self.groups {
            let collected: Vec<ComponentView> =
                group.instances.values().filter_map(|i| i.view.clone()).collect();
            views.insert(name.clone(), collected);
        }
        views
    }
}

pub(crate) struct DagRuntime {
    meta: RuntimeMeta,
    spec: DagSpec,
    deps: Vec<String>,
    dag_id: String,
    env: Arc<RunEnv>,
    ctx: CancellationToken,
    failure_ctx: CancellationToken,
    parent_tx: mpsc::Sender<WorkflowEvent>,
    solver: InnerSolver,
    saved: Arc<RunStateView>,
}

impl DagRuntime {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        full_name: String,
        spec: DagSpec,
        seq: usize,
        loop_value: Option<Value>,
        siblings: IndexMap<String, ResolvedSibling>,
        parent_dag_id: String,
        ctx: CancellationToken,
        failure_ctx: CancellationToken,
        parent_tx: mpsc::Sender<WorkflowEvent>,
        env: Arc<RunEnv>,
        saved: Arc<RunStateView>,
    ) -> Self {
        let sys_params = build_sys_params(&env.config, &spec.name, loop_value.as_ref());
        let solver = InnerSolver::new(
            full_name.clone(),
            spec.parameters.clone(),
            IndexMap::new(),
            "",
            spec.artifacts.clone(),
            sys_params,
            siblings,
        );
        let deps = split_deps(&spec.deps);
        let meta = RuntimeMeta::new(full_name, spec.name.clone(), seq, parent_dag_id);

        Self {
            meta,
            spec,
            deps,
            dag_id: format!("dag-{}", Uuid::new_v4()),
            env,
            ctx,
            failure_ctx,
            parent_tx,
            solver,
            saved,
        }
    }

    /// Run the dag instance. Boxed because dags recurse through their
    /// children's spawned `start` futures.
    pub(crate) fn start(mut self) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            let mut table = ChildTable::new(&self.spec.entry_points);

            let resolved = self
                .solver
                .resolve_parameters()
                .and_then(|()| self.solver.resolve_artifacts());
            if let Err(err) = resolved {
                let msg =
                    format!("resolve templates for dag [{}] failed: {err}", self.meta.name);
                self.finish_abnormal(&table, RuntimeStatus::Failed, &msg).await;
                return;
            }

            match self.should_run() {
                Err(err) => {
                    let msg = format!(
                        "calculate the condition field for dag [{}] failed: {err}",
                        self.meta.name
                    );
                    self.finish_abnormal(&table, RuntimeStatus::Failed, &msg).await;
                    return;
                }
                Ok(false) => {
                    let msg = format!(
                        "the condition of dag [{}] evaluates to false, skip running",
                        self.meta.name
                    );
                    tracing::info!("{msg}");
                    self.finish_abnormal(&table, RuntimeStatus::Skipped, &msg).await;
                    return;
                }
                Ok(true) => {}
            }

            if self.env.source.is_disabled(&self.meta.full_name) {
                let msg = format!("dag [{}] is disabled, skip running", self.meta.name);
                tracing::info!("{msg}");
                self.finish_abnormal(&table, RuntimeStatus::Skipped, &msg).await;
                return;
            }

            if self.meta.update_status(RuntimeStatus::Running) {
                self.sync(&table, &format!("dag [{}] started", self.meta.name)).await;
            }

            let (child_tx, mut child_rx) = mpsc::channel::<WorkflowEvent>(64);
            let child_ctx = self.ctx.child_token();
            let child_failure = CancellationToken::new();

            self.schedule_ready(&mut table, &child_tx, &child_ctx, &child_failure);

            let mut failing = false;
            let mut cancelling = false;
            while !table.all_terminal() {
                tokio::select! {
                    maybe = child_rx.recv() => {
                        let Some(event) = maybe else { break };
                        self.handle_child_event(&mut table, &event, &child_failure);
                        self.schedule_ready(&mut table, &child_tx, &child_ctx, &child_failure);
                    }
                    _ = self.failure_ctx.cancelled(), if !failing => {
                        failing = true;
                        child_failure.cancel();
                    }
                    _ = self.ctx.cancelled(), if !cancelling => {
                        // children hold child tokens of ctx and stop
                        // themselves; the dag only waits for their
                        // terminal events
                        cancelling = true;
                    }
                }
            }

            self.finish(&table).await;
        })
    }

    /// Construct-and-terminate path, mirroring the step's: used when the
    /// parent cannot schedule this dag at all.
    pub(crate) async fn start_with_status(self, status: RuntimeStatus, message: &str) {
        let table = ChildTable::new(&self.spec.entry_points);
        if self.meta.update_status(status) {
            self.sync(&table, message).await;
        }
    }

    fn should_run(&self) -> Result<bool, crate::error::EngineError> {
        let resolved = match self.spec.condition.as_deref() {
            None => None,
            Some(raw) => Some(self.solver.resolve_condition(raw)?),
        };
        Ok(ConditionEvaluator::should_run(resolved.as_deref())?)
    }

    fn handle_child_event(
        &self,
        table: &mut ChildTable,
        event: &WorkflowEvent,
        child_failure: &CancellationToken,
    ) {
        if !matches!(event.kind, EventKind::JobUpdate | EventKind::DagUpdate) {
            return;
        }
        let Some(view) = &event.extra.view else {
            return;
        };
        let name = event.extra.component_name.clone();
        let seq = view.seq();
        let status = event.extra.status;
        table.update_instance(&name, seq, status, view.clone());

        if status.is_terminal() {
            // a skipped sibling produced nothing; downstream references to
            // it must fail resolution rather than read phantom values
            let resolved = if status == RuntimeStatus::Skipped {
                ResolvedSibling::default()
            } else {
                match view {
                    ComponentView::Job(v) => ResolvedSibling {
                        parameters: v.parameters.clone(),
                        artifacts: v.artifacts.clone(),
                    },
                    ComponentView::Dag(v) => ResolvedSibling {
                        parameters: v.parameters.clone(),
                        artifacts: v.artifacts.clone(),
                    },
                }
            };
            table.siblings.insert(name.clone(), resolved);

            if status == RuntimeStatus::Failed
                && self.env.source.failure_options == FailureStrategy::FailFast
            {
                tracing::info!(
                    dag = %self.meta.name,
                    child = %name,
                    "child failed under fail_fast, stopping remaining children"
                );
                child_failure.cancel();
            }
        }
    }

    /// Launch every child whose dependencies are all terminal.
    ///
    /// Children found unlaunchable (unknown dependency, dependency cycle)
    /// are failed in place so the dag cannot stall.
    fn schedule_ready(
        &self,
        table: &mut ChildTable,
        child_tx: &mpsc::Sender<WorkflowEvent>,
        child_ctx: &CancellationToken,
        child_failure: &CancellationToken,
    ) {
        loop {
            let ready = table.ready_children();
            if ready.is_empty() {
                break;
            }
            for name in ready {
                table.mark_started(&name);
                let component = self.spec.entry_points[&name].clone();
                self.launch_child(table, &name, &component, child_tx, child_ctx, child_failure);
            }
        }

        if !table.all_terminal() && !table.any_active() {
            for name in table.unstarted_children() {
                table.mark_started(&name);
                let component = self.spec.entry_points[&name].clone();
                let msg = format!(
                    "component [{}.{name}] has circular or unknown dependencies",
                    self.meta.full_name
                );
                tracing::error!("{msg}");
                self.spawn_stillborn(
                    table,
                    &name,
                    &component,
                    RuntimeStatus::Failed,
                    &msg,
                    child_tx,
                    child_ctx,
                    child_failure,
                );
            }
        }
    }

    fn launch_child(
        &self,
        table: &mut ChildTable,
        name: &str,
        component: &Component,
        child_tx: &mpsc::Sender<WorkflowEvent>,
        child_ctx: &CancellationToken,
        child_failure: &CancellationToken,
    ) {
        let child_full = format!("{}.{name}", self.meta.full_name);

        let loop_values = match component.loop_argument() {
            None => None,
            Some(raw) => {
                let scratch = InnerSolver::new(
                    child_full.clone(),
                    IndexMap::new(),
                    IndexMap::new(),
                    "",
                    Artifacts::default(),
                    self.solver.sys_params().clone(),
                    table.siblings.clone(),
                );
                match scratch.resolve_loop(raw) {
                    Ok(values) => Some(values),
                    Err(err) => {
                        let msg = format!(
                            "resolve loop_argument for component [{child_full}] failed: {err}"
                        );
                        tracing::error!("{msg}");
                        self.spawn_stillborn(
                            table,
                            name,
                            component,
                            RuntimeStatus::Failed,
                            &msg,
                            child_tx,
                            child_ctx,
                            child_failure,
                        );
                        return;
                    }
                }
            }
        };

        match loop_values {
            Some(values) if values.is_empty() => {
                let msg = format!(
                    "loop_argument of component [{child_full}] resolved to an empty list, skip running"
                );
                tracing::info!("{msg}");
                self.spawn_stillborn(
                    table,
                    name,
                    component,
                    RuntimeStatus::Skipped,
                    &msg,
                    child_tx,
                    child_ctx,
                    child_failure,
                );
            }
            None => {
                self.spawn_instance(table, name, component, 0, None, child_tx, child_ctx, child_failure);
            }
            Some(values) => {
                for (seq, value) in values.into_iter().enumerate() {
                    self.spawn_instance(
                        table,
                        name,
                        component,
                        seq,
                        Some(value),
                        child_tx,
                        child_ctx,
                        child_failure,
                    );
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_instance(
        &self,
        table: &mut ChildTable,
        name: &str,
        component: &Component,
        seq: usize,
        loop_value: Option<Value>,
        child_tx: &mpsc::Sender<WorkflowEvent>,
        child_ctx: &CancellationToken,
        child_failure: &CancellationToken,
    ) {
        table.add_instance(name, seq);
        let child_full = format!("{}.{name}", self.meta.full_name);
        match component {
            Component::Step(spec) => {
                let runtime = StepRuntime::new(
                    child_full,
                    spec.clone(),
                    seq,
                    loop_value,
                    table.siblings.clone(),
                    self.dag_id.clone(),
                    child_ctx.child_token(),
                    child_failure.clone(),
                    child_tx.clone(),
                    self.env.clone(),
                );
                match self.saved.job(runtime.runtime_name()) {
                    Some(view) => {
                        let view = view.clone();
                        tokio::spawn(runtime.restart(view));
                    }
                    None => {
                        tokio::spawn(runtime.start());
                    }
                }
            }
            Component::Dag(spec) => {
                let runtime = DagRuntime::new(
                    child_full,
                    spec.clone(),
                    seq,
                    loop_value,
                    table.siblings.clone(),
                    self.dag_id.clone(),
                    child_ctx.child_token(),
                    child_failure.clone(),
                    child_tx.clone(),
                    self.env.clone(),
                    self.saved.clone(),
                );
                tokio::spawn(runtime.start());
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_stillborn(
        &self,
        table: &mut ChildTable,
        name: &str,
        component: &Component,
        status: RuntimeStatus,
        message: &str,
        child_tx: &mpsc::Sender<WorkflowEvent>,
        child_ctx: &CancellationToken,
        child_failure: &CancellationToken,
    ) {
        table.add_instance(name, 0);
        let child_full = format!("{}.{name}", self.meta.full_name);
        let message = message.to_string();
        match component {
            Component::Step(spec) => {
                let runtime = StepRuntime::new(
                    child_full,
                    spec.clone(),
                    0,
                    None,
                    table.siblings.clone(),
                    self.dag_id.clone(),
                    child_ctx.child_token(),
                    child_failure.clone(),
                    child_tx.clone(),
                    self.env.clone(),
                );
                tokio::spawn(async move { runtime.start_with_status(status, &message).await });
            }
            Component::Dag(spec) => {
                let runtime = DagRuntime::new(
                    child_full,
                    spec.clone(),
                    0,
                    None,
                    table.siblings.clone(),
                    self.dag_id.clone(),
                    child_ctx.child_token(),
                    child_failure.clone(),
                    child_tx.clone(),
                    self.env.clone(),
                    self.saved.clone(),
                );
                tokio::spawn(async move { runtime.start_with_status(status, &message).await });
            }
        }
    }

    /// Terminal aggregation over all child instances.
    async fn finish(&self, table: &ChildTable) {
        let status = if self.ctx.is_cancelled() {
            RuntimeStatus::Cancelled
        } else if table.any_status(RuntimeStatus::Failed) {
            RuntimeStatus::Failed
        } else if table.any_status(RuntimeStatus::Terminated) {
            RuntimeStatus::Terminated
        } else {
            RuntimeStatus::Succeeded
        };

        let message = match status {
            RuntimeStatus::Cancelled => {
                format!("dag [{}] cancelled by stop signal", self.meta.name)
            }
            RuntimeStatus::Failed => {
                format!("dag [{}] failed, some child component failed", self.meta.name)
            }
            RuntimeStatus::Terminated => {
                format!("dag [{}] terminated, some child component was stopped", self.meta.name)
            }
            _ => format!("dag [{}] succeeded", self.meta.name),
        };

        tracing::info!(dag = %self.meta.name, status = %status, "dag finished");
        if self.meta.update_status(status) {
            self.sync(table, &message).await;
        }
    }

    async fn finish_abnormal(&self, table: &ChildTable, status: RuntimeStatus, message: &str) {
        if status == RuntimeStatus::Failed {
            tracing::error!("{message}");
        }
        if self.meta.update_status(status) {
            self.sync(table, message).await;
        }
    }

    async fn sync(&self, table: &ChildTable, message: &str) {
        let view = self.build_view(table, message);
        sync_event(
            &self.env,
            &self.meta,
            &self.parent_tx,
            EventKind::DagUpdate,
            message,
            ComponentView::Dag(view),
        )
        .await;
    }

    fn build_view(&self, table: &ChildTable, message: &str) -> DagView {
        DagView {
            dag_id: self.dag_id.clone(),
            name: self.meta.short_name.clone(),
            parameters: self.solver.parameters().clone(),
            artifacts: self.solver.artifacts().clone(),
            deps: self.deps.clone(),
            status: self.meta.status(),
            message: message.to_string(),
            parent_dag_id: self.meta.parent_dag_id.clone(),
            seq: self.meta.seq,
            entry_points: table.views(),
        }
    }
}
