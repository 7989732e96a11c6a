// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State shared by step and dag runtimes.

use crate::callbacks::{self, RunCallbacks};
use crate::gate::ParallelismGate;
use dagrun_core::{
    Clock, ComponentView, EventExtra, EventKind, RunConfig, RuntimeStatus, WorkflowEvent,
    WorkflowSource,
};
use dagrun_adapters::{JobBackend, ResourceHandler};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Everything a runtime needs from its run, shared by `Arc`.
pub(crate) struct RunEnv {
    pub source: WorkflowSource,
    pub config: RunConfig,
    pub gate: ParallelismGate,
    pub backend: Arc<dyn JobBackend>,
    pub resource: Arc<dyn ResourceHandler>,
    pub callbacks: Arc<dyn RunCallbacks>,
    pub clock: Arc<dyn Clock>,
}

/// Identity and status of one runtime instance.
///
/// The status/done pair moves in one direction only: once `done` is set the
/// runtime is terminal and every further transition is rejected.
pub(crate) struct RuntimeMeta {
    /// Dotted ancestry path of the component.
    pub full_name: String,
    /// Component short-name, as siblings reference it.
    pub short_name: String,
    /// Runtime identity: `full_name` plus the loop seq.
    pub name: String,
    pub seq: usize,
    pub parent_dag_id: String,
    inner: Mutex<MetaInner>,
}

struct MetaInner {
    status: RuntimeStatus,
    done: bool,
    pk: i64,
}

impl RuntimeMeta {
    pub fn new(
        full_name: impl Into<String>,
        short_name: impl Into<String>,
        seq: usize,
        parent_dag_id: impl Into<String>,
    ) -> Self {
        let full_name = full_name.into();
        Self {
            name: format!("{full_name}-{seq}"),
            full_name,
            short_name: short_name.into(),
            seq,
            parent_dag_id: parent_dag_id.into(),
            inner: Mutex::new(MetaInner { status: RuntimeStatus::Pending, done: false, pk: 0 }),
        }
    }

    /// Transition to `status`. Returns false (and leaves everything
    /// untouched) when the runtime is already terminal.
    pub fn update_status(&self, status: RuntimeStatus) -> bool {
        let mut inner = self.inner.lock();
        if inner.done {
            tracing::error!(
                runtime = %self.name,
                current = %inner.status,
                rejected = %status,
                "cannot update status of a terminal runtime"
            );
            return false;
        }
        inner.status = status;
        if status.is_terminal() {
            inner.done = true;
        }
        true
    }

    pub fn status(&self) -> RuntimeStatus {
        self.inner.lock().status
    }

    pub fn is_done(&self) -> bool {
        self.inner.lock().done
    }

    pub fn pk(&self) -> i64 {
        self.inner.lock().pk
    }

    pub fn set_pk(&self, pk: i64) {
        self.inner.lock().pk = pk;
    }
}

/// Backend job name: `{run_id}-{step_name}`, with the seq appended for loop
/// instances past the first.
pub(crate) fn generate_job_name(run_id: &str, step_name: &str, seq: usize) -> String {
    if seq == 0 {
        format!("{run_id}-{step_name}")
    } else {
        format!("{run_id}-{step_name}-{seq}")
    }
}

/// Mirror one event to the external store and bubble it to the parent.
///
/// The callback is retried; the first success assigns the runtime's pk.
/// The parent send is infallible from the emitter's point of view — a
/// dropped receiver means the parent is gone and the event has nowhere
/// to go.
pub(crate) async fn sync_event(
    env: &RunEnv,
    meta: &RuntimeMeta,
    parent_tx: &mpsc::Sender<WorkflowEvent>,
    kind: EventKind,
    message: &str,
    view: ComponentView,
) {
    let mut event = WorkflowEvent::new(
        kind,
        message,
        EventExtra {
            run_id: env.config.run_id.clone(),
            pk: meta.pk(),
            status: meta.status(),
            component_name: meta.short_name.clone(),
            view: Some(view),
        },
    );

    if let Some(pk) =
        callbacks::update_with_retry(env.callbacks.as_ref(), &env.config.run_id, &event).await
    {
        meta.set_pk(pk);
        event.extra.pk = pk;
    }

    let _ = parent_tx.send(event).await;
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
