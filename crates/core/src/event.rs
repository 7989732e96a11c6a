// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events bubbled child → parent and mirrored to the external store.

use crate::status::RuntimeStatus;
use crate::view::ComponentView;
use serde::{Deserialize, Serialize};

/// Kind of a [`WorkflowEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A step runtime's status changed (includes terminal transitions).
    JobUpdate,
    /// The backend watch stream reported a transient error.
    JobWatchErr,
    /// A stop RPC failed; the step keeps retrying.
    JobStopErr,
    /// A dag runtime's status changed.
    DagUpdate,
    /// The run driver's final flush.
    RunUpdate,
}

crate::simple_display! {
    EventKind {
        JobUpdate => "job_update",
        JobWatchErr => "job_watch_err",
        JobStopErr => "job_stop_err",
        DagUpdate => "dag_update",
        RunUpdate => "run_update",
    }
}

/// Context attached to every event, consumed by the persistence callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventExtra {
    pub run_id: String,
    /// Persistence key of the emitting runtime; 0 until the store assigns one.
    #[serde(default)]
    pub pk: i64,
    #[serde(default)]
    pub status: RuntimeStatus,
    pub component_name: String,
    /// Full view of the emitting runtime, when the event carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ComponentView>,
}

/// A tagged message carrying status changes or errors up the runtime tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub kind: EventKind,
    pub message: String,
    #[serde(default)]
    pub extra: EventExtra,
}

impl WorkflowEvent {
    pub fn new(kind: EventKind, message: impl Into<String>, extra: EventExtra) -> Self {
        Self { kind, message: message.into(), extra }
    }

    /// A bare status notification, as posted by job watchers onto a step's
    /// inbox. Carries no view; the step fills in the rest when re-emitting.
    pub fn job_status(status: RuntimeStatus, message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::JobUpdate,
            message: message.into(),
            extra: EventExtra { status, ..Default::default() },
        }
    }

    /// A watch failure notification from a job watcher.
    pub fn watch_error(message: impl Into<String>) -> Self {
        Self { kind: EventKind::JobWatchErr, message: message.into(), extra: EventExtra::default() }
    }

    pub fn is_job_update(&self) -> bool {
        matches!(self.kind, EventKind::JobUpdate)
    }

    pub fn is_watch_err(&self) -> bool {
        matches!(self.kind, EventKind::JobWatchErr)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
