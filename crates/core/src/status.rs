// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status machine for component runtimes.

use serde::{Deserialize, Serialize};

/// Status of a component runtime (one executed step or dag instance).
///
/// A runtime is created in `Init`, moves to `Pending` once scheduled, and
/// reaches exactly one terminal status. The `Terminating` state covers the
/// window between a stop request and backend confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeStatus {
    Init,
    Pending,
    Running,
    Terminating,
    Terminated,
    Cancelled,
    Failed,
    Succeeded,
    Skipped,
}

impl RuntimeStatus {
    /// A terminal status can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RuntimeStatus::Cancelled
                | RuntimeStatus::Failed
                | RuntimeStatus::Succeeded
                | RuntimeStatus::Skipped
                | RuntimeStatus::Terminated
        )
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, RuntimeStatus::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RuntimeStatus::Failed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RuntimeStatus::Cancelled)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RuntimeStatus::Skipped)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, RuntimeStatus::Terminated)
    }
}

impl Default for RuntimeStatus {
    fn default() -> Self {
        RuntimeStatus::Init
    }
}

crate::simple_display! {
    RuntimeStatus {
        Init => "init",
        Pending => "pending",
        Running => "running",
        Terminating => "terminating",
        Terminated => "terminated",
        Cancelled => "cancelled",
        Failed => "failed",
        Succeeded => "succeeded",
        Skipped => "skipped",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
