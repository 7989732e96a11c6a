// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistence boundary.
//!
//! Every runtime mirrors its status changes to the external store through
//! these callbacks. The store must accept repeated updates for the same
//! `(run_id, component, seq)` and return a stable pk.

use async_trait::async_trait;
use dagrun_core::{CacheEntry, JobView, LogArtifactRequest, LogCacheRequest, WorkflowEvent};
use thiserror::Error;

/// Attempts per callback before the engine gives up on one invocation.
/// A dropped update is re-sent implicitly by the next status change.
pub const CALLBACK_ATTEMPTS: usize = 3;

/// Errors surfaced by the external store.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("callback failed: {0}")]
    Failed(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// External store operations the engine consumes.
#[async_trait]
pub trait RunCallbacks: Send + Sync {
    /// Mirror one event. Returns the persistence key for the emitting
    /// runtime; the first successful call assigns it.
    async fn update_runtime(
        &self,
        run_id: &str,
        event: &WorkflowEvent,
    ) -> Result<i64, CallbackError>;

    /// Record a cache entry after a successful self-executed step.
    async fn log_cache(&self, req: LogCacheRequest) -> Result<String, CallbackError>;

    /// Stored entries for a first fingerprint within one fs and pipeline
    /// source, newest first.
    async fn list_cache(
        &self,
        first_fp: &str,
        fs_id: &str,
        pipeline_source: &str,
    ) -> Result<Vec<CacheEntry>, CallbackError>;

    /// Persisted view of a job, by backend job id.
    async fn get_job(
        &self,
        job_id: &str,
        component_full_name: &str,
    ) -> Result<JobView, CallbackError>;

    /// Record an input or output artifact path against a job.
    async fn log_artifact(&self, req: LogArtifactRequest) -> Result<(), CallbackError>;
}

/// Retry `update_runtime` up to [`CALLBACK_ATTEMPTS`] times. Returns the pk
/// from the first success, or `None` once attempts are exhausted.
pub(crate) async fn update_with_retry(
    callbacks: &dyn RunCallbacks,
    run_id: &str,
    event: &WorkflowEvent,
) -> Option<i64> {
    for attempt in 1..=CALLBACK_ATTEMPTS {
        match callbacks.update_runtime(run_id, event).await {
            Ok(pk) => return Some(pk),
            Err(err) => tracing::warn!(
                attempt,
                component = %event.extra.component_name,
                error = %err,
                "update runtime callback failed"
            ),
        }
    }
    None
}

/// Retry `log_artifact` up to [`CALLBACK_ATTEMPTS`] times.
pub(crate) async fn log_artifact_with_retry(callbacks: &dyn RunCallbacks, req: LogArtifactRequest) {
    for attempt in 1..=CALLBACK_ATTEMPTS {
        match callbacks.log_artifact(req.clone()).await {
            Ok(()) => return,
            Err(err) => tracing::warn!(
                attempt,
                artifact = %req.artifact_name,
                step = %req.step_name,
                error = %err,
                "log artifact callback failed"
            ),
        }
    }
}
