// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error kinds and their status mapping.

use thiserror::Error;

/// A template reference could not be resolved.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("unknown reference [{{{{ {reference} }}}}] in component [{component}]")]
    UnknownReference { reference: String, component: String },
    #[error("bad loop_argument for component [{component}]: {detail}")]
    BadLoopArgument { component: String, detail: String },
}

/// Errors that fail a step runtime.
///
/// Every variant maps to `Failed` except where the caller degrades it:
/// cache lookup/log problems never fail a step by themselves.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("condition error: {0}")]
    Condition(#[from] crate::condition::ConditionError),
    #[error("cannot generate output artifact path: {0}")]
    OutputArtifactPath(String),
    #[error("job validation failed: {0}")]
    Validate(String),
    #[error("job start failed: {0}")]
    BackendStart(String),
    #[error("internal error: {0}")]
    Internal(String),
}
