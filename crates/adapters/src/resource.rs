// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact path and digest handling.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from resource handling.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("cannot generate artifact path: {0}")]
    Path(String),
    #[error("cannot read artifact content: {0}")]
    Digest(String),
}

/// Generates output artifact paths and digests input artifact contents.
///
/// Artifact byte I/O lives outside the engine; the engine only needs stable
/// paths and a content digest for the second cache fingerprint.
pub trait ResourceHandler: Send + Sync {
    /// Path for one output artifact of one step runtime. Called exactly once
    /// per output name of a non-cached step instance, before job start.
    fn output_artifact_path(
        &self,
        workflow_name: &str,
        run_id: &str,
        step_name: &str,
        artifact_name: &str,
    ) -> Result<String, ResourceError>;

    /// Content digest of an input artifact, consumed by the second
    /// cache fingerprint.
    fn input_artifact_digest(&self, artifact_path: &str) -> Result<String, ResourceError>;
}

/// Filesystem-layout resource handler composing paths under a root prefix.
///
/// Digests hash the artifact path itself; real content hashing belongs to a
/// storage-backed handler.
pub struct FsResourceHandler {
    root: String,
}

impl FsResourceHandler {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for FsResourceHandler {
    fn default() -> Self {
        Self::new("./artifacts")
    }
}

impl ResourceHandler for FsResourceHandler {
    fn output_artifact_path(
        &self,
        workflow_name: &str,
        run_id: &str,
        step_name: &str,
        artifact_name: &str,
    ) -> Result<String, ResourceError> {
        if artifact_name.is_empty() {
            return Err(ResourceError::Path("artifact name is empty".to_string()));
        }
        Ok(format!("{}/{}/{}/{}/{}", self.root, workflow_name, run_id, step_name, artifact_name))
    }

    fn input_artifact_digest(&self, artifact_path: &str) -> Result<String, ResourceError> {
        if artifact_path.is_empty() {
            return Err(ResourceError::Digest("artifact path is empty".to_string()));
        }
        Ok(format!("{:x}", Sha256::digest(artifact_path.as_bytes())))
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
