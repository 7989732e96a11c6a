// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache entries and the request bodies of the persistence callbacks.

use serde::{Deserialize, Serialize};

/// Sentinel expiry meaning a cache entry never goes stale.
pub const CACHE_EXPIRED_TIME_NEVER: &str = "-1";

/// How aggressively a cache entry may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    /// Reuse only on an exact second-fingerprint match.
    Conservative,
}

impl Default for CacheStrategy {
    fn default() -> Self {
        CacheStrategy::Conservative
    }
}

/// One stored cache record, as returned by the list callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheEntry {
    pub run_id: String,
    pub job_id: String,
    pub first_fp: String,
    pub second_fp: String,
    pub fs_id: String,
    pub source: String,
    /// Seconds of validity, or [`CACHE_EXPIRED_TIME_NEVER`].
    pub expired_time: String,
    /// Epoch milliseconds of the last write.
    pub updated_at: u64,
}

/// Request body for recording a new cache entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogCacheRequest {
    pub first_fp: String,
    pub second_fp: String,
    pub source: String,
    pub run_id: String,
    pub step_name: String,
    pub job_id: String,
    pub fs_id: String,
    pub fs_name: String,
    pub user_name: String,
    pub expired_time: String,
    pub strategy: CacheStrategy,
}

/// Direction of a logged artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Input,
    Output,
}

crate::simple_display! {
    ArtifactKind {
        Input => "input",
        Output => "output",
    }
}

/// Request body for recording an artifact path against a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogArtifactRequest {
    pub run_id: String,
    pub fs_id: String,
    pub fs_name: String,
    pub user_name: String,
    pub artifact_path: String,
    pub step_name: String,
    pub job_id: String,
    pub artifact_name: String,
    pub kind: ArtifactKind,
}
