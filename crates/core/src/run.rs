// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-level configuration shared by every runtime of a run.

use serde::{Deserialize, Serialize};

/// Identifies one run and the storage scope it executes against.
///
/// Built by the run creator (outside the engine) and threaded through every
/// runtime unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub run_id: String,
    /// Shared filesystem id artifact paths live under.
    pub fs_id: String,
    pub fs_name: String,
    pub user_name: String,
    /// Pipeline id, yaml path, or md5 of the raw yaml — the cache scope key.
    pub pipeline_source: String,
}

impl RunConfig {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self { run_id: run_id.into(), ..Default::default() }
    }

    crate::setters! {
        into {
            fs_id: String,
            fs_name: String,
            user_name: String,
            pipeline_source: String,
        }
    }
}
