// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed step cache fingerprints and lookup.
//!
//! Two fingerprints key the cache:
//! - the **first fingerprint** identifies structurally equivalent steps
//!   (image, command template, declared names);
//! - the **second fingerprint** identifies input-equivalent executions
//!   (parameter values, input artifact digests, image digest).

use crate::callbacks::RunCallbacks;
use dagrun_core::{CacheEntry, Clock, CACHE_EXPIRED_TIME_NEVER};
use indexmap::IndexMap;
use sha2::{Digest, Sha256};

fn digest_hex(payload: &str) -> String {
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

/// Structural fingerprint of a step.
///
/// The command is the cache-mode resolution: parameters substituted, `PF_*`
/// and output artifact paths left as placeholders so the fingerprint stays
/// stable across runs.
pub(crate) fn first_fingerprint(
    image: &str,
    command: &str,
    parameter_names: &[String],
    input_artifact_names: &[String],
    output_artifact_names: &[String],
) -> String {
    let mut lines = vec![format!("image:{image}"), format!("command:{command}")];
    lines.extend(sorted(parameter_names).into_iter().map(|n| format!("param:{n}")));
    lines.extend(sorted(input_artifact_names).into_iter().map(|n| format!("input:{n}")));
    lines.extend(sorted(output_artifact_names).into_iter().map(|n| format!("output:{n}")));
    digest_hex(&lines.join("\n"))
}

/// Input-equivalence fingerprint of a step execution.
pub(crate) fn second_fingerprint(
    parameters: &IndexMap<String, String>,
    input_digests: &IndexMap<String, String>,
    image_digest: &str,
) -> String {
    let mut params: Vec<(&String, &String)> = parameters.iter().collect();
    params.sort_by_key(|(name, _)| name.clone());
    let mut inputs: Vec<(&String, &String)> = input_digests.iter().collect();
    inputs.sort_by_key(|(name, _)| name.clone());

    let mut lines = Vec::with_capacity(params.len() + inputs.len() + 1);
    lines.extend(params.into_iter().map(|(n, v)| format!("param:{n}={v}")));
    lines.extend(inputs.into_iter().map(|(n, d)| format!("input:{n}={d}")));
    lines.push(format!("image_digest:{image_digest}"));
    digest_hex(&lines.join("\n"))
}

/// Stand-in for the registry digest of an image reference.
pub(crate) fn image_digest(image: &str) -> String {
    digest_hex(image)
}

/// Look up a reusable cache entry.
///
/// Entries are scanned newest first; a hit needs a second-fingerprint match
/// and a validity window still open. Lookup errors degrade to a miss.
pub(crate) async fn find_cache_hit(
    callbacks: &dyn RunCallbacks,
    clock: &dyn Clock,
    first_fp: &str,
    second_fp: &str,
    fs_id: &str,
    pipeline_source: &str,
) -> Option<CacheEntry> {
    let mut entries = match callbacks.list_cache(first_fp, fs_id, pipeline_source).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(first_fp, error = %err, "cache list failed, treating as miss");
            return None;
        }
    };
    entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    entries.into_iter().find(|entry| {
        entry.second_fp == second_fp && !expired(entry, clock.epoch_ms())
    })
}

fn expired(entry: &CacheEntry, now_ms: u64) -> bool {
    if entry.expired_time == CACHE_EXPIRED_TIME_NEVER {
        return false;
    }
    match entry.expired_time.parse::<u64>() {
        Ok(seconds) => entry.updated_at + seconds * 1000 <= now_ms,
        Err(_) => {
            tracing::warn!(
                expired_time = %entry.expired_time,
                run_id = %entry.run_id,
                "unparsable expired_time on cache entry, treating as expired"
            );
            true
        }
    }
}

fn sorted(names: &[String]) -> Vec<String> {
    let mut sorted = names.to_vec();
    sorted.sort();
    sorted
}

#[cfg(test)]
#[path = "cache_calc_tests.rs"]
mod tests;
