// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn output_path_is_deterministic() {
    let handler = FsResourceHandler::new("/mnt/fs");
    let a = handler.output_artifact_path("wf", "run-1", "extract-0", "rows").unwrap();
    let b = handler.output_artifact_path("wf", "run-1", "extract-0", "rows").unwrap();
    assert_eq!(a, b);
    assert_eq!(a, "/mnt/fs/wf/run-1/extract-0/rows");
}

#[test]
fn output_path_rejects_empty_name() {
    let handler = FsResourceHandler::default();
    assert!(handler.output_artifact_path("wf", "run-1", "s-0", "").is_err());
}

#[test]
fn digest_is_stable_and_hex() {
    let handler = FsResourceHandler::default();
    let d1 = handler.input_artifact_digest("/mnt/fs/wf/run-1/extract-0/rows").unwrap();
    let d2 = handler.input_artifact_digest("/mnt/fs/wf/run-1/extract-0/rows").unwrap();
    assert_eq!(d1, d2);
    assert_eq!(d1.len(), 64);
    assert!(d1.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn digest_differs_per_path() {
    let handler = FsResourceHandler::default();
    let d1 = handler.input_artifact_digest("/a").unwrap();
    let d2 = handler.input_artifact_digest("/b").unwrap();
    assert_ne!(d1, d2);
}
