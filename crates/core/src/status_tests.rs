// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    cancelled = { RuntimeStatus::Cancelled },
    failed = { RuntimeStatus::Failed },
    succeeded = { RuntimeStatus::Succeeded },
    skipped = { RuntimeStatus::Skipped },
    terminated = { RuntimeStatus::Terminated },
)]
fn terminal_statuses(status: RuntimeStatus) {
    assert!(status.is_terminal());
}

#[parameterized(
    init = { RuntimeStatus::Init },
    pending = { RuntimeStatus::Pending },
    running = { RuntimeStatus::Running },
    terminating = { RuntimeStatus::Terminating },
)]
fn non_terminal_statuses(status: RuntimeStatus) {
    assert!(!status.is_terminal());
}

#[test]
fn default_is_init() {
    assert_eq!(RuntimeStatus::default(), RuntimeStatus::Init);
}

#[test]
fn display_uses_lowercase_names() {
    assert_eq!(RuntimeStatus::Succeeded.to_string(), "succeeded");
    assert_eq!(RuntimeStatus::Terminating.to_string(), "terminating");
}

#[test]
fn serde_round_trip() {
    let json = serde_json::to_string(&RuntimeStatus::Failed).unwrap();
    assert_eq!(json, "\"failed\"");
    let back: RuntimeStatus = serde_json::from_str(&json).unwrap();
    assert_eq!(back, RuntimeStatus::Failed);
}
