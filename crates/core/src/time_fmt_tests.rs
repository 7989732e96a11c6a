// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn formats_epoch_in_expected_shape() {
    let formatted = format_local(1_700_000_000_000);
    // 19 chars: YYYY-MM-DD HH:MM:SS
    assert_eq!(formatted.len(), 19);
    assert_eq!(formatted.as_bytes()[4], b'-');
    assert_eq!(formatted.as_bytes()[10], b' ');
    assert_eq!(formatted.as_bytes()[13], b':');
}

#[test]
fn epoch_zero_formats() {
    assert!(!format_local(0).is_empty());
}
