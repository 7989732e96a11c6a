// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local-time formatting for persisted views.

use chrono::{Local, LocalResult, TimeZone};

/// The time format the external store expects in views.
pub const VIEW_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format epoch milliseconds as `YYYY-MM-DD HH:MM:SS` in local time.
pub fn format_local(epoch_ms: u64) -> String {
    match Local.timestamp_millis_opt(epoch_ms as i64) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            dt.format(VIEW_TIME_FORMAT).to_string()
        }
        LocalResult::None => String::new(),
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
