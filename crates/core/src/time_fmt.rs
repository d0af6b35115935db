// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock helpers and shared human-readable duration formatting.
//!
//! Wire entities (messages, heartbeats, audit events, missions) all carry
//! epoch seconds as `f64`, matching the on-disk formats.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall clock as epoch seconds.
pub fn epoch_s() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Current wall clock as epoch milliseconds.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Format seconds as a short human-readable duration: `"5s"`, `"2m 30s"`,
/// `"1h 5m"`.
pub fn format_elapsed(secs: f64) -> String {
    let secs = secs.max(0.0);
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let m = (secs / 60.0) as u64;
        let s = secs % 60.0;
        format!("{}m {:.0}s", m, s)
    } else {
        let h = (secs / 3600.0) as u64;
        let m = ((secs % 3600.0) / 60.0) as u64;
        format!("{}h {}m", h, m)
    }
}

/// Render an epoch-seconds timestamp as a local `HH:MM:SS` clock, for
/// timeline display.
pub fn format_clock(epoch_secs: f64) -> String {
    use chrono::TimeZone;
    let secs = epoch_secs.floor() as i64;
    match chrono::Local.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M:%S").to_string(),
        _ => "??:??:??".to_string(),
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
