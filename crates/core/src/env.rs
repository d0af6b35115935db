// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for supervisor and worker
//! tunables. All durations are decimal seconds; invalid values fall back
//! to the documented defaults.

use std::time::Duration;

fn parse_secs(raw: Option<String>, default_s: f64) -> Duration {
    let secs = raw
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(default_s);
    Duration::from_secs_f64(secs)
}

fn env_secs(var: &str, default_s: f64) -> Duration {
    parse_secs(std::env::var(var).ok(), default_s)
}

/// Per-task LLM deadline inside each worker (default: 240s).
pub fn task_timeout() -> Duration {
    env_secs("AG_SWARM_TASK_TIMEOUT_SECONDS", 240.0)
}

/// Idle window after which a worker promotes itself to completed
/// (default: 120s).
pub fn agent_idle_timeout() -> Duration {
    env_secs("AG_SWARM_AGENT_IDLE_TIMEOUT_SECONDS", 120.0)
}

/// Supervisor watchdog: no-progress window before a soft shutdown request
/// (default: 90s).
pub fn watchdog_timeout() -> Duration {
    env_secs("AG_SWARM_WATCHDOG_SECONDS", 90.0)
}

/// Grace after the watchdog's shutdown request before the agent is failed
/// (default: 15s).
pub fn watchdog_grace() -> Duration {
    env_secs("AG_SWARM_WATCHDOG_GRACE_SECONDS", 15.0)
}

/// Retry budget per agent (default: 1, capped at 5).
pub fn max_retries() -> u32 {
    let parsed = std::env::var("AG_SWARM_MAX_RETRIES")
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(1);
    parsed.min(5)
}

/// Cooldown between a failure and its respawn (default: 0.3s).
pub fn retry_cooldown() -> Duration {
    env_secs("AG_SWARM_RETRY_COOLDOWN_SECONDS", 0.3)
}

/// Whole-mission deadline. `None` when unset or zero (the default).
pub fn hard_timeout() -> Option<Duration> {
    let d = env_secs("AG_SWARM_HARD_TIMEOUT_SECONDS", 0.0);
    (!d.is_zero()).then_some(d)
}

/// Age beyond which a resumable mission is considered stale
/// (default: 1800s).
pub fn resume_stale() -> Duration {
    env_secs("AG_SWARM_RESUME_STALE_SECONDS", 1800.0)
}

/// Simulated failure probability for demo runs, clamped to 0.0..=1.0
/// (default: 0.0).
pub fn demo_fail_rate() -> f64 {
    std::env::var("AG_SWARM_DEMO_FAIL_RATE")
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
