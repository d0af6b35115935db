// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    unset = { None, 240.0 },
    valid = { Some("12.5"), 12.5 },
    integer = { Some("30"), 30.0 },
    padded = { Some(" 5 "), 5.0 },
    garbage = { Some("soon"), 240.0 },
    negative = { Some("-3"), 240.0 },
    nan = { Some("NaN"), 240.0 },
)]
fn parse_secs_falls_back_on_bad_input(raw: Option<&str>, expected_s: f64) {
    let parsed = parse_secs(raw.map(String::from), 240.0);
    assert_eq!(parsed, Duration::from_secs_f64(expected_s));
}

#[test]
fn defaults_match_documented_values() {
    // Relies on the variables being unset in the test environment; the
    // accessors read fixed names so there is nothing to inject here.
    for var in [
        "AG_SWARM_TASK_TIMEOUT_SECONDS",
        "AG_SWARM_AGENT_IDLE_TIMEOUT_SECONDS",
        "AG_SWARM_WATCHDOG_SECONDS",
        "AG_SWARM_WATCHDOG_GRACE_SECONDS",
        "AG_SWARM_MAX_RETRIES",
        "AG_SWARM_HARD_TIMEOUT_SECONDS",
        "AG_SWARM_RESUME_STALE_SECONDS",
    ] {
        assert!(std::env::var(var).is_err(), "{var} leaked into tests");
    }

    assert_eq!(task_timeout(), Duration::from_secs(240));
    assert_eq!(agent_idle_timeout(), Duration::from_secs(120));
    assert_eq!(watchdog_timeout(), Duration::from_secs(90));
    assert_eq!(watchdog_grace(), Duration::from_secs(15));
    assert_eq!(max_retries(), 1);
    assert_eq!(hard_timeout(), None);
    assert_eq!(resume_stale(), Duration::from_secs(1800));
    assert_eq!(demo_fail_rate(), 0.0);
}
