// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "hello", "hello" },
    path = { "logs/rust_coder.log", "logs/rust_coder.log" },
    flag = { "--exit-on-idle", "--exit-on-idle" },
    spaces = { "two words", "'two words'" },
    quote = { "it's", "'it'\\''s'" },
    empty = { "", "''" },
    dollar = { "$HOME", "'$HOME'" },
)]
fn shell_quote_cases(input: &str, expected: &str) {
    assert_eq!(shell_quote(input), expected);
}

#[parameterized(
    named = { "red", "red" },
    bright = { "bright_red", "colour196" },
    unknown = { "chartreuse", "white" },
)]
fn tmux_color_cases(input: &str, expected: &str) {
    assert_eq!(tmux_color(input), expected);
}

#[test]
fn parse_pane_rows_reads_alive_and_dead() {
    let listing = "%0 0 \n%1 1 0\n%2 1 137\n";
    let table = parse_pane_rows(listing);

    assert_eq!(table.get("%0"), Some(&(true, None)));
    assert_eq!(table.get("%1"), Some(&(false, Some(0))));
    assert_eq!(table.get("%2"), Some(&(false, Some(137))));
}

#[test]
fn parse_pane_rows_skips_malformed() {
    let table = parse_pane_rows("garbage\n%3 0\n\n");
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("%3"), Some(&(true, None)));
}

#[test]
fn availability_requires_unset_tmux_var() {
    // The check combines a PATH probe with the nesting guard; only the
    // nesting half is deterministic in tests.
    if std::env::var_os("TMUX").is_some() {
        assert!(!TmuxBackend::is_available());
    }
}
