// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    simple = { "Fix auth bug", "fix-auth-bug" },
    truncates_tokens = { "build the new reporting pipeline", "build-the-new" },
    skips_non_alnum = { "fix auth! bug", "fix-bug" },
    empty = { "", "mission" },
    punctuation_only = { "?! ---", "mission" },
)]
fn team_slug_cases(description: &str, expected: &str) {
    assert_eq!(team_slug(description), expected);
}

#[test]
fn team_slug_caps_length() {
    let slug = team_slug("abcdefghijklmnop qrstuvwxyzabcdef xyz");
    assert!(slug.len() <= 30, "slug too long: {slug}");
}
