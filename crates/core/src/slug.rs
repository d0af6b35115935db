// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team-name slugs derived from mission descriptions.

/// Maximum slug length.
const MAX_LEN: usize = 30;

/// Derive a team slug from a mission description: the first three
/// alphanumeric tokens, lowercased and joined with dashes, capped at 30
/// characters. Falls back to `"mission"` when nothing usable remains.
pub fn team_slug(description: &str) -> String {
    let slug: String = description
        .to_lowercase()
        .split_whitespace()
        .take(3)
        .filter(|w| w.chars().all(|c| c.is_alphanumeric()))
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(MAX_LEN)
        .collect();

    if slug.is_empty() {
        "mission".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
