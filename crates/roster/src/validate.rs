// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pre-run roster validation.
//!
//! Failures are fatal before any spawn and carry stable tokens so callers
//! (and the retry driver above us) can branch on them without string
//! scraping.

use crate::agent_def::{AgentDef, ResolvedAgent, VALIDATOR_NAME};
use crate::template::missing_sections;
use swarm_core::{assign_color, RoleMode};

/// A pre-run validation failure with its stable token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub token: String,
    pub detail: String,
}

impl ValidationFailure {
    fn new(token: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.token, self.detail)
    }
}

/// Validate a parsed roster and resolve every agent.
///
/// Checks, in order: the hard-required keys (`name`, `prompt`), name
/// usability, presence of the `Quality_Validator` entry, and the six
/// required prompt sections. The validator entry is forced to
/// `validator` mode regardless of its declared mode. The remaining keys
/// default instead of failing: `default_model` fills a missing `model`,
/// a missing `color` is assigned from the palette, and a missing `mode`
/// is `parallel`.
pub fn validate_roster(
    roster: &[AgentDef],
    default_model: &str,
) -> Result<Vec<ResolvedAgent>, Vec<ValidationFailure>> {
    let mut failures = Vec::new();
    let mut resolved = Vec::new();

    if roster.is_empty() {
        return Err(vec![ValidationFailure::new(
            "invalid_subagent_config",
            "roster has no subagents",
        )]);
    }

    for (i, def) in roster.iter().enumerate() {
        // name and prompt cannot be defaulted; color, model and mode can.
        for (key, value) in [("name", &def.name), ("prompt", &def.prompt)] {
            if value.as_deref().map_or(true, str::is_empty) {
                failures.push(ValidationFailure::new(
                    format!("agent_{i}_missing_{key}"),
                    format!("subagent #{i} has no {key}"),
                ));
            }
        }

        let Some(name) = def.name.clone().filter(|n| !n.is_empty()) else {
            continue;
        };

        // Names become mailbox directories and `name@team` ids.
        if name.contains('@') || name.eq_ignore_ascii_case(swarm_core::LEADER_NAME) {
            failures.push(ValidationFailure::new(
                format!("agent_{i}_invalid_name"),
                format!("'{name}' is not a usable agent name"),
            ));
            continue;
        }

        let Some(prompt) = def.prompt.clone().filter(|p| !p.is_empty()) else {
            continue;
        };

        for section in missing_sections(&prompt) {
            failures.push(ValidationFailure::new(
                format!("agent_{i}_prompt_missing_section:{section}"),
                format!("prompt for {name} lacks the {section} section"),
            ));
        }

        let mode = if name == VALIDATOR_NAME {
            RoleMode::Validator
        } else {
            def.mode.unwrap_or_default()
        };

        resolved.push(ResolvedAgent {
            color: def
                .color
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| assign_color(i).to_string()),
            model: def
                .model
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| default_model.to_string()),
            mode,
            name,
            prompt,
        });
    }

    if !resolved.iter().any(|a| a.is_validator()) {
        failures.push(ValidationFailure::new(
            "missing_quality_validator",
            format!("roster must include a {VALIDATOR_NAME} agent"),
        ));
    }

    if failures.is_empty() {
        Ok(resolved)
    } else {
        tracing::warn!(count = failures.len(), "roster validation failed");
        Err(failures)
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
