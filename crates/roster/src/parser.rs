// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Roster file loading.

use crate::agent_def::AgentDef;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from roster loading. `token()` yields the stable failure token
/// reported on stdout before exit.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster file not found: {0}")]
    Missing(String),
    #[error("roster file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("roster yaml invalid: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RosterError {
    pub fn token(&self) -> &'static str {
        match self {
            RosterError::Missing(_) => "missing_config",
            RosterError::Io(_) => "missing_config",
            RosterError::Yaml(_) => "invalid_subagent_config",
        }
    }
}

/// Parsed `subagents.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Roster {
    #[serde(default)]
    pub subagents: Vec<AgentDef>,
}

/// Parse roster YAML from a string.
pub fn parse_roster(raw: &str) -> Result<Roster, RosterError> {
    Ok(serde_yaml::from_str(raw)?)
}

/// Load and parse a roster file.
pub fn load_roster(path: &Path) -> Result<Roster, RosterError> {
    if !path.exists() {
        return Err(RosterError::Missing(path.display().to_string()));
    }
    let raw = std::fs::read_to_string(path)?;
    parse_roster(&raw)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
