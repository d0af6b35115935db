// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent definitions as declared in `subagents.yaml`.

use serde::{Deserialize, Serialize};
use swarm_core::RoleMode;

/// Roster entry that must be present and is always scheduled last.
pub const VALIDATOR_NAME: &str = "Quality_Validator";

/// One roster entry as parsed.
///
/// Every field is optional here so that validation, not deserialization,
/// owns the failure reporting - missing keys become stable tokens instead
/// of serde messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDef {
    pub name: Option<String>,
    pub color: Option<String>,
    pub model: Option<String>,
    pub mode: Option<RoleMode>,
    pub prompt: Option<String>,
    /// Free-form role description; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A validated roster entry with every field resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAgent {
    pub name: String,
    pub color: String,
    pub model: String,
    pub mode: RoleMode,
    pub prompt: String,
}

impl ResolvedAgent {
    pub fn is_validator(&self) -> bool {
        self.name == VALIDATOR_NAME
    }
}
