// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed config records, validated on load.
//!
//! `SwarmConfig` is the operator-facing `swarm-config.yaml`; `TeamConfig`
//! is the machine-written `<state>/config.json` workers read to discover
//! their team (broadcast recipients, mission id, poll cadence).

use crate::status::RoleMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which spawn backend to use.
///
/// `thread` is the historical name for the process-group backend and is
/// kept for config-file compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Auto,
    Tmux,
    #[serde(rename = "thread")]
    Process,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Auto => "auto",
            BackendKind::Tmux => "tmux",
            BackendKind::Process => "thread",
        };
        write!(f, "{}", s)
    }
}

/// Supervisor defaults loaded from `swarm-config.yaml`.
///
/// Absent keys take defaults; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub backend: BackendKind,
    pub default_model: String,
    pub max_parallel: u32,
    pub poll_interval_ms: u64,
    pub permission_mode: String,
    pub audit_enabled: bool,
    pub tui_refresh_rate: u32,
    pub compaction_threshold: u32,
    pub presets: HashMap<String, serde_yaml::Value>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            default_model: "auto-gemini-3".to_string(),
            max_parallel: 5,
            poll_interval_ms: 1000,
            permission_mode: "auto".to_string(),
            audit_enabled: true,
            tui_refresh_rate: 10,
            compaction_threshold: 50,
            presets: HashMap::new(),
        }
    }
}

impl SwarmConfig {
    /// Load from a YAML file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_yaml::to_string(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

/// One roster entry as published to workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub color: String,
    pub model: String,
    pub mode: RoleMode,
}

/// Team roster written once at startup and thereafter read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub mission_id: String,
    pub team_name: String,
    pub leader: String,
    pub backend: String,
    pub poll_interval_ms: u64,
    pub members: Vec<TeamMember>,
}

impl TeamConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write atomically (temp + rename) so a polling worker never reads a
    /// half-written roster.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Broadcast recipients for `sender`: every member except the sender,
    /// regardless of the member's current status.
    pub fn broadcast_recipients(&self, sender: &str) -> Vec<String> {
        self.members
            .iter()
            .filter(|m| !m.name.eq_ignore_ascii_case(sender))
            .map(|m| m.name.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
