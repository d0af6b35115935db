// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable mission record.
//!
//! One JSON file per mission under `<state>/missions/`, written only by
//! the supervisor, atomically (temp + rename), after every
//! status-relevant change.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use swarm_core::{epoch_s, short_id, team_slug, AgentStatus, MissionStatus, RoleMode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("mission io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mission encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("mission not found: {0}")]
    NotFound(String),
}

/// Per-agent slice of the mission record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionAgent {
    pub name: String,
    pub mode: RoleMode,
    pub color: String,
    pub status: AgentStatus,
}

/// The mission entity as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionState {
    pub mission_id: String,
    pub description: String,
    pub team_name: String,
    pub started_at: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<f64>,
    pub status: MissionStatus,
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub agents: Vec<MissionAgent>,
}

impl MissionState {
    pub fn create(description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            mission_id: short_id(),
            team_name: team_slug(&description),
            description,
            started_at: epoch_s(),
            ended_at: None,
            status: MissionStatus::Planning,
            attempt: 1,
            failure_reason: None,
            agents: Vec::new(),
        }
    }

    /// Advance the status along the lattice. Regressions and transitions
    /// out of a terminal status are ignored; reaching a terminal status
    /// stamps `ended_at`.
    pub fn advance_status(&mut self, next: MissionStatus) {
        if self.status.is_terminal() || next.rank() < self.status.rank() {
            return;
        }
        self.status = next;
        if next.is_terminal() && self.ended_at.is_none() {
            self.ended_at = Some(epoch_s());
        }
    }

    /// Terminal failure with a reason, via the same monotonic gate.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.failure_reason = Some(reason.into());
        self.advance_status(MissionStatus::Failed);
    }

    pub fn update_agent_status(&mut self, name: &str, status: AgentStatus) {
        if let Some(agent) = self
            .agents
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            agent.status = status;
        }
    }

    /// A mission can be resumed while it is running or paused and at
    /// least one agent has not reached a terminal status.
    pub fn is_resumable(&self) -> bool {
        matches!(
            self.status,
            MissionStatus::Running | MissionStatus::Paused
        ) && self.agents.iter().any(|a| !a.status.is_terminal())
    }
}

/// Directory of mission files.
#[derive(Debug, Clone)]
pub struct MissionStore {
    dir: PathBuf,
}

impl MissionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, mission_id: &str) -> PathBuf {
        self.dir.join(format!("{mission_id}.json"))
    }

    /// Persist atomically: temp file in the same directory, then rename.
    pub fn save(&self, mission: &MissionState) -> Result<(), MissionError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&mission.mission_id);
        let tmp = self.dir.join(format!(".{}.tmp", mission.mission_id));
        let raw = serde_json::to_vec_pretty(mission)?;
        std::fs::write(&tmp, raw)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn load(&self, mission_id: &str) -> Result<MissionState, MissionError> {
        let path = self.path_for(mission_id);
        if !path.exists() {
            return Err(MissionError::NotFound(mission_id.to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Most recently modified mission, if any.
    pub fn latest(&self) -> Option<MissionState> {
        let newest = std::fs::read_dir(&self.dir)
            .ok()?
            .flatten()
            .filter(|e| {
                let p = e.path();
                p.extension().is_some_and(|x| x == "json")
            })
            .max_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()))?;
        let raw = std::fs::read_to_string(newest.path()).ok()?;
        serde_json::from_str(&raw).ok()
    }

    /// Age of a mission in seconds, preferring the file's mtime (the
    /// record is rewritten on every status change) over `started_at`.
    pub fn age_s(&self, mission: &MissionState) -> f64 {
        let mtime_age = std::fs::metadata(self.path_for(&mission.mission_id))
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.elapsed().ok())
            .map(|d| d.as_secs_f64());
        mtime_age.unwrap_or_else(|| epoch_s() - mission.started_at)
    }

    /// True when `mission` is resumable but older than `stale_after_s`.
    pub fn is_stale(&self, mission: &MissionState, stale_after_s: f64) -> bool {
        mission.is_resumable() && self.age_s(mission) > stale_after_s
    }
}

#[cfg(test)]
#[path = "mission_tests.rs"]
mod tests;
