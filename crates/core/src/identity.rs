// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity.
//!
//! An agent is addressed by `(name, team)`; the canonical id is
//! `lower(name)@team`. The name `leader` is reserved for the supervisor's
//! own mailbox within every team.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reserved agent name for the supervisor's inbox.
pub const LEADER_NAME: &str = "leader";

/// Errors from identity construction and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("agent name must not contain '@': {0}")]
    InvalidName(String),
    #[error("team name must not contain '@': {0}")]
    InvalidTeam(String),
    #[error("agent id must have the form name@team: {0}")]
    Malformed(String),
}

/// Agent identity: a display name and the team it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentName {
    name: String,
    team: String,
}

impl AgentName {
    pub fn new(name: impl Into<String>, team: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        let team = team.into();
        if name.contains('@') {
            return Err(IdentityError::InvalidName(name));
        }
        if team.contains('@') {
            return Err(IdentityError::InvalidTeam(team));
        }
        Ok(Self { name, team })
    }

    /// Parse a canonical `name@team` id.
    pub fn parse(id: &str) -> Result<Self, IdentityError> {
        match id.split_once('@') {
            Some((name, team)) if !name.is_empty() && !team.is_empty() && !team.contains('@') => {
                Self::new(name, team)
            }
            _ => Err(IdentityError::Malformed(id.to_string())),
        }
    }

    /// Leader identity for a team.
    pub fn leader(team: impl Into<String>) -> Result<Self, IdentityError> {
        Self::new(LEADER_NAME, team)
    }

    /// Display name as declared in the roster.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    /// Canonical id: `lower(name)@team`.
    pub fn canonical_id(&self) -> String {
        format!("{}@{}", self.name.to_lowercase(), self.team)
    }

    pub fn is_leader(&self) -> bool {
        self.name.eq_ignore_ascii_case(LEADER_NAME)
    }

    /// Case-insensitive name comparison, for correlating message senders
    /// back to roster entries.
    pub fn matches_name(&self, other: &str) -> bool {
        self.name.to_lowercase() == other.to_lowercase()
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_id())
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
