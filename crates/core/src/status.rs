// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status and mode enums shared between the supervisor and its records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Pending,
    Running,
    Idle,
    Completed,
    Failed,
    Shutdown,
}

impl AgentStatus {
    /// Terminal statuses are never left again within a mission attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentStatus::Completed | AgentStatus::Failed | AgentStatus::Shutdown
        )
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStatus::Pending => "pending",
            AgentStatus::Running => "running",
            AgentStatus::Idle => "idle",
            AgentStatus::Completed => "completed",
            AgentStatus::Failed => "failed",
            AgentStatus::Shutdown => "shutdown",
        };
        write!(f, "{}", s)
    }
}

/// Scheduling phase an agent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleMode {
    #[default]
    Parallel,
    Serial,
    Validator,
}

impl fmt::Display for RoleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoleMode::Parallel => "parallel",
            RoleMode::Serial => "serial",
            RoleMode::Validator => "validator",
        };
        write!(f, "{}", s)
    }
}

/// Why an agent is stopping. Gates the retry policy: operator-initiated
/// stops are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StopMode {
    #[default]
    None,
    GracefulShutdown,
    WatchdogSoftShutdown,
    ForceKill,
    HardTimeout,
}

impl StopMode {
    /// True for stops a human (or the hard mission deadline) asked for.
    /// The watchdog's soft shutdown stays retryable.
    pub fn is_operator_initiated(&self) -> bool {
        matches!(
            self,
            StopMode::GracefulShutdown | StopMode::ForceKill | StopMode::HardTimeout
        )
    }
}

impl fmt::Display for StopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopMode::None => "none",
            StopMode::GracefulShutdown => "graceful_shutdown",
            StopMode::WatchdogSoftShutdown => "watchdog_soft_shutdown",
            StopMode::ForceKill => "force_kill",
            StopMode::HardTimeout => "hard_timeout",
        };
        write!(f, "{}", s)
    }
}

/// Mission lifecycle status. Progresses monotonically:
/// `planning → running → {completed | failed}` (with `paused` as a
/// resumable stop between `running` and the terminals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Planning,
    Running,
    Paused,
    Completed,
    Failed,
}

impl MissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Failed)
    }

    /// Position in the status lattice; a mission never moves to a
    /// lower-ranked status.
    pub fn rank(&self) -> u8 {
        match self {
            MissionStatus::Planning => 0,
            MissionStatus::Running => 1,
            MissionStatus::Paused => 1,
            MissionStatus::Completed => 2,
            MissionStatus::Failed => 2,
        }
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MissionStatus::Planning => "planning",
            MissionStatus::Running => "running",
            MissionStatus::Paused => "paused",
            MissionStatus::Completed => "completed",
            MissionStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
