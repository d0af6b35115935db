// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent supervisor-owned state.
//!
//! The record is mutated only by the kernel; the durable mission file
//! carries a projection of it (`MissionAgent`), never the record itself.

use crate::progress::LogTail;
use std::path::PathBuf;
use swarm_core::{epoch_s, AgentStatus, RoleMode, StopMode};
use swarm_roster::ResolvedAgent;

/// Message counters from the supervisor's perspective: `sent` to the
/// agent's inbox, `recv` from the agent via the leader inbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MsgCounts {
    pub sent: u64,
    pub recv: u64,
}

/// One worker's full supervisor-side state.
#[derive(Debug)]
pub struct AgentRecord {
    // Static, from the validated roster.
    pub name: String,
    pub mode: RoleMode,
    pub color: String,
    pub model: String,
    pub prompt: String,
    pub log_file: PathBuf,

    // Dynamic, owned by the kernel.
    pub status: AgentStatus,
    pub start_ts: Option<f64>,
    pub end_ts: Option<f64>,
    pub retry_count: u32,
    pub last_progress_ts: f64,
    pub stop_mode: StopMode,
    pub stop_requested_ts: Option<f64>,
    pub failure_reason: Option<String>,
    pub retryable: bool,
    pub saw_completion_signal: bool,
    pub msg_counts: MsgCounts,
    pub backend_handle: Option<String>,
    pub last_log: String,
    pub tail: LogTail,
}

impl AgentRecord {
    pub fn new(agent: ResolvedAgent, log_file: PathBuf) -> Self {
        Self {
            name: agent.name,
            mode: agent.mode,
            color: agent.color,
            model: agent.model,
            prompt: agent.prompt,
            log_file,
            status: AgentStatus::Pending,
            start_ts: None,
            end_ts: None,
            retry_count: 0,
            last_progress_ts: 0.0,
            stop_mode: StopMode::None,
            stop_requested_ts: None,
            failure_reason: None,
            retryable: false,
            saw_completion_signal: false,
            msg_counts: MsgCounts::default(),
            backend_handle: None,
            last_log: String::new(),
            tail: LogTail::new(),
        }
    }

    /// Alive from the backend's point of view.
    pub fn is_live(&self) -> bool {
        matches!(self.status, AgentStatus::Running | AgentStatus::Idle)
            && self.backend_handle.is_some()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transition `pending → running` at (re)spawn time.
    pub fn mark_spawned(&mut self, handle: String) {
        let now = epoch_s();
        self.status = AgentStatus::Running;
        self.start_ts = Some(now);
        self.last_progress_ts = now;
        self.backend_handle = Some(handle);
    }

    pub fn mark_completed(&mut self) {
        self.status = AgentStatus::Completed;
        self.end_ts = Some(epoch_s());
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>, retryable: bool) {
        self.status = AgentStatus::Failed;
        self.end_ts = Some(epoch_s());
        self.failure_reason = Some(reason.into());
        self.retryable = retryable;
    }

    pub fn mark_shutdown(&mut self) {
        self.status = AgentStatus::Shutdown;
        self.end_ts = Some(epoch_s());
        self.retryable = false;
    }

    /// Whether the retry policy may respawn this agent. Operator stops
    /// are final; the watchdog's soft shutdown is not.
    pub fn retry_allowed(&self, max_retries: u32) -> bool {
        self.status == AgentStatus::Failed
            && self.retryable
            && self.retry_count < max_retries
            && !self.stop_mode.is_operator_initiated()
    }

    /// Reset dynamic state for a fresh spawn attempt, keeping the retry
    /// counter.
    pub fn reset_for_retry(&mut self) {
        self.retry_count += 1;
        self.status = AgentStatus::Pending;
        self.start_ts = None;
        self.end_ts = None;
        self.stop_mode = StopMode::None;
        self.stop_requested_ts = None;
        self.failure_reason = None;
        self.retryable = false;
        self.saw_completion_signal = false;
        self.backend_handle = None;
        self.last_progress_ts = 0.0;
        self.tail = LogTail::new();
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
