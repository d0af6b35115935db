// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit trail, one JSONL file per mission.
//!
//! The writer opens in append mode per call; failures to append are
//! swallowed - the system must never crash because it cannot log.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use swarm_core::epoch_s;

/// Audit event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Spawned,
    StatusChange,
    FileWrite,
    CommandExec,
    MessageSent,
    MessageReceived,
    Shutdown,
    Error,
    Warning,
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditKind::Spawned => "spawned",
            AuditKind::StatusChange => "status_change",
            AuditKind::FileWrite => "file_write",
            AuditKind::CommandExec => "command_exec",
            AuditKind::MessageSent => "message_sent",
            AuditKind::MessageReceived => "message_received",
            AuditKind::Shutdown => "shutdown",
            AuditKind::Error => "error",
            AuditKind::Warning => "warning",
        };
        write!(f, "{}", s)
    }
}

/// Failure classes attached to `error` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    ConfigError,
    TimeoutError,
    MailboxError,
    ProcessError,
    Interrupted,
    UnknownError,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::ConfigError => "config_error",
            FailureClass::TimeoutError => "timeout_error",
            FailureClass::MailboxError => "mailbox_error",
            FailureClass::ProcessError => "process_error",
            FailureClass::Interrupted => "interrupted",
            FailureClass::UnknownError => "unknown_error",
        }
    }

    /// Classify an error detail by substring when the caller did not
    /// attach an explicit class.
    pub fn classify(detail: &str) -> Self {
        let text = detail.to_lowercase();
        if text.contains("config") || text.contains("yaml") {
            FailureClass::ConfigError
        } else if text.contains("timeout") {
            FailureClass::TimeoutError
        } else if text.contains("mailbox") {
            FailureClass::MailboxError
        } else if text.contains("process exited")
            || text.contains("returncode")
            || text.contains("spawn")
        {
            FailureClass::ProcessError
        } else if text.contains("interrupt") {
            FailureClass::Interrupted
        } else {
            FailureClass::UnknownError
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub ts: f64,
    pub agent: String,
    pub event: AuditKind,
    pub detail: String,
    #[serde(default)]
    pub meta: HashMap<String, serde_json::Value>,
}

impl AuditEvent {
    pub fn failure_class(&self) -> Option<&str> {
        self.meta.get("failure_class").and_then(|v| v.as_str())
    }
}

/// Per-agent counters in the audit summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentCounters {
    pub events: u64,
    pub file_writes: u64,
    pub commands: u64,
    pub messages: u64,
}

/// Aggregate view over one mission's audit trail.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditSummary {
    pub total_events: u64,
    pub file_writes: u64,
    pub commands_run: u64,
    pub messages_sent: u64,
    pub errors: u64,
    pub failure_classes: HashMap<String, u64>,
    pub agents: HashMap<String, AgentCounters>,
    pub files_modified: BTreeSet<String>,
}

/// Timeline projection for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub ts: f64,
    pub agent: String,
    pub event: String,
    pub detail: String,
    pub failure_class: String,
}

/// Append-only audit trail for one mission.
#[derive(Debug, Clone)]
pub struct AuditLog {
    log_path: PathBuf,
}

impl AuditLog {
    pub fn new(mission_id: &str, audit_dir: impl Into<PathBuf>) -> Self {
        let dir: PathBuf = audit_dir.into();
        Self {
            log_path: dir.join(format!("mission-{mission_id}.jsonl")),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Record an audit event.
    ///
    /// `error` events get a `failure_class` synthesized from the detail
    /// when the caller did not provide one. Append failures never
    /// propagate.
    pub fn record(
        &self,
        agent: &str,
        event: AuditKind,
        detail: &str,
        meta: Option<HashMap<String, serde_json::Value>>,
    ) {
        let mut meta = meta.unwrap_or_default();
        if event == AuditKind::Error && !meta.contains_key("failure_class") {
            meta.insert(
                "failure_class".to_string(),
                serde_json::Value::String(FailureClass::classify(detail).as_str().to_string()),
            );
        }

        let entry = AuditEvent {
            ts: epoch_s(),
            agent: agent.to_string(),
            event,
            detail: detail.to_string(),
            meta,
        };

        if let Err(e) = self.append(&entry) {
            tracing::warn!(error = %e, "failed to append audit event");
        }
    }

    fn append(&self, entry: &AuditEvent) -> std::io::Result<()> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(entry).map_err(std::io::Error::other)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Linear scan of the whole trail; malformed lines are skipped.
    pub fn read_all(&self) -> Vec<AuditEvent> {
        let Ok(raw) = std::fs::read_to_string(&self.log_path) else {
            return Vec::new();
        };
        raw.lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }

    pub fn read_for_agent(&self, agent: &str) -> Vec<AuditEvent> {
        self.read_all()
            .into_iter()
            .filter(|e| e.agent == agent)
            .collect()
    }

    /// Totals and per-agent counters over the whole trail.
    pub fn get_summary(&self) -> AuditSummary {
        let mut summary = AuditSummary::default();
        for e in self.read_all() {
            summary.total_events += 1;
            let agent = summary.agents.entry(e.agent.clone()).or_default();
            agent.events += 1;
            match e.event {
                AuditKind::FileWrite => {
                    summary.file_writes += 1;
                    agent.file_writes += 1;
                    summary.files_modified.insert(e.detail.clone());
                }
                AuditKind::CommandExec => {
                    summary.commands_run += 1;
                    agent.commands += 1;
                }
                AuditKind::MessageSent => {
                    summary.messages_sent += 1;
                    agent.messages += 1;
                }
                AuditKind::Error => {
                    summary.errors += 1;
                    let class = e.failure_class().unwrap_or("unknown_error").to_string();
                    *summary.failure_classes.entry(class).or_insert(0) += 1;
                }
                _ => {}
            }
        }
        summary
    }

    /// The last `limit` events, sorted by timestamp, projected for display.
    pub fn get_timeline(&self, limit: usize) -> Vec<TimelineEntry> {
        let mut entries = self.read_all();
        entries.sort_by(|a, b| a.ts.total_cmp(&b.ts));
        if limit > 0 && entries.len() > limit {
            entries.drain(..entries.len() - limit);
        }
        entries
            .into_iter()
            .map(|e| TimelineEntry {
                ts: e.ts,
                agent: e.agent.clone(),
                event: e.event.to_string(),
                detail: e.detail.clone(),
                failure_class: e.failure_class().unwrap_or("").to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
