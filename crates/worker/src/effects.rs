// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Side-effect execution.
//!
//! The stream parser produces values; this module applies them - file
//! writes, shell commands, mailbox traffic - and audits every one.
//! Effect failures are audited and swallowed: a bad tag never takes the
//! worker down.

use crate::stream::{SideEffect, StreamItem, StreamNote};
use std::path::{Path, PathBuf};
use std::time::Duration;
use swarm_core::{MessageType, TeamConfig};
use swarm_store::{AuditKind, AuditLog, Mailbox};
use tokio::process::Command;

/// Deadline for one `<<RUN_COMMAND>>` shell invocation. A safety net for
/// runaway user scripts, not a scheduling control.
pub const SHELL_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Applies parsed stream items for one worker.
pub struct EffectExecutor {
    agent_name: String,
    mailbox: Mailbox,
    audit: AuditLog,
    team: TeamConfig,
    /// Base directory for relative file writes (the project root).
    work_dir: PathBuf,
}

impl EffectExecutor {
    pub fn new(
        agent_name: impl Into<String>,
        mailbox: Mailbox,
        audit: AuditLog,
        team: TeamConfig,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            mailbox,
            audit,
            team,
            work_dir: work_dir.into(),
        }
    }

    /// Apply one item. Returns a human-readable line for the worker's
    /// log tee, when there is something worth echoing.
    pub async fn apply(&self, item: StreamItem) -> Option<String> {
        match item {
            StreamItem::Effect(effect) => self.apply_effect(effect).await,
            StreamItem::Note(note) => {
                self.apply_note(&note);
                None
            }
        }
    }

    fn apply_note(&self, note: &StreamNote) {
        match note {
            StreamNote::BufferTrimmed { dropped_bytes } => {
                self.audit.record(
                    &self.agent_name,
                    AuditKind::Warning,
                    &format!("stream_buffer_trimmed: dropped {dropped_bytes} bytes"),
                    None,
                );
            }
            StreamNote::OrphanTags { tags } => {
                self.audit.record(
                    &self.agent_name,
                    AuditKind::Warning,
                    &format!("stream_orphan_tags: {}", tags.join(", ")),
                    None,
                );
            }
            StreamNote::OversizedPayload { tag, size, limit } => {
                self.audit.record(
                    &self.agent_name,
                    AuditKind::Error,
                    &format!("oversized payload for {tag}: {size} bytes (limit {limit})"),
                    None,
                );
            }
        }
    }

    async fn apply_effect(&self, effect: SideEffect) -> Option<String> {
        match effect {
            SideEffect::WriteFile { path, content } => self.write_file(&path, &content),
            SideEffect::RunCommand { command } => self.run_command(&command).await,
            SideEffect::SendMessage { to, content } => self.send_message(&to, &content),
            SideEffect::Broadcast { content } => self.broadcast(&content),
        }
    }

    fn write_file(&self, path: &str, content: &str) -> Option<String> {
        let target = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.work_dir.join(path)
        };

        match atomic_write(&target, content) {
            Ok(()) => {
                self.audit
                    .record(&self.agent_name, AuditKind::FileWrite, path, None);
                Some(format!("wrote {path}"))
            }
            Err(e) => {
                self.audit.record(
                    &self.agent_name,
                    AuditKind::Error,
                    &format!("file write failed for {path}: {e}"),
                    None,
                );
                Some(format!("file write failed: {path}"))
            }
        }
    }

    async fn run_command(&self, command: &str) -> Option<String> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .current_dir(&self.work_dir)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);

        let result = tokio::time::timeout(SHELL_COMMAND_TIMEOUT, cmd.output()).await;
        match result {
            Ok(Ok(output)) => {
                let code = output.status.code().unwrap_or(-1);
                let meta = std::collections::HashMap::from([(
                    "exit_code".to_string(),
                    serde_json::json!(code),
                )]);
                self.audit
                    .record(&self.agent_name, AuditKind::CommandExec, command, Some(meta));

                let mut echo = format!("$ {command} (exit {code})");
                let stdout = String::from_utf8_lossy(&output.stdout);
                if !stdout.trim().is_empty() {
                    echo.push('\n');
                    echo.push_str(stdout.trim_end());
                }
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.trim().is_empty() {
                    echo.push('\n');
                    echo.push_str(stderr.trim_end());
                }
                Some(echo)
            }
            Ok(Err(e)) => {
                self.audit.record(
                    &self.agent_name,
                    AuditKind::Error,
                    &format!("command spawn failed: {e}"),
                    None,
                );
                Some(format!("command failed to start: {command}"))
            }
            Err(_) => {
                self.audit.record(
                    &self.agent_name,
                    AuditKind::Error,
                    &format!(
                        "command timeout after {}s: {command}",
                        SHELL_COMMAND_TIMEOUT.as_secs()
                    ),
                    None,
                );
                Some(format!("command timed out: {command}"))
            }
        }
    }

    fn send_message(&self, to: &str, content: &str) -> Option<String> {
        match self.mailbox.send(to, MessageType::Direct, content, None) {
            Ok(_) => {
                self.audit.record(
                    &self.agent_name,
                    AuditKind::MessageSent,
                    &format!("direct to {to}"),
                    None,
                );
                Some(format!("sent message to {to}"))
            }
            Err(e) => {
                self.audit.record(
                    &self.agent_name,
                    AuditKind::Error,
                    &format!("mailbox send to {to} failed: {e}"),
                    None,
                );
                Some(format!("message to {to} failed"))
            }
        }
    }

    fn broadcast(&self, content: &str) -> Option<String> {
        let recipients = self.team.broadcast_recipients(&self.agent_name);
        let (sent, errors) =
            self.mailbox
                .broadcast(&recipients, MessageType::Broadcast, content, None);

        if !sent.is_empty() {
            self.audit.record(
                &self.agent_name,
                AuditKind::MessageSent,
                &format!("broadcast to {} agents", sent.len()),
                None,
            );
        }
        for (agent, e) in &errors {
            self.audit.record(
                &self.agent_name,
                AuditKind::Error,
                &format!("mailbox broadcast to {agent} failed: {e}"),
                None,
            );
        }
        Some(format!(
            "broadcast to {} agents ({} failed)",
            sent.len(),
            errors.len()
        ))
    }
}

/// Create parent directories and write atomically (temp + rename).
fn atomic_write(target: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = target.with_extension("swarm-tmp");
    std::fs::write(&tmp, content)?;
    if let Err(e) = std::fs::rename(&tmp, target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
#[path = "effects_tests.rs"]
mod tests;
