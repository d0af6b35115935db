// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-based mailbox for inter-agent communication.
//!
//! Each agent owns `<base>/<agent>/{inbox,processed,heartbeat}`. Messages
//! are individual JSON files written with the temp+rename discipline, so a
//! reader that sees a file by name can always parse it. The inbox has
//! exactly one logical consumer (its owner); producers are unconstrained.
//!
//! Filenames are `{epoch_ms}-{msg_id}.json`, so a lexical sort of one
//! inbox approximates send order.

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swarm_core::{epoch_ms, epoch_s, IdGen, Message, MessageType, UuidIdGen};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("mailbox io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mailbox encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Unread/processed counters for one mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MailboxCounts {
    pub unread: usize,
    pub processed: usize,
}

/// One agent's mailbox handle.
///
/// Cloneable and cheap; directories are created lazily on first use.
#[derive(Clone)]
pub struct Mailbox {
    owner: String,
    base_dir: PathBuf,
    ids: Arc<dyn IdGen>,
}

impl Mailbox {
    pub fn new(owner: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self::with_id_gen(owner, base_dir, Arc::new(UuidIdGen))
    }

    pub fn with_id_gen(
        owner: impl Into<String>,
        base_dir: impl Into<PathBuf>,
        ids: Arc<dyn IdGen>,
    ) -> Self {
        Self {
            owner: owner.into(),
            base_dir: base_dir.into(),
            ids,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn agent_dir(&self, agent: &str) -> PathBuf {
        self.base_dir.join(agent)
    }

    fn inbox_dir(&self, agent: &str) -> PathBuf {
        self.agent_dir(agent).join("inbox")
    }

    fn processed_dir(&self) -> PathBuf {
        self.agent_dir(&self.owner).join("processed")
    }

    /// Send a message into `recipient`'s inbox.
    ///
    /// The message is serialized to a temp file in the destination
    /// directory and renamed into place, so partial writes are never
    /// observable. A failed rename removes the temp file.
    pub fn send(
        &self,
        recipient: &str,
        msg_type: MessageType,
        content: impl Into<String>,
        metadata: Option<HashMap<String, Value>>,
    ) -> Result<Message, MailboxError> {
        let msg = Message {
            msg_id: self.ids.next(),
            sender: self.owner.clone(),
            recipient: recipient.to_string(),
            msg_type,
            content: content.into(),
            ts: epoch_s(),
            metadata: metadata.unwrap_or_default(),
        };

        let inbox = self.inbox_dir(recipient);
        std::fs::create_dir_all(&inbox)?;

        let final_path = inbox.join(format!("{}-{}.json", epoch_ms(), msg.msg_id));
        let tmp_path = inbox.join(format!(".{}.tmp", msg.msg_id));

        let payload = serde_json::to_vec(&msg)?;
        std::fs::write(&tmp_path, payload)?;
        if let Err(e) = std::fs::rename(&tmp_path, &final_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(msg)
    }

    /// Send to every agent in `recipients` except self.
    ///
    /// Individual send failures are collected; the batch never aborts
    /// early. Returns the messages that were delivered and the errors that
    /// were not.
    pub fn broadcast(
        &self,
        recipients: &[String],
        msg_type: MessageType,
        content: &str,
        metadata: Option<HashMap<String, Value>>,
    ) -> (Vec<Message>, Vec<(String, MailboxError)>) {
        let mut sent = Vec::new();
        let mut errors = Vec::new();
        for agent in recipients {
            if agent.eq_ignore_ascii_case(&self.owner) {
                continue;
            }
            match self.send(agent, msg_type, content, metadata.clone()) {
                Ok(msg) => sent.push(msg),
                Err(e) => errors.push((agent.clone(), e)),
            }
        }
        (sent, errors)
    }

    /// Drain the owner's inbox in filename order.
    ///
    /// Each file is parsed, then moved to `processed/` before the message
    /// is pushed to the returned list - a returned message is never seen
    /// again by a later poll. Unparseable or vanished files are skipped
    /// silently.
    pub fn poll(&self) -> Vec<Message> {
        let inbox = self.inbox_dir(&self.owner);
        let mut files = match list_json_files(&inbox) {
            Ok(files) => files,
            Err(_) => return Vec::new(),
        };
        files.sort();

        let processed = self.processed_dir();
        if std::fs::create_dir_all(&processed).is_err() {
            return Vec::new();
        }

        let mut messages = Vec::new();
        for path in files {
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(_) => continue,
            };
            let msg: Message = match serde_json::from_str(&raw) {
                Ok(msg) => msg,
                Err(_) => continue,
            };
            let Some(name) = path.file_name() else {
                continue;
            };
            if std::fs::rename(&path, processed.join(name)).is_err() {
                // The consumer contract requires the file to be out of the
                // inbox before the message is surfaced.
                continue;
            }
            messages.push(msg);
        }
        messages
    }

    /// Cheap unread check with no side effects.
    pub fn has_messages(&self) -> bool {
        list_json_files(&self.inbox_dir(&self.owner))
            .map(|files| !files.is_empty())
            .unwrap_or(false)
    }

    /// Overwrite the owner's heartbeat with the current wall clock.
    /// Write errors are swallowed.
    pub fn write_heartbeat(&self) {
        let dir = self.agent_dir(&self.owner);
        if std::fs::create_dir_all(&dir).is_err() {
            return;
        }
        let _ = std::fs::write(dir.join("heartbeat"), epoch_s().to_string());
    }

    /// Read another agent's heartbeat timestamp, if present and parseable.
    pub fn read_heartbeat(&self, agent: &str) -> Option<f64> {
        let raw = std::fs::read_to_string(self.agent_dir(agent).join("heartbeat")).ok()?;
        raw.trim().parse().ok()
    }

    /// Delete processed messages older than `max_age_s`.
    pub fn cleanup_processed(&self, max_age_s: f64) {
        let Ok(files) = list_json_files(&self.processed_dir()) else {
            return;
        };
        let now = std::time::SystemTime::now();
        for path in files {
            let Ok(meta) = std::fs::metadata(&path) else {
                continue;
            };
            let Ok(modified) = meta.modified() else {
                continue;
            };
            let age = now
                .duration_since(modified)
                .unwrap_or_default()
                .as_secs_f64();
            if age > max_age_s {
                let _ = std::fs::remove_file(&path);
            }
        }
    }

    /// Unread and processed counts for the owner's mailbox.
    pub fn counts(&self) -> MailboxCounts {
        MailboxCounts {
            unread: list_json_files(&self.inbox_dir(&self.owner))
                .map(|f| f.len())
                .unwrap_or(0),
            processed: list_json_files(&self.processed_dir())
                .map(|f| f.len())
                .unwrap_or(0),
        }
    }
}

/// Enumerate every processed message under a mailbox base, sorted by
/// timestamp. Read-only observer surface; skips anything unreadable.
pub fn all_processed_messages(base_dir: &Path) -> Vec<Message> {
    let mut messages = Vec::new();
    let Ok(agents) = std::fs::read_dir(base_dir) else {
        return messages;
    };
    for entry in agents.flatten() {
        let processed = entry.path().join("processed");
        let Ok(files) = list_json_files(&processed) else {
            continue;
        };
        for path in files {
            let Ok(raw) = std::fs::read_to_string(&path) else {
                continue;
            };
            if let Ok(msg) = serde_json::from_str::<Message>(&raw) {
                messages.push(msg);
            }
        }
    }
    messages.sort_by(|a, b| a.ts.total_cmp(&b.ts));
    messages
}

fn list_json_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|x| x == "json") {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
