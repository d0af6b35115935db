// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox message wire entity.
//!
//! One message per file; the JSON here is the on-disk format, so field
//! names are frozen (`type`, `ts`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sentinel substring in a `status_update` message announcing that a worker
/// considers itself done. Kept as a content marker rather than a dedicated
/// message type so older consumers keep working.
pub const COMPLETION_SIGNAL: &str = "__AGENT_COMPLETED__";

/// Message types for agent communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Direct,
    Broadcast,
    StatusUpdate,
    Finding,
    ShutdownRequest,
    ShutdownResponse,
    PermissionRequest,
    PermissionResponse,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageType::Direct => "direct",
            MessageType::Broadcast => "broadcast",
            MessageType::StatusUpdate => "status_update",
            MessageType::Finding => "finding",
            MessageType::ShutdownRequest => "shutdown_request",
            MessageType::ShutdownResponse => "shutdown_response",
            MessageType::PermissionRequest => "permission_request",
            MessageType::PermissionResponse => "permission_response",
        };
        write!(f, "{}", s)
    }
}

/// A single inter-agent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub msg_id: String,
    pub sender: String,
    pub recipient: String,
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub content: String,
    /// Epoch seconds at send time.
    pub ts: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Message {
    /// True when this is a `status_update` carrying the completion sentinel.
    pub fn is_completion_signal(&self) -> bool {
        self.msg_type == MessageType::StatusUpdate && self.content.contains(COMPLETION_SIGNAL)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
