// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator commands from stdin.
//!
//! A background task owns the blocking stdin reads and hands parsed
//! commands to the kernel over a channel; the kernel drains the channel
//! once per tick and never blocks on input itself.
//!
//! Commands: `q` (graceful shutdown of all agents), `k [name]` (force
//! kill all or one), `s <name>` (graceful shutdown of one).

use tokio::sync::mpsc;

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCommand {
    ShutdownAll,
    KillAll,
    Shutdown(String),
    Kill(String),
}

/// Parse one input line into a command.
pub fn parse_command(line: &str) -> Option<KeyCommand> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?;
    let target = parts.next();
    match (verb, target) {
        ("q", None) => Some(KeyCommand::ShutdownAll),
        ("k", None) => Some(KeyCommand::KillAll),
        ("k", Some(name)) => Some(KeyCommand::Kill(name.to_string())),
        ("s", Some(name)) => Some(KeyCommand::Shutdown(name.to_string())),
        _ => None,
    }
}

/// Spawn the stdin listener. The receiver yields commands until stdin
/// reaches EOF (e.g. detached background runs, which simply never
/// produce any).
pub fn spawn_key_listener() -> mpsc::UnboundedReceiver<KeyCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || {
        use std::io::BufRead;
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if let Some(cmd) = parse_command(&line) {
                if tx.send(cmd).is_err() {
                    break;
                }
            }
        }
    });
    rx
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
