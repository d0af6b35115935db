// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux backend: every worker runs as a pane in one persistent session,
//! color-coded and titled, so an operator can attach and watch the fleet.
//!
//! Panes are kept alive after their command exits (`remain-on-exit`) so
//! the exit status stays readable as a pane attribute. Liveness routes
//! through one batched `list-panes` call per query.

use crate::subprocess::{run_with_timeout, TMUX_TIMEOUT};
use crate::{BackendError, SpawnBackend};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::process::Command;

/// Delay between the interrupt keys and removing the pane.
const INTERRUPT_GRACE: Duration = Duration::from_millis(500);

/// Palette name → tmux color.
fn tmux_color(color: &str) -> &str {
    match color {
        "red" | "blue" | "green" | "yellow" | "magenta" | "cyan" | "white" => color,
        "bright_red" => "colour196",
        _ => "white",
    }
}

/// Quote one argv element for `sh` inside `send-keys`.
fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@=%+".contains(c))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', "'\\''"))
}

#[derive(Default)]
struct TmuxState {
    panes: HashMap<String, String>,
    session_created: bool,
}

/// Spawn backend over panes of a single tmux session.
pub struct TmuxBackend {
    session: String,
    state: Mutex<TmuxState>,
}

impl TmuxBackend {
    /// One session per supervisor process.
    pub fn new() -> Result<Self, BackendError> {
        if swarm_core::find_executable("tmux").is_none() {
            return Err(BackendError::Unavailable("tmux not found on PATH".into()));
        }
        Ok(Self {
            session: format!("agswarm-{}", std::process::id()),
            state: Mutex::new(TmuxState::default()),
        })
    }

    /// Usable when tmux exists and the supervisor is not already nested
    /// inside a tmux client.
    pub fn is_available() -> bool {
        swarm_core::find_executable("tmux").is_some() && std::env::var_os("TMUX").is_none()
    }

    pub fn session_name(&self) -> &str {
        &self.session
    }

    async fn run_tmux(&self, args: &[&str]) -> Result<String, BackendError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        let output = run_with_timeout(cmd, TMUX_TIMEOUT, "tmux")
            .await
            .map_err(BackendError::CommandFailed)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::CommandFailed(format!(
                "tmux {}: {}",
                args.first().copied().unwrap_or(""),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Fire-and-forget variant for commands whose failure is benign.
    async fn run_tmux_quiet(&self, args: &[&str]) {
        if let Err(e) = self.run_tmux(args).await {
            tracing::debug!(error = %e, "tmux command ignored failure");
        }
    }

    async fn ensure_session(&self) -> Result<(), BackendError> {
        if self.state.lock().session_created {
            return Ok(());
        }

        // Replace any leftover session from a crashed run of this pid.
        self.run_tmux_quiet(&["kill-session", "-t", &self.session])
            .await;
        self.run_tmux(&[
            "new-session",
            "-d",
            "-s",
            &self.session,
            "-x",
            "220",
            "-y",
            "50",
        ])
        .await?;
        self.run_tmux_quiet(&[
            "set-option",
            "-t",
            &self.session,
            "pane-border-status",
            "top",
        ])
        .await;
        self.run_tmux_quiet(&[
            "set-option",
            "-t",
            &self.session,
            "pane-border-format",
            " #{pane_title} ",
        ])
        .await;

        self.state.lock().session_created = true;
        Ok(())
    }

    async fn rebalance(&self) {
        self.run_tmux_quiet(&["select-layout", "-t", &self.session, "tiled"])
            .await;
    }

    /// One batched pane listing: pane id → (alive, dead status).
    async fn pane_table(&self) -> HashMap<String, (bool, Option<i32>)> {
        let listing = self
            .run_tmux(&[
                "list-panes",
                "-s",
                "-t",
                &self.session,
                "-F",
                "#{pane_id} #{pane_dead} #{pane_dead_status}",
            ])
            .await
            .unwrap_or_default();
        parse_pane_rows(&listing)
    }
}

/// Parse `list-panes` rows of the form `%id dead_flag [dead_status]`.
fn parse_pane_rows(listing: &str) -> HashMap<String, (bool, Option<i32>)> {
    let mut table = HashMap::new();
    for row in listing.lines() {
        let mut parts = row.split_whitespace();
        let (Some(id), Some(dead)) = (parts.next(), parts.next()) else {
            continue;
        };
        let alive = dead == "0";
        let code = parts.next().and_then(|s| s.parse::<i32>().ok());
        table.insert(id.to_string(), (alive, code));
    }
    table
}

#[async_trait]
impl SpawnBackend for TmuxBackend {
    async fn spawn(
        &self,
        agent_name: &str,
        argv: &[String],
        color: &str,
    ) -> Result<String, BackendError> {
        if argv.is_empty() {
            return Err(BackendError::SpawnFailed("empty argv".to_string()));
        }
        self.ensure_session().await?;

        let first_pane = self.state.lock().panes.is_empty();
        let pane_id = if first_pane {
            let listing = self
                .run_tmux(&["list-panes", "-t", &self.session, "-F", "#{pane_id}"])
                .await?;
            listing
                .lines()
                .next()
                .map(|s| s.to_string())
                .ok_or_else(|| BackendError::SpawnFailed("session has no pane".to_string()))?
        } else {
            self.run_tmux(&[
                "split-window",
                "-t",
                &self.session,
                "-h",
                "-P",
                "-F",
                "#{pane_id}",
            ])
            .await?
        };

        self.state
            .lock()
            .panes
            .insert(agent_name.to_string(), pane_id.clone());

        self.run_tmux_quiet(&["select-pane", "-t", &pane_id, "-T", agent_name])
            .await;
        self.run_tmux_quiet(&[
            "select-pane",
            "-t",
            &pane_id,
            "-P",
            &format!("fg={}", tmux_color(color)),
        ])
        .await;
        self.run_tmux_quiet(&["set-option", "-p", "-t", &pane_id, "remain-on-exit", "on"])
            .await;

        // Trailer re-exits with the worker's status so pane_dead_status
        // reflects the child, not the wrapping shell.
        let cmd_str = argv
            .iter()
            .map(|a| shell_quote(a))
            .collect::<Vec<_>>()
            .join(" ");
        let wrapped = format!("{cmd_str}; __ag_status=$?; exit $__ag_status");
        self.run_tmux(&["send-keys", "-t", &pane_id, &wrapped, "Enter"])
            .await?;

        tracing::info!(agent_name, pane_id = %pane_id, "spawned worker pane");
        self.rebalance().await;
        Ok(pane_id)
    }

    async fn kill(&self, agent_name: &str) -> Result<(), BackendError> {
        let pane_id = self
            .state
            .lock()
            .panes
            .get(agent_name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(agent_name.to_string()))?;

        self.run_tmux_quiet(&["send-keys", "-t", &pane_id, "C-c", ""])
            .await;
        tokio::time::sleep(INTERRUPT_GRACE).await;
        self.run_tmux_quiet(&["kill-pane", "-t", &pane_id]).await;

        let remaining = {
            let mut state = self.state.lock();
            state.panes.remove(agent_name);
            !state.panes.is_empty()
        };
        if remaining {
            self.rebalance().await;
        }
        Ok(())
    }

    async fn is_alive(&self, agent_name: &str) -> bool {
        let names = vec![agent_name.to_string()];
        self.is_alive_many(&names)
            .await
            .get(agent_name)
            .copied()
            .unwrap_or(false)
    }

    async fn is_alive_many(&self, agent_names: &[String]) -> HashMap<String, bool> {
        let table = self.pane_table().await;
        let state = self.state.lock();
        agent_names
            .iter()
            .map(|name| {
                let alive = state
                    .panes
                    .get(name)
                    .and_then(|pane| table.get(pane))
                    .map(|(alive, _)| *alive)
                    .unwrap_or(false);
                (name.clone(), alive)
            })
            .collect()
    }

    async fn return_code(&self, agent_name: &str) -> Option<i32> {
        let pane_id = self.state.lock().panes.get(agent_name).cloned()?;
        let table = self.pane_table().await;
        match table.get(&pane_id) {
            Some((false, code)) => *code,
            _ => None,
        }
    }

    async fn cleanup(&self) {
        let created = {
            let mut state = self.state.lock();
            state.panes.clear();
            std::mem::take(&mut state.session_created)
        };
        if created {
            self.run_tmux_quiet(&["kill-session", "-t", &self.session])
                .await;
        }
    }

    fn kind(&self) -> &'static str {
        "tmux"
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
