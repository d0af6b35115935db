// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-group backend: each worker is a directly spawned, detached
//! child. The reference backend - correctness tests run against this one.

use crate::{BackendError, SpawnBackend};
use async_trait::async_trait;
use nix::sys::signal::{kill as send_signal, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

/// Grace between the interrupt and the forced kill.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Poll cadence while waiting out the kill grace.
const KILL_POLL: Duration = Duration::from_millis(100);

struct ChildEntry {
    child: Child,
    pid: Option<u32>,
    return_code: Option<i32>,
}

impl ChildEntry {
    /// Non-blocking reap; caches the exit code on first observation.
    fn refresh(&mut self) -> Option<i32> {
        if self.return_code.is_some() {
            return self.return_code;
        }
        if let Ok(Some(status)) = self.child.try_wait() {
            self.return_code = Some(exit_code_of(status));
        }
        self.return_code
    }
}

/// Map an exit status to the conventional integer: the code when the
/// child exited, `-signum` when it died to a signal.
fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|s| -s))
        .unwrap_or(-1)
}

/// Spawn backend over plain detached child processes.
///
/// Stdout/stderr are discarded - the worker tees its own stream to its
/// log file. Stdin is never inherited.
#[derive(Default)]
pub struct ProcessBackend {
    children: Mutex<HashMap<String, ChildEntry>>,
}

impl ProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn signal(&self, agent_name: &str, signal: Signal) {
        let pid = {
            let mut children = self.children.lock();
            match children.get_mut(agent_name) {
                Some(e) => {
                    if e.refresh().is_none() {
                        e.pid
                    } else {
                        None
                    }
                }
                None => None,
            }
        };
        if let Some(pid) = pid {
            if let Err(e) = send_signal(Pid::from_raw(pid as i32), signal) {
                tracing::debug!(agent_name, ?signal, error = %e, "signal delivery failed");
            }
        }
    }
}

#[async_trait]
impl SpawnBackend for ProcessBackend {
    async fn spawn(
        &self,
        agent_name: &str,
        argv: &[String],
        _color: &str,
    ) -> Result<String, BackendError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| BackendError::SpawnFailed("empty argv".to_string()))?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| BackendError::SpawnFailed(format!("{program}: {e}")))?;

        let pid = child.id();
        tracing::info!(agent_name, ?pid, "spawned worker process");

        self.children.lock().insert(
            agent_name.to_string(),
            ChildEntry {
                child,
                pid,
                return_code: None,
            },
        );
        Ok(pid.map(|p| p.to_string()).unwrap_or_default())
    }

    async fn kill(&self, agent_name: &str) -> Result<(), BackendError> {
        if !self.children.lock().contains_key(agent_name) {
            return Err(BackendError::NotFound(agent_name.to_string()));
        }

        // Phase one: interrupt, then wait out the grace.
        self.signal(agent_name, Signal::SIGINT);
        let deadline = tokio::time::Instant::now() + KILL_GRACE;
        loop {
            {
                let mut children = self.children.lock();
                let Some(entry) = children.get_mut(agent_name) else {
                    return Ok(());
                };
                if entry.refresh().is_some() {
                    return Ok(());
                }
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(KILL_POLL).await;
        }

        // Phase two: force kill and reap.
        tracing::warn!(agent_name, "worker ignored interrupt, force killing");
        let mut children = self.children.lock();
        if let Some(entry) = children.get_mut(agent_name) {
            let _ = entry.child.start_kill();
            if let Ok(Some(status)) = entry.child.try_wait() {
                entry.return_code = Some(exit_code_of(status));
            }
        }
        Ok(())
    }

    async fn is_alive(&self, agent_name: &str) -> bool {
        let mut children = self.children.lock();
        children
            .get_mut(agent_name)
            .map(|e| e.refresh().is_none())
            .unwrap_or(false)
    }

    async fn is_alive_many(&self, agent_names: &[String]) -> HashMap<String, bool> {
        let mut children = self.children.lock();
        agent_names
            .iter()
            .map(|name| {
                let alive = children
                    .get_mut(name)
                    .map(|e| e.refresh().is_none())
                    .unwrap_or(false);
                (name.clone(), alive)
            })
            .collect()
    }

    async fn return_code(&self, agent_name: &str) -> Option<i32> {
        self.children.lock().get_mut(agent_name)?.refresh()
    }

    async fn cleanup(&self) {
        let names: Vec<String> = self.children.lock().keys().cloned().collect();
        for name in &names {
            self.signal(name, Signal::SIGTERM);
        }
        // One short grace for the whole group, then force.
        tokio::time::sleep(KILL_POLL).await;
        let mut children = self.children.lock();
        for (name, entry) in children.iter_mut() {
            if entry.refresh().is_none() {
                tracing::debug!(agent_name = %name, "force killing at cleanup");
                let _ = entry.child.start_kill();
            }
        }
        children.clear();
    }

    fn kind(&self) -> &'static str {
        "thread"
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
