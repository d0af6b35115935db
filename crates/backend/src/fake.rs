// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted in-memory backend for supervisor tests.

use crate::{BackendError, SpawnBackend};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Spawn(String),
    Kill(String),
    Cleanup,
}

#[derive(Debug, Clone, Default)]
struct FakeAgent {
    alive: bool,
    return_code: Option<i32>,
}

/// In-memory backend whose liveness and exit codes are driven by the test.
#[derive(Default)]
pub struct FakeBackend {
    agents: Mutex<HashMap<String, FakeAgent>>,
    calls: Mutex<Vec<FakeCall>>,
    fail_spawns_for: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make future spawns of `agent_name` fail.
    pub fn fail_spawn(&self, agent_name: &str) {
        self.fail_spawns_for.lock().push(agent_name.to_string());
    }

    /// Script an agent's death with the given exit code.
    pub fn finish(&self, agent_name: &str, return_code: i32) {
        if let Some(agent) = self.agents.lock().get_mut(agent_name) {
            agent.alive = false;
            agent.return_code = Some(return_code);
        }
    }

    /// Script an agent's death with no observable exit code.
    pub fn vanish(&self, agent_name: &str) {
        if let Some(agent) = self.agents.lock().get_mut(agent_name) {
            agent.alive = false;
            agent.return_code = None;
        }
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().clone()
    }

    pub fn spawn_count(&self, agent_name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, FakeCall::Spawn(n) if n == agent_name))
            .count()
    }
}

#[async_trait]
impl SpawnBackend for FakeBackend {
    async fn spawn(
        &self,
        agent_name: &str,
        _argv: &[String],
        _color: &str,
    ) -> Result<String, BackendError> {
        self.calls
            .lock()
            .push(FakeCall::Spawn(agent_name.to_string()));
        if self
            .fail_spawns_for
            .lock()
            .iter()
            .any(|n| n == agent_name)
        {
            return Err(BackendError::SpawnFailed(format!(
                "scripted failure for {agent_name}"
            )));
        }
        self.agents.lock().insert(
            agent_name.to_string(),
            FakeAgent {
                alive: true,
                return_code: None,
            },
        );
        Ok(format!("fake-{agent_name}"))
    }

    async fn kill(&self, agent_name: &str) -> Result<(), BackendError> {
        self.calls
            .lock()
            .push(FakeCall::Kill(agent_name.to_string()));
        match self.agents.lock().get_mut(agent_name) {
            Some(agent) => {
                if agent.alive {
                    agent.alive = false;
                    agent.return_code = Some(-2);
                }
                Ok(())
            }
            None => Err(BackendError::NotFound(agent_name.to_string())),
        }
    }

    async fn is_alive(&self, agent_name: &str) -> bool {
        self.agents
            .lock()
            .get(agent_name)
            .map(|a| a.alive)
            .unwrap_or(false)
    }

    async fn is_alive_many(&self, agent_names: &[String]) -> HashMap<String, bool> {
        let agents = self.agents.lock();
        agent_names
            .iter()
            .map(|n| (n.clone(), agents.get(n).map(|a| a.alive).unwrap_or(false)))
            .collect()
    }

    async fn return_code(&self, agent_name: &str) -> Option<i32> {
        self.agents.lock().get(agent_name)?.return_code
    }

    async fn cleanup(&self) {
        self.calls.lock().push(FakeCall::Cleanup);
        self.agents.lock().clear();
    }

    fn kind(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
