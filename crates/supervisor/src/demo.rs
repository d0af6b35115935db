// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated backend for `--demo` runs.
//!
//! No worker processes are spawned: each agent gets a randomized
//! lifetime of a few seconds and an outcome sampled against
//! `AG_SWARM_DEMO_FAIL_RATE`.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use swarm_backend::{BackendError, SpawnBackend};
use swarm_core::env;

struct DemoAgent {
    ends_at: Instant,
    exit_code: i32,
    killed: bool,
}

/// Backend that pretends to run workers.
#[derive(Default)]
pub struct DemoBackend {
    agents: Mutex<HashMap<String, DemoAgent>>,
}

impl DemoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn alive(agent: &DemoAgent) -> bool {
        !agent.killed && Instant::now() < agent.ends_at
    }
}

#[async_trait]
impl SpawnBackend for DemoBackend {
    async fn spawn(
        &self,
        agent_name: &str,
        _argv: &[String],
        _color: &str,
    ) -> Result<String, BackendError> {
        let mut rng = rand::rng();
        let lifetime = Duration::from_millis(rng.random_range(1000..4000));
        let fails = rng.random_bool(env::demo_fail_rate());
        tracing::info!(
            agent_name,
            lifetime_ms = lifetime.as_millis() as u64,
            fails,
            "simulating worker"
        );

        self.agents.lock().insert(
            agent_name.to_string(),
            DemoAgent {
                ends_at: Instant::now() + lifetime,
                exit_code: if fails { 1 } else { 0 },
                killed: false,
            },
        );
        Ok(format!("demo-{agent_name}"))
    }

    async fn kill(&self, agent_name: &str) -> Result<(), BackendError> {
        match self.agents.lock().get_mut(agent_name) {
            Some(agent) => {
                if Self::alive(agent) {
                    agent.killed = true;
                    agent.exit_code = -2;
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
            .map(Self::alive)
            .unwrap_or(false)
    }

    async fn is_alive_many(&self, agent_names: &[String]) -> HashMap<String, bool> {
        let agents = self.agents.lock();
        agent_names
            .iter()
            .map(|n| (n.clone(), agents.get(n).map(Self::alive).unwrap_or(false)))
            .collect()
    }

    async fn return_code(&self, agent_name: &str) -> Option<i32> {
        let agents = self.agents.lock();
        let agent = agents.get(agent_name)?;
        (!Self::alive(agent)).then_some(agent.exit_code)
    }

    async fn cleanup(&self) {
        self.agents.lock().clear();
    }

    fn kind(&self) -> &'static str {
        "demo"
    }
}

#[cfg(test)]
#[path = "demo_tests.rs"]
mod tests;
