// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! swarm-backend: swappable process-launching backends for the supervisor.
//!
//! A backend owns the mapping from agent name to a running child and
//! answers liveness and exit-status queries. Two production variants:
//! detached child processes (the reference implementation) and panes in a
//! shared tmux session (the observable one).

mod process;
mod subprocess;
mod tmux;

pub use process::ProcessBackend;
pub use subprocess::{run_with_timeout, TMUX_TIMEOUT};
pub use tmux::TmuxBackend;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBackend;

use async_trait::async_trait;
use std::collections::HashMap;
use swarm_core::BackendKind;
use thiserror::Error;

/// Errors from backend operations
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("agent not found: {0}")]
    NotFound(String),
    #[error("backend command failed: {0}")]
    CommandFailed(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Abstract backend for spawning and supervising agent child processes.
///
/// Implementations keep their own name→handle map behind interior
/// mutability so the supervisor can hold a `Box<dyn SpawnBackend>`.
#[async_trait]
pub trait SpawnBackend: Send + Sync {
    /// Launch a detached child for `agent_name`. The child must not
    /// inherit the supervisor's stdin. Returns an opaque handle id.
    async fn spawn(
        &self,
        agent_name: &str,
        argv: &[String],
        color: &str,
    ) -> Result<String, BackendError>;

    /// Best-effort graceful interrupt, then forced kill after a short
    /// grace period.
    async fn kill(&self, agent_name: &str) -> Result<(), BackendError>;

    async fn is_alive(&self, agent_name: &str) -> bool;

    /// Batched liveness. The supervisor polls every tick; implementations
    /// must answer all names with a bounded amount of work, not one probe
    /// per child.
    async fn is_alive_many(&self, agent_names: &[String]) -> HashMap<String, bool>;

    /// The child's exit code once it has died, else `None`.
    async fn return_code(&self, agent_name: &str) -> Option<i32>;

    /// Terminate and forget everything.
    async fn cleanup(&self);

    /// Variant name for audit and report output.
    fn kind(&self) -> &'static str;
}

/// Shared handles delegate, so a backend can be observed from outside
/// the supervisor that drives it.
#[async_trait]
impl<T: SpawnBackend + ?Sized> SpawnBackend for std::sync::Arc<T> {
    async fn spawn(
        &self,
        agent_name: &str,
        argv: &[String],
        color: &str,
    ) -> Result<String, BackendError> {
        (**self).spawn(agent_name, argv, color).await
    }

    async fn kill(&self, agent_name: &str) -> Result<(), BackendError> {
        (**self).kill(agent_name).await
    }

    async fn is_alive(&self, agent_name: &str) -> bool {
        (**self).is_alive(agent_name).await
    }

    async fn is_alive_many(&self, agent_names: &[String]) -> HashMap<String, bool> {
        (**self).is_alive_many(agent_names).await
    }

    async fn return_code(&self, agent_name: &str) -> Option<i32> {
        (**self).return_code(agent_name).await
    }

    async fn cleanup(&self) {
        (**self).cleanup().await
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

/// Pick a backend. Explicit configuration wins; `auto` prefers tmux when
/// it is usable and falls back to plain processes.
pub fn select_backend(kind: BackendKind) -> Result<Box<dyn SpawnBackend>, BackendError> {
    match kind {
        BackendKind::Process => Ok(Box::new(ProcessBackend::new())),
        BackendKind::Tmux => {
            let backend = TmuxBackend::new()?;
            Ok(Box::new(backend))
        }
        BackendKind::Auto => {
            if TmuxBackend::is_available() {
                match TmuxBackend::new() {
                    Ok(backend) => return Ok(Box::new(backend)),
                    Err(e) => {
                        tracing::warn!(error = %e, "tmux unusable, falling back to process backend");
                    }
                }
            }
            Ok(Box::new(ProcessBackend::new()))
        }
    }
}
