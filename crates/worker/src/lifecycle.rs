// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle: the per-agent state machine that runs inside each
//! spawned child.
//!
//! ```text
//! spawned → RUNNING → (exit-on-idle? → COMPLETED) → IDLE
//! IDLE ─message──► RUNNING ──► IDLE
//! IDLE ─shutdown_request──► SHUTDOWN (respond, exit 0)
//! IDLE ─idle timeout──► COMPLETED (notify leader, exit 0)
//! SIGINT/SIGTERM ──► FAILED (notify leader, exit 1)
//! ```

use crate::effects::EffectExecutor;
use crate::llm::{find_llm_binary, run_llm, LlmOutcome};
use crate::stream::TagStream;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swarm_core::{env, AgentName, MessageType, TeamConfig, COMPLETION_SIGNAL};
use swarm_roster::ensure_required_sections;
use swarm_store::{AuditKind, AuditLog, Mailbox};
use thiserror::Error;
use tokio::sync::mpsc;

/// Instruction block prepended to every task so the LLM knows how to
/// request side effects through the shim.
pub const SHIM_PREAMBLE: &str = r#"You are a sub-agent working under a swarm supervisor. Your environment lacks native tools, but a shim layer executes effects you emit as tagged output. To perform actions, you MUST use the following syntax PRECISELY:

1. TO WRITE A FILE:
<<WRITE_FILE path="path/to/file.ext">>
File content goes here...
<<END_WRITE>>

2. TO RUN A SHELL COMMAND:
<<RUN_COMMAND>>
ls -la
<<END_COMMAND>>

3. TO MESSAGE ONE TEAMMATE:
<<SEND_MESSAGE to="Agent_Name">>
Message body...
<<END_MESSAGE>>

4. TO MESSAGE THE WHOLE TEAM:
<<BROADCAST>>
Message body...
<<END_BROADCAST>>

Now, perform the following task:
"#;

/// Cadence of the processed-message pruning while idle.
const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

/// Age bound for pruned processed messages.
const PRUNE_MAX_AGE_S: f64 = 24.0 * 3600.0;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("team config unreadable: {0}")]
    TeamConfig(#[from] swarm_core::ConfigError),
    #[error("log file unusable: {0}")]
    LogFile(std::io::Error),
}

/// Static wiring for one worker process.
pub struct WorkerConfig {
    pub identity: AgentName,
    pub team_dir: PathBuf,
    pub log_file: PathBuf,
    pub model: String,
    pub exit_on_idle: bool,
}

/// The in-child agent runtime.
pub struct Worker {
    /// Roster display name (mailbox directory, message sender, audit
    /// agent field).
    name: String,
    team: TeamConfig,
    mailbox: Mailbox,
    audit: AuditLog,
    executor: EffectExecutor,
    log_file: PathBuf,
    model: String,
    exit_on_idle: bool,
    poll_interval: Duration,
    interrupted: Arc<AtomicBool>,
}

impl Worker {
    pub fn new(config: WorkerConfig) -> Result<Self, WorkerError> {
        let team = TeamConfig::load(&config.team_dir.join("config.json"))?;

        // The CLI identity is the lowercased canonical id; mailbox
        // directories and message senders use the roster display name,
        // so resolve it from the team config (case-insensitive).
        let name = team
            .members
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(config.identity.name()))
            .map(|m| m.name.clone())
            .unwrap_or_else(|| config.identity.name().to_string());

        let mailbox = Mailbox::new(name.clone(), config.team_dir.join("mailboxes"));
        let audit = AuditLog::new(&team.mission_id, config.team_dir.join("audit"));

        // Effects resolve relative paths against the project root, one
        // level above the state directory. A relative team dir like
        // `.swarm` has an empty parent, which means the cwd.
        let work_dir = match config.team_dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if let Some(parent) = config.log_file.parent() {
            std::fs::create_dir_all(parent).map_err(WorkerError::LogFile)?;
        }

        let executor = EffectExecutor::new(
            name.clone(),
            mailbox.clone(),
            audit.clone(),
            team.clone(),
            work_dir,
        );

        let poll_interval = Duration::from_millis(team.poll_interval_ms.max(50));
        Ok(Self {
            name,
            team,
            mailbox,
            audit,
            executor,
            log_file: config.log_file,
            model: config.model,
            exit_on_idle: config.exit_on_idle,
            poll_interval,
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// Echo a line to stdout and append it to the log file. The log tee
    /// is what the supervisor's progress watchdog observes.
    fn log_line(&self, line: &str) {
        println!("{}", line);
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .and_then(|mut f| writeln!(f, "{}", line));
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to append worker log");
        }
    }

    fn notify_leader(&self, content: &str) {
        if let Err(e) = self.mailbox.send(
            &self.team.leader,
            MessageType::StatusUpdate,
            content,
            None,
        ) {
            self.audit.record(
                self.name(),
                AuditKind::Error,
                &format!("mailbox notify to leader failed: {e}"),
                None,
            );
        }
    }

    fn watch_signals(&self) {
        let flag = Arc::clone(&self.interrupted);
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            let (Ok(mut sigint), Ok(mut sigterm)) = (
                signal(SignalKind::interrupt()),
                signal(SignalKind::terminate()),
            ) else {
                tracing::warn!("failed to install signal handlers");
                return;
            };
            tokio::select! {
                _ = sigint.recv() => {}
                _ = sigterm.recv() => {}
            }
            flag.store(true, Ordering::Relaxed);
        });
    }

    /// Run the worker to completion. Returns the process exit code.
    pub async fn run(mut self, initial_task: &str) -> i32 {
        self.watch_signals();
        self.mailbox.write_heartbeat();
        self.audit
            .record(self.name(), AuditKind::StatusChange, "running", None);

        self.run_task(initial_task).await;
        if self.interrupted.load(Ordering::Relaxed) {
            return self.exit_interrupted();
        }

        if self.exit_on_idle {
            return self.exit_completed("initial_task");
        }

        self.idle_loop().await
    }

    async fn idle_loop(&mut self) -> i32 {
        let idle_timeout = env::agent_idle_timeout();
        let mut last_activity = tokio::time::Instant::now();
        let mut last_prune = tokio::time::Instant::now();

        self.audit
            .record(self.name(), AuditKind::StatusChange, "idle", None);

        loop {
            if self.interrupted.load(Ordering::Relaxed) {
                return self.exit_interrupted();
            }
            tokio::time::sleep(self.poll_interval).await;
            self.mailbox.write_heartbeat();

            for msg in self.mailbox.poll() {
                self.audit.record(
                    self.name(),
                    AuditKind::MessageReceived,
                    &format!("{} from {}", msg.msg_type, msg.sender),
                    None,
                );

                match msg.msg_type {
                    MessageType::Direct | MessageType::Broadcast => {
                        self.audit
                            .record(self.name(), AuditKind::StatusChange, "running", None);
                        self.run_task(&msg.content).await;
                        if self.interrupted.load(Ordering::Relaxed) {
                            return self.exit_interrupted();
                        }
                        self.audit
                            .record(self.name(), AuditKind::StatusChange, "idle", None);
                        last_activity = tokio::time::Instant::now();
                    }
                    MessageType::ShutdownRequest => {
                        return self.exit_shutdown(&msg.sender);
                    }
                    _ => {}
                }
            }

            if last_activity.elapsed() >= idle_timeout {
                return self.exit_completed("idle_timeout");
            }
            if last_prune.elapsed() >= PRUNE_INTERVAL {
                self.mailbox.cleanup_processed(PRUNE_MAX_AGE_S);
                last_prune = tokio::time::Instant::now();
            }
        }
    }

    /// One task cycle: repair sections, prepend the shim, stream the LLM,
    /// execute effects as they complete.
    async fn run_task(&mut self, task: &str) {
        let body = ensure_required_sections(task);
        let prompt = format!("{SHIM_PREAMBLE}{body}");

        let Some(binary) = find_llm_binary() else {
            self.audit.record(
                self.name(),
                AuditKind::Error,
                "llm binary not found (set GEMINI_PATH or install the gemini CLI)",
                Some(HashMap::from([(
                    "failure_class".to_string(),
                    serde_json::json!("config_error"),
                )])),
            );
            self.log_line("[worker] llm binary not found, task skipped");
            return;
        };

        self.log_line(&format!(
            "[worker] dispatching task to {} ({} chars)",
            self.model,
            prompt.len()
        ));

        let (line_tx, mut line_rx) = mpsc::channel::<String>(64);
        let deadline = env::task_timeout();
        let model = self.model.clone();
        let interrupted = Arc::clone(&self.interrupted);
        let runner = tokio::spawn(async move {
            run_llm(&binary, &model, &prompt, deadline, &interrupted, line_tx).await
        });

        let mut parser = TagStream::new();
        while let Some(line) = line_rx.recv().await {
            self.log_line(&line);
            for item in parser.push(&format!("{line}\n")) {
                if let Some(echo) = self.executor.apply(item).await {
                    self.log_line(&format!("[shim] {echo}"));
                }
            }
        }
        for item in parser.finish() {
            if let Some(echo) = self.executor.apply(item).await {
                self.log_line(&format!("[shim] {echo}"));
            }
        }

        match runner.await {
            Ok(Ok((LlmOutcome::Exited(0), _))) => {
                self.log_line("[worker] task completed");
            }
            Ok(Ok((LlmOutcome::Exited(code), stderr))) => {
                self.audit.record(
                    self.name(),
                    AuditKind::Error,
                    &format!("llm process exited with returncode {code}: {}", stderr.trim()),
                    None,
                );
                self.log_line(&format!("[worker] llm exited with code {code}"));
            }
            Ok(Ok((LlmOutcome::TimedOut, _))) => {
                self.audit.record(
                    self.name(),
                    AuditKind::Error,
                    &format!("task timeout after {}s", deadline.as_secs()),
                    None,
                );
                self.log_line("[worker] task timed out");
            }
            Ok(Ok((LlmOutcome::Interrupted, _))) => {
                self.log_line("[worker] task interrupted");
            }
            Ok(Err(e)) => {
                self.audit.record(
                    self.name(),
                    AuditKind::Error,
                    &format!("llm spawn failed: {e}"),
                    None,
                );
                self.log_line("[worker] llm spawn failed");
            }
            Err(e) => {
                self.audit.record(
                    self.name(),
                    AuditKind::Error,
                    &format!("llm task join failed: {e}"),
                    None,
                );
            }
        }
    }

    fn exit_completed(&self, reason: &str) -> i32 {
        self.notify_leader(&format!("{COMPLETION_SIGNAL}: {reason}"));
        self.audit
            .record(self.name(), AuditKind::StatusChange, "completed", None);
        self.log_line(&format!("[worker] completed ({reason})"));
        0
    }

    fn exit_shutdown(&self, requester: &str) -> i32 {
        if let Err(e) =
            self.mailbox
                .send(requester, MessageType::ShutdownResponse, "shutting_down", None)
        {
            self.audit.record(
                self.name(),
                AuditKind::Error,
                &format!("mailbox shutdown response failed: {e}"),
                None,
            );
        }
        self.audit
            .record(self.name(), AuditKind::Shutdown, "graceful shutdown", None);
        self.log_line("[worker] shutting down on request");
        0
    }

    fn exit_interrupted(&self) -> i32 {
        self.audit.record(
            self.name(),
            AuditKind::Error,
            "dispatcher_interrupted",
            None,
        );
        self.notify_leader("dispatcher_interrupted");
        self.log_line("[worker] interrupted by signal");
        1
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
