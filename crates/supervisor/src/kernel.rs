// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervisor kernel: phased scheduling, liveness, watchdog, retry,
//! leader-inbox drain, and finalisation.
//!
//! One driver loop with a ~100 ms tick. All cross-process coordination
//! goes through the filesystem (mailboxes, log files) and the backend's
//! liveness/exit queries; the only in-process concurrency is the stdin
//! listener and the signal watcher, both of which hand off through
//! channels or a flag.

use crate::keys::KeyCommand;
use crate::record::AgentRecord;
use crate::report;
use crate::spawn;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swarm_backend::SpawnBackend;
use swarm_core::{
    env, epoch_s, AgentStatus, MessageType, MissionStatus, RoleMode, StateLayout, StopMode,
    LEADER_NAME,
};
use swarm_store::{AuditKind, AuditLog, Mailbox, MissionState, MissionStore};
use thiserror::Error;
use tokio::sync::mpsc;

/// Driver tick.
const TICK: Duration = Duration::from_millis(100);

/// Liveness cache TTL for the process backend (and the demo backend).
const LIVENESS_TTL_FAST: Duration = Duration::from_millis(200);

/// Liveness cache TTL for the tmux backend, whose batched query costs a
/// subprocess invocation.
const LIVENESS_TTL_TMUX: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("mission persistence failed: {0}")]
    Mission(#[from] swarm_store::MissionError),
    #[error("team config write failed: {0}")]
    TeamConfig(#[from] swarm_core::ConfigError),
}

/// Why a phase stopped driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseEnd {
    /// Every agent in the group reached a terminal status.
    Finished,
    /// Interrupt, operator abort, or hard timeout: stop all phases.
    Aborted,
}

struct LivenessCache {
    checked_at: Option<tokio::time::Instant>,
    alive: HashMap<String, bool>,
}

/// The supervisor kernel for one mission attempt.
pub struct Supervisor {
    layout: StateLayout,
    backend: Box<dyn SpawnBackend>,
    store: MissionStore,
    audit: AuditLog,
    leader: Mailbox,
    mission: MissionState,
    records: Vec<AgentRecord>,
    context_block: Option<String>,
    keys: mpsc::UnboundedReceiver<KeyCommand>,
    interrupted: Arc<AtomicBool>,
    liveness: LivenessCache,
    mission_dirty: bool,
}

impl Supervisor {
    /// Wire up a kernel. `records` must already reflect resumed statuses;
    /// the team config is written here, before any spawn.
    pub fn new(
        layout: StateLayout,
        backend: Box<dyn SpawnBackend>,
        mut mission: MissionState,
        records: Vec<AgentRecord>,
        keys: mpsc::UnboundedReceiver<KeyCommand>,
        inject_context: bool,
        poll_interval_ms: u64,
    ) -> Result<Self, SupervisorError> {
        let store = MissionStore::new(layout.missions_dir());
        let audit = AuditLog::new(&mission.mission_id, layout.audit_dir());
        let leader = Mailbox::new(LEADER_NAME, layout.mailboxes_dir());

        spawn::write_team_config(
            &layout,
            &mission.mission_id,
            &mission.team_name,
            backend.kind(),
            poll_interval_ms,
            &records,
        )?;

        // First persist with the roster projection in place.
        mission.agents = records
            .iter()
            .map(|r| swarm_store::MissionAgent {
                name: r.name.clone(),
                mode: r.mode,
                color: r.color.clone(),
                status: r.status,
            })
            .collect();
        store.save(&mission)?;

        let context_block = if inject_context {
            spawn::build_context_block(layout.project_root())
        } else {
            None
        };

        Ok(Self {
            layout,
            backend,
            store,
            audit,
            leader,
            mission,
            records,
            context_block,
            keys,
            interrupted: Arc::new(AtomicBool::new(false)),
            liveness: LivenessCache {
                checked_at: None,
                alive: HashMap::new(),
            },
            mission_dirty: false,
        })
    }

    pub fn mission(&self) -> &MissionState {
        &self.mission
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
                _ = sigint.recv() => tracing::info!("received SIGINT"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            }
            flag.store(true, Ordering::Relaxed);
        });
    }

    /// Run the mission to a terminal status. Returns the process exit
    /// code: 0 iff every agent completed.
    pub async fn run(mut self) -> Result<i32, SupervisorError> {
        self.watch_signals();
        self.mission.advance_status(MissionStatus::Running);
        self.store.save(&self.mission)?;

        // The hard timeout is mission-level: one deadline across phases.
        let hard_deadline = env::hard_timeout().map(|d| tokio::time::Instant::now() + d);

        let groups: [Vec<usize>; 3] = [
            self.group(RoleMode::Parallel),
            self.group(RoleMode::Serial),
            self.group(RoleMode::Validator),
        ];
        tracing::info!(
            parallel = groups[0].len(),
            serial = groups[1].len(),
            validator = groups[2].len(),
            backend = self.backend.kind(),
            "phases planned"
        );

        'phases: {
            // Phase 1: all parallel workers up front.
            let parallel = &groups[0];
            if !parallel.is_empty() {
                for &idx in parallel {
                    self.spawn_agent(idx).await;
                }
                if self.drive(parallel, hard_deadline).await == PhaseEnd::Aborted {
                    break 'phases;
                }
            }

            // Phases 2 and 3: serial then validator, one at a time.
            for group in &groups[1..] {
                for &idx in group {
                    if self.records[idx].is_terminal() {
                        continue;
                    }
                    self.spawn_agent(idx).await;
                    if self.drive(&[idx], hard_deadline).await == PhaseEnd::Aborted {
                        break 'phases;
                    }
                }
            }
        }

        self.finalize().await
    }

    fn group(&self, mode: RoleMode) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.mode == mode)
            .map(|(i, _)| i)
            .collect()
    }

    /// Drive ticks until every agent in `group` is terminal.
    async fn drive(
        &mut self,
        group: &[usize],
        hard_deadline: Option<tokio::time::Instant>,
    ) -> PhaseEnd {
        loop {
            if group.iter().all(|&i| self.records[i].is_terminal()) {
                self.persist_if_dirty();
                return PhaseEnd::Finished;
            }
            if self.interrupted.load(Ordering::Relaxed) {
                self.persist_if_dirty();
                return PhaseEnd::Aborted;
            }

            self.drain_keys().await;
            self.poll_liveness().await;
            self.poll_progress();
            self.apply_watchdog().await;
            self.apply_retries().await;
            self.drain_leader_inbox();

            if let Some(deadline) = hard_deadline {
                if tokio::time::Instant::now() >= deadline {
                    self.fail_all_live("hard_timeout", StopMode::HardTimeout).await;
                    self.persist_if_dirty();
                    return PhaseEnd::Aborted;
                }
            }

            self.persist_if_dirty();
            tokio::time::sleep(TICK).await;
        }
    }

    async fn spawn_agent(&mut self, idx: usize) {
        if self.records[idx].status != AgentStatus::Pending {
            return;
        }
        let argv = spawn::build_worker_argv(
            &self.records[idx],
            &self.mission.team_name,
            &self.layout,
            self.context_block.as_deref(),
        );
        let name = self.records[idx].name.clone();
        let color = self.records[idx].color.clone();
        let attempt = self.records[idx].retry_count + 1;

        match self.backend.spawn(&name, &argv, &color).await {
            Ok(handle) => {
                self.records[idx].mark_spawned(handle);
                self.audit.record(
                    &name,
                    AuditKind::Spawned,
                    &format!("spawned via {} (attempt {attempt})", self.backend.kind()),
                    None,
                );
            }
            Err(e) => {
                self.records[idx].mark_failed(format!("spawn failed: {e}"), true);
                self.audit
                    .record(&name, AuditKind::Error, &format!("spawn failed: {e}"), None);
            }
        }
        self.mission_dirty = true;
    }

    /// Batched backend liveness with a small TTL cache; classify every
    /// live agent whose process has gone away.
    async fn poll_liveness(&mut self) {
        let live: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.is_live())
            .map(|r| r.name.clone())
            .collect();
        if live.is_empty() {
            return;
        }

        let ttl = if self.backend.kind() == "tmux" {
            LIVENESS_TTL_TMUX
        } else {
            LIVENESS_TTL_FAST
        };
        let fresh = self
            .liveness
            .checked_at
            .is_some_and(|at| at.elapsed() < ttl);
        if !fresh {
            self.liveness.alive = self.backend.is_alive_many(&live).await;
            self.liveness.checked_at = Some(tokio::time::Instant::now());
        }

        for idx in 0..self.records.len() {
            if !self.records[idx].is_live() {
                continue;
            }
            let name = self.records[idx].name.clone();
            if self.liveness.alive.get(&name).copied().unwrap_or(false) {
                continue;
            }
            let return_code = self.backend.return_code(&name).await;
            self.classify_death(idx, return_code);
        }
    }

    /// Exit-code classification for a dead agent.
    fn classify_death(&mut self, idx: usize, return_code: Option<i32>) {
        let record = &mut self.records[idx];
        let name = record.name.clone();
        match return_code {
            Some(0) => {
                record.mark_completed();
                self.audit
                    .record(&name, AuditKind::StatusChange, "completed", None);
            }
            Some(code) => {
                record.mark_failed(format!("process exited with returncode {code}"), true);
                self.audit.record(
                    &name,
                    AuditKind::Error,
                    &format!("process exited with returncode {code}"),
                    None,
                );
            }
            None if record.saw_completion_signal => {
                record.mark_completed();
                self.audit.record(
                    &name,
                    AuditKind::StatusChange,
                    "completed (completion signal, exit code unknown)",
                    None,
                );
            }
            None => {
                record.mark_failed("backend_dead_unknown_rc", true);
                self.audit.record(
                    &name,
                    AuditKind::Error,
                    "backend_dead_unknown_rc",
                    Some(HashMap::from([(
                        "failure_class".to_string(),
                        serde_json::json!("process_error"),
                    )])),
                );
            }
        }
        self.mission_dirty = true;
    }

    /// Tail logs; any change to the last non-empty line is progress.
    fn poll_progress(&mut self) {
        for record in &mut self.records {
            if !record.is_live() {
                continue;
            }
            let path = record.log_file.clone();
            if record.tail.advance(&path) {
                record.last_progress_ts = epoch_s();
                record.last_log = record.tail.last_line().to_string();
            }
        }
    }

    /// Progress watchdog for parallel-phase agents.
    async fn apply_watchdog(&mut self) {
        let timeout = env::watchdog_timeout().as_secs_f64();
        let grace = env::watchdog_grace().as_secs_f64();
        let now = epoch_s();

        for idx in 0..self.records.len() {
            if self.records[idx].mode != RoleMode::Parallel || !self.records[idx].is_live() {
                continue;
            }
            let name = self.records[idx].name.clone();
            let stop_mode = self.records[idx].stop_mode;
            let last_progress = self.records[idx].last_progress_ts;

            match stop_mode {
                StopMode::None if now - last_progress > timeout => {
                    tracing::warn!(
                        agent = %name,
                        idle_s = (now - last_progress) as u64,
                        "watchdog requesting soft shutdown"
                    );
                    self.request_shutdown(idx, StopMode::WatchdogSoftShutdown, "watchdog");
                }
                StopMode::WatchdogSoftShutdown => {
                    let requested = self.records[idx].stop_requested_ts.unwrap_or(now);
                    if last_progress > requested {
                        // Progress resumed after the request; stand down.
                        self.records[idx].stop_mode = StopMode::None;
                        self.records[idx].stop_requested_ts = None;
                    } else if now - requested > grace {
                        let _ = self.backend.kill(&name).await;
                        self.records[idx].mark_failed("watchdog_timeout", true);
                        self.audit.record(
                            &name,
                            AuditKind::Error,
                            "watchdog_no_progress_timeout",
                            None,
                        );
                        self.mission_dirty = true;
                    }
                }
                _ => {}
            }
        }
    }

    /// Respawn failed agents while their retry budget and stop mode
    /// allow it.
    async fn apply_retries(&mut self) {
        let max_retries = env::max_retries();
        let cooldown = env::retry_cooldown();

        for idx in 0..self.records.len() {
            if !self.records[idx].retry_allowed(max_retries) {
                continue;
            }
            let name = self.records[idx].name.clone();
            tracing::info!(
                agent = %name,
                attempt = self.records[idx].retry_count + 2,
                "retrying failed agent"
            );
            if self.records[idx].backend_handle.is_some() {
                let _ = self.backend.kill(&name).await;
            }
            tokio::time::sleep(cooldown).await;
            self.records[idx].reset_for_retry();
            self.spawn_agent(idx).await;
        }
    }

    /// Drain the leader inbox: counters, last activity, completion
    /// sentinel, shutdown acknowledgements.
    fn drain_leader_inbox(&mut self) {
        for msg in self.leader.poll() {
            self.audit.record(
                LEADER_NAME,
                AuditKind::MessageReceived,
                &format!("{} from {}", msg.msg_type, msg.sender),
                None,
            );

            let Some(record) = self
                .records
                .iter_mut()
                .find(|r| r.name.to_lowercase() == msg.sender.to_lowercase())
            else {
                tracing::debug!(sender = %msg.sender, "message from unknown agent");
                continue;
            };

            record.msg_counts.recv += 1;
            let content = msg.content.trim();
            if !content.is_empty() {
                record.last_log = content.to_string();
            }

            match msg.msg_type {
                MessageType::StatusUpdate if msg.is_completion_signal() => {
                    record.saw_completion_signal = true;
                }
                MessageType::ShutdownResponse => {
                    if !record.is_terminal() {
                        let name = record.name.clone();
                        record.mark_shutdown();
                        self.audit.record(
                            &name,
                            AuditKind::Shutdown,
                            "shutdown acknowledged",
                            None,
                        );
                        self.mission_dirty = true;
                    } else {
                        record.retryable = false;
                    }
                }
                _ => {}
            }
        }
    }

    async fn drain_keys(&mut self) {
        while let Ok(cmd) = self.keys.try_recv() {
            tracing::info!(?cmd, "operator command");
            match cmd {
                KeyCommand::ShutdownAll => {
                    for idx in 0..self.records.len() {
                        if self.records[idx].is_live() {
                            self.request_shutdown(idx, StopMode::GracefulShutdown, "operator");
                        }
                    }
                }
                KeyCommand::KillAll => {
                    for idx in 0..self.records.len() {
                        if self.records[idx].is_live() {
                            self.kill_agent(idx).await;
                        }
                    }
                }
                KeyCommand::Shutdown(name) => {
                    if let Some(idx) = self.find_record(&name) {
                        self.request_shutdown(idx, StopMode::GracefulShutdown, "operator");
                    }
                }
                KeyCommand::Kill(name) => {
                    if let Some(idx) = self.find_record(&name) {
                        self.kill_agent(idx).await;
                    }
                }
            }
        }
    }

    fn find_record(&self, name: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.name.to_lowercase() == name.to_lowercase())
    }

    /// First phase of cooperative cancellation: a shutdown_request into
    /// the agent's inbox, journalled, with the stop mode recorded so the
    /// retry policy can tell intent from failure.
    fn request_shutdown(&mut self, idx: usize, stop_mode: StopMode, origin: &str) {
        let name = self.records[idx].name.clone();
        match self.leader.send(
            &name,
            MessageType::ShutdownRequest,
            format!("shutdown requested by {origin}"),
            None,
        ) {
            Ok(_) => {
                self.records[idx].msg_counts.sent += 1;
                self.audit.record(
                    &name,
                    AuditKind::MessageSent,
                    &format!("shutdown_request ({origin})"),
                    None,
                );
            }
            Err(e) => {
                self.audit.record(
                    &name,
                    AuditKind::Error,
                    &format!("mailbox shutdown_request failed: {e}"),
                    None,
                );
            }
        }
        self.records[idx].stop_mode = stop_mode;
        self.records[idx].stop_requested_ts = Some(epoch_s());
    }

    /// Second phase: forced kill via the backend.
    async fn kill_agent(&mut self, idx: usize) {
        let name = self.records[idx].name.clone();
        self.records[idx].stop_mode = StopMode::ForceKill;
        self.records[idx].stop_requested_ts = Some(epoch_s());
        self.audit
            .record(&name, AuditKind::Shutdown, "force kill (operator)", None);
        if let Err(e) = self.backend.kill(&name).await {
            tracing::warn!(agent = %name, error = %e, "force kill failed");
        }
    }

    async fn fail_all_live(&mut self, reason: &str, stop_mode: StopMode) {
        for idx in 0..self.records.len() {
            if self.records[idx].is_terminal() {
                continue;
            }
            let name = self.records[idx].name.clone();
            if self.records[idx].is_live() {
                let _ = self.backend.kill(&name).await;
            }
            self.records[idx].stop_mode = stop_mode;
            self.records[idx].mark_failed(reason, false);
            self.audit.record(&name, AuditKind::Error, reason, None);
        }
        self.mission_dirty = true;
    }

    /// Sync agent statuses into the mission record and save. Mid-mission
    /// persistence is best-effort; a failed save retries next tick.
    fn persist_if_dirty(&mut self) {
        if !self.mission_dirty {
            return;
        }
        for record in &self.records {
            self.mission
                .update_agent_status(&record.name, record.status);
        }
        match self.store.save(&self.mission) {
            Ok(()) => self.mission_dirty = false,
            Err(e) => tracing::warn!(error = %e, "mission persist failed"),
        }
    }

    /// Final shutdown sweep, backend teardown, mission terminal status,
    /// report.
    async fn finalize(mut self) -> Result<i32, SupervisorError> {
        for idx in 0..self.records.len() {
            if self.records[idx].is_live() && self.records[idx].stop_mode == StopMode::None {
                self.request_shutdown(idx, StopMode::GracefulShutdown, "finalisation");
            }
        }
        self.backend.cleanup().await;

        let all_completed = self
            .records
            .iter()
            .all(|r| r.status == AgentStatus::Completed);
        if all_completed {
            self.mission.advance_status(MissionStatus::Completed);
        } else {
            let reason = self
                .records
                .iter()
                .find_map(|r| r.failure_reason.clone())
                .unwrap_or_else(|| "agent_failures".to_string());
            self.mission.fail(reason);
        }

        // Terminal persistence is the one save that must not fail silently.
        for record in &self.records {
            self.mission
                .update_agent_status(&record.name, record.status);
        }
        self.store.save(&self.mission)?;
        self.mission_dirty = false;
        self.audit.record(
            LEADER_NAME,
            AuditKind::StatusChange,
            &format!("mission {}", self.mission.status),
            None,
        );

        report::print_report(&self.mission, &self.audit);
        Ok(if self.mission.status == MissionStatus::Completed {
            0
        } else {
            1
        })
    }
}

#[cfg(test)]
#[path = "kernel_tests.rs"]
mod tests;
