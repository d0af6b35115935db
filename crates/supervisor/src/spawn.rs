// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker spawn preparation: argv assembly, shared-state context
//! injection, and the team config workers read at startup.

use crate::record::AgentRecord;
use std::path::{Path, PathBuf};
use swarm_core::{ConfigError, RoleMode, StateLayout, TeamConfig, TeamMember};

/// Shared-state files concatenated into every worker prompt.
const SHARED_STATE_FILES: &[&str] = &["task_plan.md", "findings.md", "progress.md"];

/// Env override for the worker binary path, for tests and packaging.
const WORKER_BINARY_ENV: &str = "AG_SWARM_WORKER_BINARY";

/// Default worker binary name, expected next to the supervisor binary.
const WORKER_BINARY_NAME: &str = "agswarm-worker";

/// Build the `[SHARED STATE]` context block from whichever shared files
/// exist under the project root. Returns `None` when none do.
pub fn build_context_block(project_root: &Path) -> Option<String> {
    let mut block = String::from("\n\n[SHARED STATE]");
    let mut found = false;
    for name in SHARED_STATE_FILES {
        let Ok(content) = std::fs::read_to_string(project_root.join(name)) else {
            continue;
        };
        found = true;
        block.push_str(&format!("\n--- {name} ---\n{content}"));
    }
    if !found {
        return None;
    }
    block.push_str("\n[END SHARED STATE]\n");
    block.push_str(
        "Instructions: You must read the shared state above. Update 'findings.md' with new \
         discoveries and 'progress.md' with your status using <<WRITE_FILE>>.",
    );
    Some(block)
}

/// Locate the worker binary: env override, then a sibling of the current
/// executable, then PATH.
pub fn worker_binary() -> PathBuf {
    if let Some(path) = std::env::var_os(WORKER_BINARY_ENV).map(PathBuf::from) {
        return path;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join(WORKER_BINARY_NAME);
            if sibling.exists() {
                return sibling;
            }
        }
    }
    swarm_core::find_executable(WORKER_BINARY_NAME)
        .unwrap_or_else(|| PathBuf::from(WORKER_BINARY_NAME))
}

/// Assemble the worker CLI invocation for one agent.
///
/// Parallel-phase workers idle for follow-up messages; serial and
/// validator workers get `--exit-on-idle` and finish with their initial
/// task.
pub fn build_worker_argv(
    record: &AgentRecord,
    team_name: &str,
    layout: &StateLayout,
    context_block: Option<&str>,
) -> Vec<String> {
    let mut prompt = record.prompt.clone();
    if let Some(block) = context_block {
        prompt.push_str(block);
    }

    let mut argv = vec![
        worker_binary().display().to_string(),
        prompt,
        "--log-file".to_string(),
        record.log_file.display().to_string(),
        "--model".to_string(),
        record.model.clone(),
        "--agent-id".to_string(),
        format!("{}@{}", record.name.to_lowercase(), team_name),
        "--team-dir".to_string(),
        layout.state_dir().display().to_string(),
    ];
    if record.mode != RoleMode::Parallel {
        argv.push("--exit-on-idle".to_string());
    }
    argv
}

/// Write `<state>/config.json`, the roster workers consult for broadcast
/// recipients and mission identity. Written once at startup, read-only
/// afterwards.
pub fn write_team_config(
    layout: &StateLayout,
    mission_id: &str,
    team_name: &str,
    backend_kind: &str,
    poll_interval_ms: u64,
    records: &[AgentRecord],
) -> Result<TeamConfig, ConfigError> {
    let team = TeamConfig {
        mission_id: mission_id.to_string(),
        team_name: team_name.to_string(),
        leader: swarm_core::LEADER_NAME.to_string(),
        backend: backend_kind.to_string(),
        poll_interval_ms,
        members: records
            .iter()
            .map(|r| TeamMember {
                name: r.name.clone(),
                color: r.color.clone(),
                model: r.model.clone(),
                mode: r.mode,
            })
            .collect(),
    };
    team.save(&layout.team_config_path())?;
    Ok(team)
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
