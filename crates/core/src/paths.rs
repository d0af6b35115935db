// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout for supervisor state.
//!
//! Everything the supervisor owns lives under `<project>/.swarm/`; worker
//! log files live under `<project>/logs/` so they survive state cleanup.

use std::path::{Path, PathBuf};

/// State directory name under the project root.
pub const STATE_DIR_NAME: &str = ".swarm";

/// Worker log directory name under the project root.
pub const LOGS_DIR_NAME: &str = "logs";

/// Resolved state layout for one project.
#[derive(Debug, Clone)]
pub struct StateLayout {
    project_root: PathBuf,
}

impl StateLayout {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// `<project>/.swarm`
    pub fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR_NAME)
    }

    /// `<project>/.swarm/mailboxes`
    pub fn mailboxes_dir(&self) -> PathBuf {
        self.state_dir().join("mailboxes")
    }

    /// `<project>/.swarm/audit`
    pub fn audit_dir(&self) -> PathBuf {
        self.state_dir().join("audit")
    }

    /// `<project>/.swarm/missions`
    pub fn missions_dir(&self) -> PathBuf {
        self.state_dir().join("missions")
    }

    /// `<project>/.swarm/config.json` - team roster consumed by workers.
    pub fn team_config_path(&self) -> PathBuf {
        self.state_dir().join("config.json")
    }

    /// `<project>/.swarm/supervisor.log`
    pub fn supervisor_log_path(&self) -> PathBuf {
        self.state_dir().join("supervisor.log")
    }

    /// `<project>/logs`
    pub fn logs_dir(&self) -> PathBuf {
        self.project_root.join(LOGS_DIR_NAME)
    }

    /// `<project>/logs/<agent_slug>.log` - the worker's tee of its LLM stream.
    pub fn agent_log_path(&self, agent_name: &str) -> PathBuf {
        self.logs_dir().join(format!("{}.log", agent_slug(agent_name)))
    }

    /// Create every directory the supervisor writes into.
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [
            self.state_dir(),
            self.mailboxes_dir(),
            self.audit_dir(),
            self.missions_dir(),
            self.logs_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Log-file slug for an agent name: lowercased, spaces replaced.
pub fn agent_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Locate an executable by scanning `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// True when `path` is an existing file with an execute bit set.
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
