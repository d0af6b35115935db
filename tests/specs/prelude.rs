//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving the agswarm binaries against a
//! throwaway project directory with a stub LLM.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Upper bound for any single binary invocation in specs.
pub const SPEC_TIMEOUT: Duration = Duration::from_secs(60);

/// Returns the path to a workspace binary.
///
/// Resolves relative to the test binary itself (target/debug/deps/..),
/// falling back to CARGO_MANIFEST_DIR for direct invocations.
pub fn binary_path(name: &str) -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let candidate = debug_dir.join(name);
            if candidate.exists() {
                return candidate;
            }
        }
    }
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("target/debug")
        .join(name)
}

pub fn supervisor_binary() -> PathBuf {
    binary_path("agswarm")
}

pub fn worker_binary() -> PathBuf {
    binary_path("agswarm-worker")
}

/// A roster prompt carrying all six required sections.
pub fn sectioned_prompt(role: &str) -> String {
    format!(
        "You are {role}.\n\
         TASK:\n- do the assigned work\n\
         EXPECTED OUTCOME:\n- the work is done\n\
         REQUIRED TOOLS:\n- tagged output effects\n\
         MUST DO:\n- stay on task\n\
         MUST NOT DO:\n- touch unrelated files\n\
         CONTEXT:\n- spec test fixture\n"
    )
}

/// A valid two-agent roster (one parallel worker plus the validator).
pub fn valid_roster() -> String {
    format!(
        "subagents:\n\
         \x20 - name: \"Coder\"\n\
         \x20   color: \"green\"\n\
         \x20   model: \"auto-gemini-3\"\n\
         \x20   mode: \"parallel\"\n\
         \x20   prompt: |\n{}\
         \x20 - name: \"Quality_Validator\"\n\
         \x20   color: \"red\"\n\
         \x20   model: \"auto-gemini-3\"\n\
         \x20   mode: \"validator\"\n\
         \x20   prompt: |\n{}",
        indent(&sectioned_prompt("a coder"), 6),
        indent(&sectioned_prompt("the validator"), 6),
    )
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|l| format!("{pad}{l}\n"))
        .collect::<String>()
}

/// Throwaway project directory.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Install an executable stub LLM and return its path.
    pub fn stub_llm(&self, body: &str) -> PathBuf {
        let path = self.path().join("gemini-stub");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// Supervisor invocation rooted at this project.
    pub fn agswarm(&self, args: &[&str]) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(supervisor_binary());
        cmd.current_dir(self.path())
            .args(args)
            .env("AG_SWARM_WORKER_BINARY", worker_binary())
            .timeout(SPEC_TIMEOUT);
        cmd
    }

    /// Worker invocation rooted at this project.
    pub fn worker(&self, args: &[&str]) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(worker_binary());
        cmd.current_dir(self.path()).args(args).timeout(SPEC_TIMEOUT);
        cmd
    }

    /// Write the `.swarm/config.json` a worker expects at startup.
    pub fn write_team_config(&self, members: &[&str]) {
        let members: Vec<serde_json::Value> = members
            .iter()
            .map(|name| {
                serde_json::json!({
                    "name": name,
                    "color": "red",
                    "model": "auto-gemini-3",
                    "mode": if *name == "Quality_Validator" { "validator" } else { "parallel" },
                })
            })
            .collect();
        let config = serde_json::json!({
            "mission_id": "spec0001",
            "team_name": "spec-team",
            "leader": "leader",
            "backend": "thread",
            "poll_interval_ms": 50,
            "members": members,
        });
        self.write(
            ".swarm/config.json",
            &serde_json::to_string_pretty(&config).unwrap(),
        );
    }

    /// Place a message file directly into an agent's inbox.
    pub fn enqueue_message(&self, recipient: &str, msg_type: &str, sender: &str, content: &str) {
        let inbox = self
            .path()
            .join(".swarm/mailboxes")
            .join(recipient)
            .join("inbox");
        std::fs::create_dir_all(&inbox).unwrap();
        let msg = serde_json::json!({
            "msg_id": "fixd0001",
            "sender": sender,
            "recipient": recipient,
            "type": msg_type,
            "content": content,
            "ts": 1.0,
        });
        std::fs::write(inbox.join("0000000000001-fixd0001.json"), msg.to_string()).unwrap();
    }

    /// Read every message currently in an agent's inbox.
    pub fn inbox_messages(&self, agent: &str) -> Vec<serde_json::Value> {
        let inbox = self
            .path()
            .join(".swarm/mailboxes")
            .join(agent)
            .join("inbox");
        let Ok(entries) = std::fs::read_dir(&inbox) else {
            return Vec::new();
        };
        let mut names: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        names.sort();
        names
            .iter()
            .filter_map(|p| std::fs::read_to_string(p).ok())
            .filter_map(|raw| serde_json::from_str(&raw).ok())
            .collect()
    }

    /// Load the most recently written mission record.
    pub fn latest_mission(&self) -> serde_json::Value {
        let dir = self.path().join(".swarm/missions");
        let newest = std::fs::read_dir(&dir)
            .unwrap()
            .flatten()
            .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
            .max_by_key(|e| e.metadata().unwrap().modified().unwrap())
            .expect("a mission file");
        serde_json::from_str(&std::fs::read_to_string(newest.path()).unwrap()).unwrap()
    }
}
