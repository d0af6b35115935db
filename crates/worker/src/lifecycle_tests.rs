// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::os::unix::fs::PermissionsExt;
use swarm_core::{RoleMode, TeamMember};
use tempfile::TempDir;

/// Project layout with a team config and a stub LLM on GEMINI_PATH.
struct Rig {
    tmp: TempDir,
}

impl Rig {
    fn new(stub_body: &str) -> Self {
        let tmp = TempDir::new().unwrap();
        let team_dir = tmp.path().join(".swarm");

        let member = |name: &str, mode: RoleMode| TeamMember {
            name: name.to_string(),
            color: "red".to_string(),
            model: "auto-gemini-3".to_string(),
            mode,
        };
        let team = TeamConfig {
            mission_id: "m1".into(),
            team_name: "t".into(),
            leader: "leader".into(),
            backend: "thread".into(),
            poll_interval_ms: 50,
            members: vec![
                member("A", RoleMode::Parallel),
                member("Q", RoleMode::Validator),
            ],
        };
        team.save(&team_dir.join("config.json")).unwrap();

        let stub = tmp.path().join("gemini");
        std::fs::write(&stub, format!("#!/bin/sh\n{stub_body}\n")).unwrap();
        let mut perms = std::fs::metadata(&stub).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&stub, perms).unwrap();
        std::env::set_var("GEMINI_PATH", &stub);

        Self { tmp }
    }

    fn worker(&self, exit_on_idle: bool) -> Worker {
        Worker::new(WorkerConfig {
            identity: AgentName::new("A", "t").unwrap(),
            team_dir: self.tmp.path().join(".swarm"),
            log_file: self.tmp.path().join("logs").join("a.log"),
            model: "auto-gemini-3".to_string(),
            exit_on_idle,
        })
        .unwrap()
    }

    fn mailbox(&self, owner: &str) -> Mailbox {
        Mailbox::new(owner, self.tmp.path().join(".swarm").join("mailboxes"))
    }

    fn audit(&self) -> AuditLog {
        AuditLog::new("m1", self.tmp.path().join(".swarm").join("audit"))
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        std::env::remove_var("GEMINI_PATH");
    }
}

#[tokio::test]
#[serial]
async fn exit_on_idle_completes_after_initial_task() {
    let rig = Rig::new("echo working");
    let code = rig.worker(true).run("TASK: do it").await;
    assert_eq!(code, 0);

    let leader = rig.mailbox("leader");
    let messages = leader.poll();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_completion_signal());
    assert!(messages[0].content.contains("initial_task"));

    // Log tee captured the stream.
    let log = std::fs::read_to_string(rig.tmp.path().join("logs").join("a.log")).unwrap();
    assert!(log.contains("working"));
}

#[tokio::test]
#[serial]
async fn side_effects_execute_during_task() {
    let rig = Rig::new(
        r#"echo '<<WRITE_FILE path="made/by-shim.txt">>'
echo 'payload'
echo '<<END_WRITE>>'
echo '<<SEND_MESSAGE to="Q">>hello validator<<END_MESSAGE>>'"#,
    );
    let code = rig.worker(true).run("TASK: emit tags").await;
    assert_eq!(code, 0);

    let written = std::fs::read_to_string(rig.tmp.path().join("made/by-shim.txt")).unwrap();
    assert_eq!(written, "payload");

    let q = rig.mailbox("Q");
    let messages = q.poll();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hello validator");

    let events = rig.audit().read_all();
    assert!(events
        .iter()
        .any(|e| e.event == AuditKind::FileWrite && e.detail == "made/by-shim.txt"));
    assert!(events.iter().any(|e| e.event == AuditKind::MessageSent));
}

#[tokio::test]
#[serial]
async fn shutdown_request_gets_response_and_clean_exit() {
    let rig = Rig::new("echo quick");

    // Queue the request before the worker enters its idle loop.
    rig.mailbox("leader")
        .send("A", MessageType::ShutdownRequest, "stop please", None)
        .unwrap();

    let code = rig.worker(false).run("TASK: quick").await;
    assert_eq!(code, 0);

    let leader = rig.mailbox("leader");
    let messages = leader.poll();
    let shutdown: Vec<_> = messages
        .iter()
        .filter(|m| m.msg_type == MessageType::ShutdownResponse)
        .collect();
    assert_eq!(shutdown.len(), 1);
    assert_eq!(shutdown[0].sender, "A");

    let events = rig.audit().read_all();
    assert!(events.iter().any(|e| e.event == AuditKind::Shutdown));
}

#[tokio::test]
#[serial]
async fn follow_up_message_runs_as_new_task() {
    let rig = Rig::new("echo run >> runs.txt");

    let leader = rig.mailbox("leader");
    leader
        .send("A", MessageType::Direct, "TASK: again", None)
        .unwrap();
    // Queued after the direct task, so the worker exits once both are done.
    std::thread::sleep(std::time::Duration::from_millis(5));
    leader
        .send("A", MessageType::ShutdownRequest, "stop", None)
        .unwrap();

    let code = rig.worker(false).run("TASK: first").await;
    assert_eq!(code, 0);

    let runs = std::fs::read_to_string(rig.tmp.path().join("runs.txt")).unwrap();
    assert_eq!(runs.lines().count(), 2, "initial + follow-up task");
}

#[tokio::test]
#[serial]
async fn idle_timeout_promotes_to_completed() {
    let rig = Rig::new("echo quick");
    std::env::set_var("AG_SWARM_AGENT_IDLE_TIMEOUT_SECONDS", "0.2");
    let code = rig.worker(false).run("TASK: quick").await;
    std::env::remove_var("AG_SWARM_AGENT_IDLE_TIMEOUT_SECONDS");
    assert_eq!(code, 0);

    let messages = rig.mailbox("leader").poll();
    let done: Vec<_> = messages
        .iter()
        .filter(|m| m.is_completion_signal())
        .collect();
    assert_eq!(done.len(), 1);
    assert!(done[0].content.contains("idle_timeout"));
}

#[tokio::test]
#[serial]
async fn missing_llm_binary_audits_config_error() {
    let rig = Rig::new("echo unused");
    // Point GEMINI_PATH at nothing and hide any real gemini.
    std::env::set_var("GEMINI_PATH", rig.tmp.path().join("absent"));
    let original_path = std::env::var_os("PATH");
    std::env::set_var("PATH", rig.tmp.path());

    let code = rig.worker(true).run("TASK: x").await;
    if let Some(path) = original_path {
        std::env::set_var("PATH", path);
    }
    // The worker survives the missing binary; completion still reported.
    assert_eq!(code, 0);

    let events = rig.audit().read_all();
    let err = events
        .iter()
        .find(|e| e.event == AuditKind::Error)
        .expect("one error event");
    assert_eq!(err.failure_class(), Some("config_error"));
}
