//! Worker binary specs: tag-driven side effects and shutdown handling.

use super::prelude::*;

const TASK: &str = "TASK: x\nEXPECTED OUTCOME: y\nREQUIRED TOOLS: z\nMUST DO: a\nMUST NOT DO: b\nCONTEXT: c";

#[test]
fn direct_message_lands_in_recipient_inbox() {
    let project = Project::new();
    project.write_team_config(&["A", "Q", "Quality_Validator"]);
    let stub = project.stub_llm(r#"echo '<<SEND_MESSAGE to="Q">>hello<<END_MESSAGE>>'"#);

    project
        .worker(&[
            TASK,
            "--agent-id",
            "a@spec-team",
            "--team-dir",
            ".swarm",
            "--log-file",
            "logs/a.log",
            "--exit-on-idle",
        ])
        .env("GEMINI_PATH", &stub)
        .assert()
        .code(0);

    let messages = project.inbox_messages("Q");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["sender"], "A");
    assert_eq!(messages[0]["recipient"], "Q");
    assert_eq!(messages[0]["type"], "direct");
    assert_eq!(messages[0]["content"], "hello");
}

#[test]
fn broadcast_reaches_everyone_but_sender() {
    let project = Project::new();
    project.write_team_config(&["A", "B", "C", "Quality_Validator"]);
    let stub = project.stub_llm("echo '<<BROADCAST>>ping<<END_BROADCAST>>'");

    project
        .worker(&[
            TASK,
            "--agent-id",
            "a@spec-team",
            "--team-dir",
            ".swarm",
            "--log-file",
            "logs/a.log",
            "--exit-on-idle",
        ])
        .env("GEMINI_PATH", &stub)
        .assert()
        .code(0);

    for name in ["B", "C", "Quality_Validator"] {
        let messages = project.inbox_messages(name);
        assert_eq!(messages.len(), 1, "{name} should get the broadcast");
        assert_eq!(messages[0]["type"], "broadcast");
        assert_eq!(messages[0]["content"], "ping");
    }
    assert!(project.inbox_messages("A").is_empty(), "sender excluded");
}

#[test]
fn file_write_tag_creates_file_and_completion_reaches_leader() {
    let project = Project::new();
    project.write_team_config(&["A", "Quality_Validator"]);
    let stub = project.stub_llm(
        "echo '<<WRITE_FILE path=\"out/result.txt\">>'\n\
         echo 'from the stub'\n\
         echo '<<END_WRITE>>'",
    );

    project
        .worker(&[
            TASK,
            "--agent-id",
            "a@spec-team",
            "--team-dir",
            ".swarm",
            "--log-file",
            "logs/a.log",
            "--exit-on-idle",
        ])
        .env("GEMINI_PATH", &stub)
        .assert()
        .code(0);

    let written = std::fs::read_to_string(project.path().join("out/result.txt")).unwrap();
    assert_eq!(written, "from the stub");

    let leader = project.inbox_messages("leader");
    assert_eq!(leader.len(), 1);
    assert_eq!(leader[0]["type"], "status_update");
    assert!(leader[0]["content"]
        .as_str()
        .unwrap()
        .contains("__AGENT_COMPLETED__: initial_task"));

    // The worker teed the stream to its log.
    let log = std::fs::read_to_string(project.path().join("logs/a.log")).unwrap();
    assert!(log.contains("END_WRITE"));
}

#[test]
fn queued_shutdown_request_is_acknowledged() {
    let project = Project::new();
    project.write_team_config(&["A", "Quality_Validator"]);
    let stub = project.stub_llm("echo working");
    project.enqueue_message("A", "shutdown_request", "leader", "stop please");

    project
        .worker(&[
            TASK,
            "--agent-id",
            "a@spec-team",
            "--team-dir",
            ".swarm",
            "--log-file",
            "logs/a.log",
        ])
        .env("GEMINI_PATH", &stub)
        .assert()
        .code(0);

    let leader = project.inbox_messages("leader");
    let ack: Vec<_> = leader
        .iter()
        .filter(|m| m["type"] == "shutdown_response")
        .collect();
    assert_eq!(ack.len(), 1);
    assert_eq!(ack[0]["sender"], "A");

    // The request was consumed into processed/, not left unread.
    assert!(project.inbox_messages("A").is_empty());
    let processed = project
        .path()
        .join(".swarm/mailboxes/A/processed/0000000000001-fixd0001.json");
    assert!(processed.exists());
}

#[test]
fn watch_requires_log_file() {
    let project = Project::new();
    let output = project.worker(&["--watch"]).output().unwrap();
    assert_ne!(output.status.code(), Some(0));
}

#[test]
fn task_requires_agent_id() {
    let project = Project::new();
    let output = project.worker(&[TASK]).output().unwrap();
    assert_ne!(output.status.code(), Some(0));
}
