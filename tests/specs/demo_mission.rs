//! Demo-mode missions: full kernel pass with simulated workers.

use super::prelude::*;
use serial_test::serial;

#[test]
#[serial]
fn demo_mission_completes_and_reports() {
    let project = Project::new();
    project.write("subagents.yaml", &valid_roster());

    let output = project
        .agswarm(&["--demo", "--yes", "demo spec mission"])
        .env("AG_SWARM_DEMO_FAIL_RATE", "0")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "stdout: {stdout}");
    assert!(stdout.contains("Swarm Mission Report"), "stdout: {stdout}");
    assert!(stdout.contains("Status:   completed"), "stdout: {stdout}");

    let mission = project.latest_mission();
    assert_eq!(mission["status"], "completed");
    assert_eq!(mission["team_name"], "demo-spec-mission");
    assert!(mission["ended_at"].is_number());
    for agent in mission["agents"].as_array().unwrap() {
        assert_eq!(agent["status"], "completed");
    }

    // The audit trail recorded the simulated spawns.
    let audit_dir = project.path().join(".swarm/audit");
    let audit_file = std::fs::read_dir(&audit_dir)
        .unwrap()
        .flatten()
        .next()
        .expect("an audit file");
    let audit = std::fs::read_to_string(audit_file.path()).unwrap();
    assert!(audit.contains("\"spawned\""));

    // Workers read the roster the supervisor wrote.
    let team: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(project.path().join(".swarm/config.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(team["leader"], "leader");
    assert_eq!(team["members"].as_array().unwrap().len(), 2);
}

#[test]
#[serial]
fn demo_mission_with_full_fail_rate_fails() {
    let project = Project::new();
    project.write("subagents.yaml", &valid_roster());

    let output = project
        .agswarm(&["--demo", "--yes", "doomed demo"])
        .env("AG_SWARM_DEMO_FAIL_RATE", "1")
        .env("AG_SWARM_MAX_RETRIES", "0")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains("Status:   failed"), "stdout: {stdout}");

    let mission = project.latest_mission();
    assert_eq!(mission["status"], "failed");
    assert!(mission["failure_reason"]
        .as_str()
        .unwrap()
        .contains("returncode"));
}
