//! Pre-run validation: stable tokens on stdout, exit 1, no spawns.

use super::prelude::*;

#[test]
fn missing_roster_reports_missing_config() {
    let project = Project::new();
    let output = project.agswarm(&["--yes"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("missing_config"), "stdout: {stdout}");
}

#[test]
fn unparseable_roster_reports_invalid_subagent_config() {
    let project = Project::new();
    project.write("subagents.yaml", "subagents: [ {{ nope");
    let output = project.agswarm(&["--yes"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("invalid_subagent_config"), "stdout: {stdout}");
}

#[test]
fn roster_without_validator_is_rejected() {
    let project = Project::new();
    project.write(
        "subagents.yaml",
        &format!(
            "subagents:\n  - name: Solo\n    color: red\n    model: m\n    mode: parallel\n    prompt: |\n{}",
            sectioned_prompt("solo")
                .lines()
                .map(|l| format!("      {l}\n"))
                .collect::<String>()
        ),
    );
    let output = project.agswarm(&["--yes"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("missing_quality_validator"), "stdout: {stdout}");
}

#[test]
fn prompt_missing_sections_is_rejected_with_indexed_token() {
    let project = Project::new();
    project.write(
        "subagents.yaml",
        "subagents:\n\
         \x20 - name: Coder\n\
         \x20   color: red\n\
         \x20   model: m\n\
         \x20   mode: parallel\n\
         \x20   prompt: just do something\n\
         \x20 - name: Quality_Validator\n\
         \x20   color: red\n\
         \x20   model: m\n\
         \x20   mode: validator\n\
         \x20   prompt: verify everything\n",
    );
    let output = project.agswarm(&["--yes"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("agent_0_prompt_missing_section:TASK"),
        "stdout: {stdout}"
    );
    assert!(
        stdout.contains("agent_1_prompt_missing_section:CONTEXT"),
        "stdout: {stdout}"
    );

    // Validation is fatal before any spawn: no mission record exists.
    assert!(!project.path().join(".swarm/missions").exists()
        || std::fs::read_dir(project.path().join(".swarm/missions"))
            .unwrap()
            .next()
            .is_none());
}

#[test]
fn cleanup_stale_with_nothing_to_do_exits_zero() {
    let project = Project::new();
    let output = project.agswarm(&["--cleanup-stale"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No stale mission"), "stdout: {stdout}");
}

#[test]
fn resume_without_mission_exits_one() {
    let project = Project::new();
    project.write("subagents.yaml", &valid_roster());
    let output = project.agswarm(&["--resume", "--yes"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no resumable mission"), "stdout: {stdout}");
}
