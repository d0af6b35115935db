// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-mission report printed to stdout.

use std::fmt::Write as _;
use swarm_core::{epoch_s, format_clock, format_elapsed, AgentStatus};
use swarm_store::{AuditLog, MissionState};

/// Number of timeline entries shown at the bottom of the report.
const TIMELINE_LIMIT: usize = 10;

/// Render the report for a finished (or abandoned) mission.
pub fn render_report(mission: &MissionState, audit: &AuditLog) -> String {
    let summary = audit.get_summary();
    let timeline = audit.get_timeline(TIMELINE_LIMIT);

    let duration = mission.ended_at.unwrap_or_else(epoch_s) - mission.started_at;
    let completed = mission
        .agents
        .iter()
        .filter(|a| a.status == AgentStatus::Completed)
        .count();
    let failed = mission
        .agents
        .iter()
        .filter(|a| a.status == AgentStatus::Failed)
        .count();

    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "          Swarm Mission Report");
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "  Mission:  {}", mission.description);
    let _ = writeln!(out, "  Status:   {}", mission.status);
    if let Some(reason) = &mission.failure_reason {
        let _ = writeln!(out, "  Reason:   {}", reason);
    }
    let _ = writeln!(out, "  Duration: {}", format_elapsed(duration));
    let _ = writeln!(
        out,
        "  Agents:   {} ({} succeeded, {} failed)",
        mission.agents.len(),
        completed,
        failed
    );
    let _ = writeln!(out, "  Attempts: {}", mission.attempt);
    let _ = writeln!(out);

    if !summary.agents.is_empty() {
        let _ = writeln!(out, "  Agent Breakdown:");
        for agent in &mission.agents {
            let Some(stats) = summary.agents.get(&agent.name) else {
                continue;
            };
            let icon = if agent.status == AgentStatus::Completed {
                "✔"
            } else {
                "✘"
            };
            let _ = writeln!(
                out,
                "    {} {:<16} ({:<9}) {} writes, {} cmds, {} msgs",
                icon, agent.name, agent.mode, stats.file_writes, stats.commands, stats.messages
            );
        }
        let _ = writeln!(out);
    }

    if !summary.files_modified.is_empty() {
        let files: Vec<&str> = summary.files_modified.iter().map(|s| s.as_str()).collect();
        let _ = writeln!(out, "  Files Modified: {}", files.join(", "));
    }
    let _ = writeln!(out, "  Commands Run: {}", summary.commands_run);
    let _ = writeln!(out, "  Messages Exchanged: {}", summary.messages_sent);

    if summary.errors > 0 {
        let _ = writeln!(out, "  Errors: {}", summary.errors);
    }
    if !summary.failure_classes.is_empty() {
        let _ = writeln!(out, "  Failure Classes:");
        let mut classes: Vec<_> = summary.failure_classes.iter().collect();
        classes.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (class, count) in classes {
            let _ = writeln!(out, "    - {}: {}", class, count);
        }
    }

    if !timeline.is_empty() {
        let _ = writeln!(out, "  Recent Timeline:");
        for item in &timeline {
            let class = if item.failure_class.is_empty() {
                String::new()
            } else {
                format!(" [{}]", item.failure_class)
            };
            let _ = writeln!(
                out,
                "    - {} {}::{}{}",
                format_clock(item.ts),
                item.agent,
                item.event,
                class
            );
        }
    }

    let _ = writeln!(out, "  Audit Trail: {}", audit.log_path().display());
    let _ = writeln!(out, "{}", "=".repeat(60));
    out
}

/// Print the report; rendering problems must never fail the mission.
pub fn print_report(mission: &MissionState, audit: &AuditLog) {
    print!("{}", render_report(mission, audit));
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
