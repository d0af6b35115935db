// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task-section contract.
//!
//! Every prompt handed to a worker must carry six sections. The supervisor
//! rejects rosters that miss any of them; the worker is more forgiving and
//! wraps incoming follow-up tasks in a canonical template instead.

/// Section headers that must appear verbatim in every task body.
pub const REQUIRED_SECTIONS: &[&str] = &[
    "TASK",
    "EXPECTED OUTCOME",
    "REQUIRED TOOLS",
    "MUST DO",
    "MUST NOT DO",
    "CONTEXT",
];

/// Sections absent from `text`, in canonical order.
pub fn missing_sections(text: &str) -> Vec<&'static str> {
    REQUIRED_SECTIONS
        .iter()
        .copied()
        .filter(|s| !text.contains(s))
        .collect()
}

/// Wrap a bare task body in the canonical template when any required
/// section is missing; otherwise return it unchanged.
pub fn ensure_required_sections(task: &str) -> String {
    if missing_sections(task).is_empty() {
        return task.to_string();
    }

    format!(
        "TASK:\n{task}\n\n\
         EXPECTED OUTCOME:\nThe task above is completed and the result is reported back to the team.\n\n\
         REQUIRED TOOLS:\nTagged output effects: file writes, shell commands, and team messages.\n\n\
         MUST DO:\n- Work only on the task described above.\n- Record discoveries in findings.md and status in progress.md.\n\n\
         MUST NOT DO:\n- Do not modify files unrelated to the task.\n- Do not wait for input that will not arrive.\n\n\
         CONTEXT:\nYou are one member of a multi-agent team cooperating on a shared mission.\n"
    )
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
