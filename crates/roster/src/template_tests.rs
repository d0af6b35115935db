// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn full_prompt() -> String {
    REQUIRED_SECTIONS
        .iter()
        .map(|s| format!("{s}:\nbody\n"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn complete_prompt_has_no_missing_sections() {
    assert!(missing_sections(&full_prompt()).is_empty());
}

#[test]
fn reports_missing_sections_in_order() {
    let partial = "TASK:\ndo it\n\nCONTEXT:\nnone\n";
    assert_eq!(
        missing_sections(partial),
        vec!["EXPECTED OUTCOME", "REQUIRED TOOLS", "MUST DO", "MUST NOT DO"]
    );
}

#[test]
fn complete_task_passes_through_unchanged() {
    let prompt = full_prompt();
    assert_eq!(ensure_required_sections(&prompt), prompt);
}

#[test]
fn bare_task_is_wrapped_with_all_sections() {
    let wrapped = ensure_required_sections("summarize the findings");
    assert!(wrapped.contains("summarize the findings"));
    assert!(missing_sections(&wrapped).is_empty());
}

#[test]
fn must_not_do_alone_does_not_satisfy_must_do() {
    let only_must_not = "TASK\nEXPECTED OUTCOME\nREQUIRED TOOLS\nMUST NOT DO\nCONTEXT";
    assert_eq!(missing_sections(only_must_not), vec!["MUST DO"]);
}
