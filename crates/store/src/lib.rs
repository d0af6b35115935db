// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! swarm-store: the durable state the supervisor and its workers share.
//!
//! Three independent stores, all plain files under `.swarm/`:
//! - [`mailbox`] - per-agent single-consumer message queues with
//!   filesystem-atomic enqueue
//! - [`audit`] - append-only JSONL event trail per mission
//! - [`mission`] - the supervisor-owned mission record

pub mod audit;
pub mod mailbox;
pub mod mission;

pub use audit::{
    AuditEvent, AuditKind, AuditLog, AuditSummary, FailureClass, TimelineEntry,
};
pub use mailbox::{all_processed_messages, Mailbox, MailboxCounts, MailboxError};
pub use mission::{MissionAgent, MissionError, MissionState, MissionStore};
