// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! swarm-worker: the in-child agent runtime (`agswarm-worker`).
//!
//! One worker process per roster agent. It runs the initial task through
//! the LLM child, scrapes side-effect tags out of the text stream, then
//! sits in an idle loop polling its mailbox for follow-up work until it
//! times out, is shut down, or is interrupted.

pub mod effects;
pub mod lifecycle;
pub mod llm;
pub mod stream;
pub mod watch;

pub use effects::{EffectExecutor, SHELL_COMMAND_TIMEOUT};
pub use lifecycle::{Worker, WorkerConfig, WorkerError};
pub use llm::{find_llm_binary, LlmOutcome};
pub use stream::{SideEffect, StreamItem, StreamNote, TagStream};
