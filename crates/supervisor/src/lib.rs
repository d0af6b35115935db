// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! swarm-supervisor: the phased scheduler behind the `agswarm` binary.
//!
//! Owns the mission record, spawns workers through a pluggable backend,
//! drains the leader mailbox, applies watchdog and retry policy, and
//! drives every mission to a terminal status.

pub mod demo;
pub mod kernel;
pub mod keys;
pub mod progress;
pub mod record;
pub mod report;
pub mod resume;
pub mod spawn;

pub use demo::DemoBackend;
pub use kernel::{Supervisor, SupervisorError};
pub use keys::{spawn_key_listener, KeyCommand};
pub use record::AgentRecord;
pub use resume::{cleanup_stale, find_resumable, ResumeError};
