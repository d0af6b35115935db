// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! swarm-core: shared types for the agswarm supervisor and its workers.
//!
//! Everything that crosses a process boundary lives here: agent identity,
//! the mailbox message entity, status enums, the state-directory layout,
//! and the two config records (`SwarmConfig`, `TeamConfig`).

pub mod color;
pub mod config;
pub mod env;
pub mod id;
pub mod identity;
pub mod message;
pub mod paths;
pub mod slug;
pub mod status;
pub mod time_fmt;

pub use color::{assign_color, COLOR_PALETTE};
pub use config::{BackendKind, ConfigError, SwarmConfig, TeamConfig, TeamMember};
pub use id::{short_id, IdGen, ShortId, UuidIdGen};
pub use identity::{AgentName, IdentityError, LEADER_NAME};
pub use message::{Message, MessageType, COMPLETION_SIGNAL};
pub use paths::{agent_slug, find_executable, is_executable, StateLayout};
pub use slug::team_slug;
pub use status::{AgentStatus, MissionStatus, RoleMode, StopMode};
pub use time_fmt::{epoch_ms, epoch_s, format_clock, format_elapsed};

#[cfg(any(test, feature = "test-support"))]
pub use id::SequentialIdGen;
