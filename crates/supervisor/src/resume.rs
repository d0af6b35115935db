// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mission resume and stale-mission handling.

use swarm_core::{env, AgentStatus, MissionStatus};
use swarm_store::{MissionState, MissionStore};
use thiserror::Error;

/// Failure reason stamped on missions too old to resume.
pub const STALE_REASON: &str = "stale_resume_timeout";

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("no resumable mission found")]
    NotFound,
    #[error("mission {0} is stale and has been marked failed")]
    Stale(String),
    #[error(transparent)]
    Store(#[from] swarm_store::MissionError),
}

/// Find and prepare a mission for resumption.
///
/// A resumable mission older than the stale threshold is persisted as
/// failed (`stale_resume_timeout`) and reported as [`ResumeError::Stale`].
/// A fresh one comes back with `attempt` incremented and every
/// non-terminal agent reset to `pending` for respawn.
pub fn find_resumable(
    store: &MissionStore,
    mission_id: Option<&str>,
) -> Result<MissionState, ResumeError> {
    let mut mission = match mission_id {
        Some(id) => store.load(id)?,
        None => store.latest().ok_or(ResumeError::NotFound)?,
    };

    if !mission.is_resumable() {
        return Err(ResumeError::NotFound);
    }

    let stale_after = env::resume_stale().as_secs_f64();
    if store.is_stale(&mission, stale_after) {
        mission.fail(STALE_REASON);
        store.save(&mission)?;
        return Err(ResumeError::Stale(mission.mission_id));
    }

    mission.attempt += 1;
    for agent in &mut mission.agents {
        if !agent.status.is_terminal() {
            agent.status = AgentStatus::Pending;
        }
    }
    store.save(&mission)?;
    Ok(mission)
}

/// `--cleanup-stale`: mark the latest stale mission failed.
///
/// Returns the mission id when one was cleaned, `None` when there was
/// nothing to do.
pub fn cleanup_stale(store: &MissionStore) -> Result<Option<String>, ResumeError> {
    let Some(mut mission) = store.latest() else {
        return Ok(None);
    };
    if mission.status == MissionStatus::Completed || mission.status == MissionStatus::Failed {
        return Ok(None);
    }
    let stale_after = env::resume_stale().as_secs_f64();
    if !store.is_stale(&mission, stale_after) {
        return Ok(None);
    }
    mission.fail(STALE_REASON);
    store.save(&mission)?;
    Ok(Some(mission.mission_id))
}

#[cfg(test)]
#[path = "resume_tests.rs"]
mod tests;
