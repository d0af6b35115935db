// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only log following for `--watch`.
//!
//! Tails a worker's log tee without touching any mailbox or audit state.
//! Follows by byte offset so a truncated or rotated file restarts cleanly
//! from the top.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

/// Poll cadence while following.
const FOLLOW_INTERVAL: Duration = Duration::from_millis(500);

/// Read anything appended past `offset`; returns the new offset.
fn read_from(path: &Path, offset: u64) -> std::io::Result<(String, u64)> {
    let mut file = std::fs::File::open(path)?;
    let len = file.metadata()?.len();
    let start = if len < offset { 0 } else { offset };
    file.seek(SeekFrom::Start(start))?;
    let mut chunk = String::new();
    file.read_to_string(&mut chunk)?;
    let new_offset = start + chunk.len() as u64;
    Ok((chunk, new_offset))
}

/// Follow a log file until interrupted, printing appended content.
pub async fn follow(path: &Path, interrupted: &std::sync::atomic::AtomicBool) {
    let mut offset = 0u64;
    let mut announced_missing = false;
    loop {
        if interrupted.load(std::sync::atomic::Ordering::Relaxed) {
            return;
        }
        match read_from(path, offset) {
            Ok((chunk, new_offset)) => {
                announced_missing = false;
                if !chunk.is_empty() {
                    print!("{}", chunk);
                }
                offset = new_offset;
            }
            Err(_) if !announced_missing => {
                eprintln!("waiting for {} to appear...", path.display());
                announced_missing = true;
            }
            Err(_) => {}
        }
        tokio::time::sleep(FOLLOW_INTERVAL).await;
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
