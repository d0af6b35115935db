// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental log tailing for the progress watchdog.
//!
//! Each tick the kernel asks for the most recent non-empty line of every
//! active worker's log. Only bytes appended since the previous call are
//! read; a truncated file restarts from the top.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

/// Offset-tracking reader for one log file.
#[derive(Debug, Default)]
pub struct LogTail {
    offset: u64,
    last_line: String,
}

impl LogTail {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent non-empty line seen so far.
    pub fn last_line(&self) -> &str {
        &self.last_line
    }

    /// Read newly appended content. Returns `true` when the last
    /// non-empty line changed - the watchdog's definition of progress.
    pub fn advance(&mut self, path: &Path) -> bool {
        let Ok(file) = File::open(path) else {
            return false;
        };
        let file_len = file.metadata().map(|m| m.len()).unwrap_or(0);
        if file_len < self.offset {
            self.offset = 0;
            self.last_line.clear();
        }
        if file_len == self.offset {
            return false;
        }

        let mut reader = BufReader::new(file);
        if reader.seek(SeekFrom::Start(self.offset)).is_err() {
            return false;
        }

        let mut changed = false;
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    // Only complete lines advance the offset; a partial
                    // trailing line is re-read next tick.
                    if !line.ends_with('\n') {
                        break;
                    }
                    self.offset += n as u64;
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && trimmed != self.last_line {
                        self.last_line.clear();
                        self.last_line.push_str(trimmed);
                        changed = true;
                    }
                }
            }
        }
        changed
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
