// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The LLM child process.
//!
//! The model CLI is an opaque subprocess producing a tagged text stream
//! on stdout. We drain it line by line under a task deadline, forwarding
//! every line over a channel; on deadline the child is interrupted first
//! and force-killed after a short grace.

use nix::sys::signal::{kill as send_signal, Signal};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use swarm_core::{find_executable, is_executable};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Grace between interrupting a timed-out child and force-killing it.
const TIMEOUT_KILL_GRACE: Duration = Duration::from_secs(2);

/// Upper bound for one line read, so the interrupt flag is noticed even
/// while the child is silent.
const READ_SLICE: Duration = Duration::from_millis(500);

/// How the LLM child ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmOutcome {
    /// Child exited on its own with this code.
    Exited(i32),
    /// The task deadline expired and the child was killed.
    TimedOut,
    /// The caller's interrupt flag was raised mid-stream.
    Interrupted,
}

/// Locate the model CLI: `GEMINI_PATH` wins, then a `PATH` search.
pub fn find_llm_binary() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("GEMINI_PATH").map(PathBuf::from) {
        if is_executable(&path) {
            return Some(path);
        }
    }
    find_executable("gemini")
}

/// Spawn the LLM child and stream its stdout.
///
/// Every complete line (without its newline) is forwarded over `line_tx`
/// while the consumer runs concurrently. Returns the outcome plus any
/// stderr text once the stream ends.
pub async fn run_llm(
    binary: &PathBuf,
    model: &str,
    prompt: &str,
    deadline: Duration,
    interrupted: &AtomicBool,
    line_tx: mpsc::Sender<String>,
) -> std::io::Result<(LlmOutcome, String)> {
    let mut child = Command::new(binary)
        .arg("chat")
        .arg("--model")
        .arg(model)
        .arg(prompt)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("llm child has no stdout"))?;
    let stderr = child.stderr.take();
    let mut lines = BufReader::new(stdout).lines();

    let started = tokio::time::Instant::now();
    let outcome = loop {
        if interrupted.load(Ordering::Relaxed) {
            kill_two_phase(&mut child).await;
            break LlmOutcome::Interrupted;
        }
        let remaining = deadline.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            tracing::warn!(deadline_s = deadline.as_secs(), "task deadline expired");
            kill_two_phase(&mut child).await;
            break LlmOutcome::TimedOut;
        }

        let slice = remaining.min(READ_SLICE);
        match tokio::time::timeout(slice, lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if line_tx.send(line).await.is_err() {
                    // Consumer is gone; treat like an interrupt.
                    kill_two_phase(&mut child).await;
                    break LlmOutcome::Interrupted;
                }
            }
            Ok(Ok(None)) => {
                // EOF: reap the child.
                let status = child.wait().await?;
                break LlmOutcome::Exited(exit_code_of(status));
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => continue, // slice elapsed, re-check deadline and flag
        }
    };

    let mut err_text = String::new();
    if let Some(mut stderr) = stderr {
        use tokio::io::AsyncReadExt;
        // Bounded: the child is dead or dying, so this cannot hang long.
        let _ = tokio::time::timeout(
            Duration::from_secs(2),
            stderr.read_to_string(&mut err_text),
        )
        .await;
    }
    Ok((outcome, err_text))
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|s| -s))
        .unwrap_or(-1)
}

/// Cooperative interrupt, short grace, then SIGKILL. Never trust the
/// child to honour the first phase.
async fn kill_two_phase(child: &mut tokio::process::Child) {
    if let Some(pid) = child.id() {
        let _ = send_signal(Pid::from_raw(pid as i32), Signal::SIGINT);
    }
    let graceful = tokio::time::timeout(TIMEOUT_KILL_GRACE, child.wait()).await;
    if graceful.is_err() {
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

#[cfg(test)]
#[path = "llm_tests.rs"]
mod tests;
