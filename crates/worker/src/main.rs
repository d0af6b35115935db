// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! agswarm-worker - per-agent child process

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use swarm_core::AgentName;
use swarm_worker::{lifecycle, watch};

#[derive(Parser)]
#[command(
    name = "agswarm-worker",
    version,
    about = "Swarm worker - runs one agent's task loop under the supervisor"
)]
struct Cli {
    /// Task text for the initial run (omit with --watch)
    task: Option<String>,

    /// Log file receiving the tee of the LLM stream
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Model handed to the LLM CLI
    #[arg(long, default_value = "auto-gemini-3")]
    model: String,

    /// Agent identity as name@team
    #[arg(long, value_name = "NAME@TEAM")]
    agent_id: Option<String>,

    /// State directory written by the supervisor (contains config.json)
    #[arg(long, value_name = "DIR", default_value = ".swarm")]
    team_dir: PathBuf,

    /// Exit after the initial task instead of idling for messages
    #[arg(long)]
    exit_on_idle: bool,

    /// Follow the log file read-only instead of running a task
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.watch {
        let log_file = cli
            .log_file
            .clone()
            .context("--watch requires --log-file")?;
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            flag.store(true, Ordering::Relaxed);
        });
        watch::follow(&log_file, &interrupted).await;
        return Ok(());
    }

    let Some(task) = cli.task else {
        bail!("a task is required unless --watch is given");
    };
    let agent_id = cli.agent_id.context("--agent-id is required")?;
    let identity = AgentName::parse(&agent_id)
        .with_context(|| format!("invalid --agent-id '{agent_id}'"))?;

    let log_file = cli.log_file.unwrap_or_else(|| {
        PathBuf::from("logs").join(format!("{}.log", swarm_core::agent_slug(identity.name())))
    });

    let worker = lifecycle::Worker::new(lifecycle::WorkerConfig {
        identity,
        team_dir: cli.team_dir,
        log_file,
        model: cli.model,
        exit_on_idle: cli.exit_on_idle,
    })
    .context("worker startup failed")?;

    let code = worker.run(&task).await;
    std::process::exit(code);
}
