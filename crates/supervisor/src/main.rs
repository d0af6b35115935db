// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! agswarm - swarm supervisor CLI

use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use swarm_core::{StateLayout, SwarmConfig};
use swarm_roster::{load_roster, validate_roster, ResolvedAgent};
use swarm_store::{MissionState, MissionStore};
use swarm_supervisor::{
    cleanup_stale, find_resumable, spawn_key_listener, AgentRecord, DemoBackend, ResumeError,
    Supervisor,
};

#[derive(Parser)]
#[command(
    name = "agswarm",
    version,
    about = "Swarm supervisor - runs a roster of LLM workers against a mission"
)]
struct Cli {
    /// Mission description (used for the team name); defaults to the
    /// roster file stem
    description: Option<String>,

    /// Simulated execution without worker processes
    #[arg(long)]
    demo: bool,

    /// Reopen the latest resumable mission
    #[arg(long)]
    resume: bool,

    /// Mission to resume (with --resume)
    #[arg(long, value_name = "ID")]
    mission_id: Option<String>,

    /// Mark the latest stale mission failed and exit
    #[arg(long)]
    cleanup_stale: bool,

    /// Skip the plan-mode confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Roster file
    #[arg(long, value_name = "PATH", default_value = "subagents.yaml")]
    roster: PathBuf,

    /// Supervisor config file
    #[arg(long, value_name = "PATH", default_value = "swarm-config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let layout = StateLayout::new(cwd);
    if let Err(e) = layout.ensure() {
        eprintln!("Error: cannot create state directories: {e}");
        std::process::exit(1);
    }

    // Keep stdout for plan/report output; diagnostics go to the log file.
    let log_guard = setup_logging(&layout);

    let code = run(cli, layout).await;
    // Flush the non-blocking appender before exiting.
    drop(log_guard);
    std::process::exit(code);
}

async fn run(cli: Cli, layout: StateLayout) -> i32 {
    let store = MissionStore::new(layout.missions_dir());

    if cli.cleanup_stale {
        return match cleanup_stale(&store) {
            Ok(Some(id)) => {
                println!("[Supervisor] Marked stale mission {id} as failed.");
                0
            }
            Ok(None) => {
                println!("[Supervisor] No stale mission to clean up.");
                0
            }
            Err(e) => {
                eprintln!("Error: {e}");
                1
            }
        };
    }

    let config = match SwarmConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            println!("invalid_swarm_config: {e}");
            return 1;
        }
    };

    // Pre-run validation: halt with stable tokens before any spawn.
    let roster = match load_roster(&cli.roster) {
        Ok(roster) => roster,
        Err(e) => {
            println!("{}: {}", e.token(), e);
            return 1;
        }
    };
    let agents = match validate_roster(&roster.subagents, &config.default_model) {
        Ok(agents) => agents,
        Err(failures) => {
            for failure in &failures {
                println!("{failure}");
            }
            return 1;
        }
    };

    let mission = if cli.resume {
        match find_resumable(&store, cli.mission_id.as_deref()) {
            Ok(mission) => {
                println!(
                    "[Supervisor] Resuming mission {} (attempt {}).",
                    mission.mission_id, mission.attempt
                );
                mission
            }
            Err(ResumeError::Stale(id)) => {
                println!("[Supervisor] Mission {id} is stale; marked failed.");
                return 1;
            }
            Err(e) => {
                println!("[Supervisor] {e}.");
                return 1;
            }
        }
    } else {
        let description = cli.description.clone().unwrap_or_else(|| {
            cli.roster
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "mission".to_string())
        });
        MissionState::create(description)
    };

    let records = build_records(&agents, &mission, &layout);
    print_plan(&records);

    if !cli.yes && !confirm_plan() {
        println!("[Supervisor] Execution cancelled.");
        return 0;
    }

    let backend: Box<dyn swarm_backend::SpawnBackend> = if cli.demo {
        Box::new(DemoBackend::new())
    } else {
        match swarm_backend::select_backend(config.backend) {
            Ok(backend) => backend,
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        }
    };

    let keys = spawn_key_listener();
    let supervisor = match Supervisor::new(
        layout,
        backend,
        mission,
        records,
        keys,
        !cli.demo,
        config.poll_interval_ms,
    ) {
        Ok(supervisor) => supervisor,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    match supervisor.run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

/// Build supervisor records, carrying over terminal statuses when
/// resuming.
fn build_records(
    agents: &[ResolvedAgent],
    mission: &MissionState,
    layout: &StateLayout,
) -> Vec<AgentRecord> {
    agents
        .iter()
        .map(|agent| {
            let mut record =
                AgentRecord::new(agent.clone(), layout.agent_log_path(&agent.name));
            if let Some(prior) = mission
                .agents
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(&agent.name))
            {
                if prior.status.is_terminal() {
                    record.status = prior.status;
                }
            }
            record
        })
        .collect()
}

fn print_plan(records: &[AgentRecord]) {
    use swarm_core::RoleMode;

    println!("\n[Supervisor] Team Plan:");
    println!("{:<20} {:<22} {:<10} {:<10}", "Name", "Model", "Color", "Mode");
    println!("{}", "-".repeat(65));
    for record in records {
        println!(
            "{:<20} {:<22} {:<10} {:<10}",
            record.name, record.model, record.color, record.mode
        );
    }
    println!("{}", "-".repeat(65));

    let count = |mode: RoleMode| records.iter().filter(|r| r.mode == mode).count();
    println!(
        "[Supervisor] Phases: Parallel({}) -> Serial({}) -> Validator({})",
        count(RoleMode::Parallel),
        count(RoleMode::Serial),
        count(RoleMode::Validator)
    );

    let resumed = records.iter().filter(|r| r.status.is_terminal()).count();
    if resumed > 0 {
        println!("[Supervisor] {resumed} agent(s) already terminal from a previous attempt.");
    }
}

/// Plan-mode confirmation. EOF (detached background execution) counts as
/// consent, as does a non-interactive stdin.
fn confirm_plan() -> bool {
    if !std::io::stdin().is_terminal() {
        println!("[Supervisor] Non-interactive stdin; proceeding without confirmation.");
        return true;
    }
    print!("\n[Plan Mode] Execute this team? [y/N]: ");
    use std::io::Write;
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) => {
            println!("[Supervisor] No input stream detected. Assuming --yes for background execution.");
            true
        }
        Ok(_) => line.trim().eq_ignore_ascii_case("y"),
        Err(_) => false,
    }
}

/// Maximum supervisor log size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the supervisor log if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `supervisor.log` → `.1` → `.2` → `.3`, deleting the oldest.
/// Best-effort: rotation failures are ignored so the supervisor still
/// starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(layout: &StateLayout) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = layout.supervisor_log_path();
    rotate_log_if_needed(&log_path);

    let dir = log_path.parent()?;
    let file_name = log_path.file_name()?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Some(guard)
}
