// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Agent Garden CLI
//!
//! The `garden` binary runs the orchestrator's day/night pulse.
//!
//! ## Modes
//!
//! - **Single pulse** (default): run one pulse for `--phase`, or for the
//!   phase the clock says it is, then exit
//! - **Scheduled**: `garden --schedule` runs a pulse now and again at every
//!   phase boundary until interrupted
//! - **Spawn**: `garden --spawn-helper --helper-name ... --helper-mission ...
//!   --helper-specialization ...` creates a helper and exits
//!
//! ## Commands
//!
//! - `garden task add|list` - Seed and inspect the orchestrator backlog
//! - `garden config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use garden_cli::commands::{self, ConfigCommand, PulseArgs, SpawnArgs, TaskCommand};
use garden_core::domain::phase::Phase;

/// Agent Garden - an orchestrator and its helper agents
#[derive(Parser)]
#[command(name = "garden")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "GARDEN_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Root directory for agent state (overrides configuration)
    #[arg(long, global = true, env = "GARDEN_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "GARDEN_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Run a specific phase instead of the one the clock picks (day, night)
    #[arg(long, value_name = "PHASE")]
    phase: Option<String>,

    /// Keep running, pulsing at every day/night boundary
    #[arg(long, conflicts_with_all = ["phase", "spawn_helper"])]
    schedule: bool,

    /// Create a helper agent instead of running a pulse
    #[arg(long)]
    spawn_helper: bool,

    /// Name of the helper to spawn
    #[arg(long, value_name = "NAME")]
    helper_name: Option<String>,

    /// Mission of the helper to spawn
    #[arg(long, value_name = "MISSION")]
    helper_mission: Option<String>,

    /// Specialization of the helper to spawn
    #[arg(long, value_name = "SPECIALIZATION")]
    helper_specialization: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Orchestrator backlog operations
    #[command(name = "task")]
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Task { command }) => {
            return commands::task::handle_command(command, cli.config, cli.data_dir).await;
        }
        Some(Commands::Config { command }) => {
            return commands::config::handle_command(command, cli.config).await;
        }
        None => {}
    }

    if cli.spawn_helper {
        let args = match SpawnArgs::from_options(
            cli.helper_name,
            cli.helper_mission,
            cli.helper_specialization,
        ) {
            Ok(args) => args,
            Err(missing) => {
                eprintln!(
                    "{}",
                    format!("--spawn-helper requires {}", missing.join(", ")).red()
                );
                std::process::exit(1);
            }
        };
        return commands::pulse::spawn_helper(args, cli.config, cli.data_dir).await;
    }

    let phase = match cli.phase.as_deref().map(str::parse::<Phase>).transpose() {
        Ok(phase) => phase,
        Err(e) => {
            eprintln!("{}", format!("{}", e).red());
            std::process::exit(1);
        }
    };

    let args = PulseArgs {
        config: cli.config,
        data_dir: cli.data_dir,
        phase,
    };
    if cli.schedule {
        info!("Starting scheduled mode");
        commands::pulse::run_scheduled(args).await
    } else {
        commands::pulse::run_once(args).await
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
