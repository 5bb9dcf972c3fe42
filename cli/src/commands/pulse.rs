// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pulse commands
//!
//! Single pulse, scheduled pulsing and helper spawning.

use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use garden_core::domain::agent::Specialization;
use garden_core::domain::phase::Phase;
use garden_core::infrastructure::event_bus::{EventBusError, EventReceiver};
use garden_swarm::application::pulse::next_phase_boundary;
use garden_swarm::application::{GardenContext, Orchestrator, PulseReport};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::load_config;

pub struct PulseArgs {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub phase: Option<Phase>,
}

#[derive(Debug, PartialEq)]
pub struct SpawnArgs {
    pub name: String,
    pub mission: String,
    pub specialization: Specialization,
}

impl SpawnArgs {
    /// All three helper options are required. On failure returns the flags
    /// that were missing.
    pub fn from_options(
        name: Option<String>,
        mission: Option<String>,
        specialization: Option<String>,
    ) -> Result<Self, Vec<&'static str>> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (non_empty(name), non_empty(mission), non_empty(specialization)) {
            (Some(name), Some(mission), Some(specialization)) => Ok(Self {
                name,
                mission,
                specialization: Specialization::from(specialization),
            }),
            (name, mission, specialization) => {
                let mut missing = Vec::new();
                if name.is_none() {
                    missing.push("--helper-name");
                }
                if mission.is_none() {
                    missing.push("--helper-mission");
                }
                if specialization.is_none() {
                    missing.push("--helper-specialization");
                }
                Err(missing)
            }
        }
    }
}

fn orchestrator(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Orchestrator> {
    let spec = load_config(config, data_dir)?;
    info!(data_dir = %spec.data_dir.display(), "Agent garden starting");
    Ok(Orchestrator::new(Arc::new(GardenContext::new(spec))))
}

pub async fn run_once(args: PulseArgs) -> Result<()> {
    let orch = orchestrator(args.config, args.data_dir)?;
    let report = orch.run_pulse(args.phase).await?;
    print_report(&report);
    Ok(())
}

/// Pulse now, then at every phase boundary, until Ctrl-C.
pub async fn run_scheduled(args: PulseArgs) -> Result<()> {
    let orch = orchestrator(args.config, args.data_dir)?;
    let ctx = orch.context();
    let event_logger = spawn_event_logger(ctx.events.subscribe());
    ctx.start_background();

    let outcome = loop {
        match orch.run_pulse(None).await {
            Ok(report) => print_report(&report),
            Err(e) => error!(error = %e, "Pulse failed"),
        }

        let now = Utc::now();
        let pulse = &ctx.config.pulse;
        let next = next_phase_boundary(now, pulse.day_start_hour, pulse.night_start_hour);
        let wait = (next - now).to_std().unwrap_or_default();
        info!(next = %next, "Waiting for next phase");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            signal = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break signal.context("Failed to listen for shutdown signal");
            }
        }
    };

    ctx.shutdown().await;
    event_logger.abort();
    outcome
}

/// Log every garden event until the bus closes.
fn spawn_event_logger(mut events: EventReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(event = ?event, "Garden event"),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    })
}

pub async fn spawn_helper(
    args: SpawnArgs,
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let orch = orchestrator(config, data_dir)?;
    orch.ensure_orchestrator().await?;
    let (id, helper) = orch
        .spawn_helper(&args.name, &args.mission, args.specialization)
        .await
        .context("Failed to spawn helper agent")?;

    println!(
        "{}",
        format!("✓ Created helper {} ({})", helper.name, id).green()
    );
    println!("  Specialization: {}", helper.specialization);
    println!("  Mission: {}", helper.mission);
    Ok(())
}

fn print_report(report: &PulseReport) {
    match report {
        PulseReport::Day(day) => {
            println!("{}", "Day pulse complete".bold());
            println!("  Messages read: {}", day.messages_processed);
            println!("  Helper tasks processed: {}", day.helper_tasks_processed);
            println!(
                "  Planned: {} ({} high, {} medium, {} low), est. {}",
                day.plan.total_tasks,
                day.plan.high_priority_tasks.len(),
                day.plan.medium_priority_tasks.len(),
                day.plan.low_priority_tasks.len(),
                day.plan.estimated_completion_time
            );
            for (task, helper) in &day.delegated {
                println!("  {} {} -> {}", "delegated".cyan(), task, helper);
            }
            for task in &day.completed {
                println!("  {} {}", "completed".green(), task);
            }
            for task in &day.failed {
                println!("  {} {}", "failed".red(), task);
            }
            for task in &day.skipped {
                println!("  {} {}", "skipped".yellow(), task);
            }
        }
        PulseReport::Night(night) => {
            println!("{}", "Night pulse complete".bold());
            println!("  Messages read: {}", night.messages_processed);
            println!("  Perception sources: {}", night.perception_sources.len());
            println!("  Helper reports: {}", night.helper_reports.len());
            println!("  Reflection: {}", night.reflection_path.display());
            match &night.backup {
                Some(backup) => println!("  Backup: {}", backup.backup_path.display()),
                None => println!("  Backup: {}", "failed".red()),
            }
            println!("  Old backups removed: {}", night.backups_removed);
            println!(
                "  Population: {} -> {}",
                night.population.before_count, night.population.after_count
            );
            for id in &night.population.retired_ids {
                println!("  {} {}", "retired".yellow(), id);
            }
            for skill in &night.recommendations {
                println!("  {} {} helper", "recommend".cyan(), skill);
            }
        }
    }
}
