// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use garden_core::domain::config::GardenConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./garden-config.yaml)
        #[arg(short, long, default_value = "./garden-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = GardenConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. GARDEN_CONFIG_PATH: {}",
            std::env::var("GARDEN_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./garden-config.yaml");
        println!("  4. ~/.garden/config.yaml");
        println!("  5. /etc/garden/config.yaml");
        println!();
    }

    let spec = &config.spec;
    println!("{}", "Current configuration:".bold());
    println!("  Data directory: {}", spec.data_dir.display());
    println!();

    println!("{}", "Orchestrator:".bold());
    println!("  ID: {}", spec.orchestrator.id);
    println!("  Name: {}", spec.orchestrator.name);
    println!("  Mission: {}", spec.orchestrator.mission);
    println!();

    println!("{}", "Pulse (UTC):".bold());
    println!("  Day starts: {:02}:00", spec.pulse.day_start_hour);
    println!("  Night starts: {:02}:00", spec.pulse.night_start_hour);
    println!();

    println!("{}", "Lifecycle:".bold());
    println!("  Max active helpers: {}", spec.lifecycle.max_active_helpers);
    println!("  Retire after tasks: {}", spec.lifecycle.max_tasks_threshold);
    println!("  Retire after days: {}", spec.lifecycle.max_days_threshold);
    println!("  Backup retention days: {}", spec.backups.retention_days);
    println!(
        "  Helper recommendation threshold: {}",
        spec.helpers.recommendation_threshold
    );
    println!();

    println!("{}", "Perception:".bold());
    println!(
        "  Polling: {} (every {}s)",
        if spec.perception.enabled { "enabled".green() } else { "disabled".yellow() },
        spec.perception.interval_seconds
    );
    for source in &spec.perception.sources {
        println!(
            "  {} {} (every {} min)",
            source.name.bold(),
            source.path.display(),
            source.frequency_minutes
        );
    }
    println!();

    println!("{}", "Notifications:".bold());
    println!("  Recipient: {}", spec.notifications.recipient);

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = GardenConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
