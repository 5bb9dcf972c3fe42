// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the garden CLI

pub mod config;
pub mod pulse;
pub mod task;

pub use self::config::ConfigCommand;
pub use self::pulse::{PulseArgs, SpawnArgs};
pub use self::task::TaskCommand;

use anyhow::{Context, Result};
use garden_core::domain::config::{GardenConfigManifest, GardenConfigSpec};
use std::path::PathBuf;

/// Discover, override and validate the configuration. `--data-dir` wins
/// over both the file and the environment.
pub fn load_config(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<GardenConfigSpec> {
    let mut manifest =
        GardenConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    if let Some(dir) = data_dir {
        manifest.spec.data_dir = dir;
    }
    manifest.validate().context("Configuration validation failed")?;
    Ok(manifest.spec)
}
