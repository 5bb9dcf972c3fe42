// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent State Backups
//!
//! Snapshots an agent's live state into
//! `backups/<agent_id>/<YYYYMMDD_HHMMSS>/` with a `metadata.json` describing
//! what was copied. Retention is by calendar date: a snapshot whose date
//! prefix is older than `today - retention_days` is deleted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::agent::AgentId;
use crate::domain::repository::StorageError;
use crate::infrastructure::fs::{
    copy_dir, ensure_dir, read_json, remove_dir_if_exists, write_json_atomic, GardenLayout,
};

const METADATA_FILE: &str = "metadata.json";
const CONFIG_FILE: &str = "config.json";
/// Directories copied into and restored from a snapshot.
const STATE_DIRS: [&str; 4] = ["memories", "tasks", "reflections", "knowledge"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// `YYYYMMDD_HHMMSS`, UTC.
    pub timestamp: String,
    pub agent: AgentId,
    pub backup_path: PathBuf,
    pub contents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub timestamp: String,
    pub backup_timestamp: String,
    pub agent: AgentId,
    pub restored_contents: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    layout: GardenLayout,
}

impl BackupManager {
    pub fn new(layout: GardenLayout) -> Self {
        Self { layout }
    }

    pub fn create(&self, agent_id: &AgentId) -> Result<BackupMetadata, StorageError> {
        let agent_dir = self.layout.agent_dir(agent_id);
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();

        let agent_backups = self.layout.backups_dir().join(agent_id.as_str());
        let mut backup_path = agent_backups.join(&timestamp);
        let mut n = 1;
        while backup_path.exists() {
            backup_path = agent_backups.join(format!("{}_{}", timestamp, n));
            n += 1;
        }
        ensure_dir(&backup_path)?;

        let mut contents = Vec::new();
        for name in STATE_DIRS {
            let src = agent_dir.join(name);
            if src.is_dir() {
                copy_dir(&src, &backup_path.join(name))?;
                contents.push(name.to_string());
            }
        }
        let config = agent_dir.join(CONFIG_FILE);
        if config.is_file() {
            fs::copy(&config, backup_path.join(CONFIG_FILE))
                .map_err(|e| StorageError::io(&config, e))?;
            contents.push("config".to_string());
        }

        let metadata = BackupMetadata {
            timestamp,
            agent: agent_id.clone(),
            backup_path: backup_path.clone(),
            contents,
        };
        write_json_atomic(&backup_path.join(METADATA_FILE), &metadata)?;

        info!(agent_id = %agent_id, path = %backup_path.display(), "Created backup");
        Ok(metadata)
    }

    /// Newest first. `None` lists backups of every agent.
    pub fn list(&self, agent_id: Option<&AgentId>) -> Result<Vec<BackupMetadata>, StorageError> {
        let root = self.layout.backups_dir();
        let agent_dirs = match agent_id {
            Some(id) => vec![root.join(id.as_str())],
            None => subdirectories(&root)?,
        };

        let mut backups = Vec::new();
        for agent_dir in agent_dirs {
            for snapshot in subdirectories(&agent_dir)? {
                let path = snapshot.join(METADATA_FILE);
                match read_json::<BackupMetadata>(&path) {
                    Ok(Some(metadata)) => backups.push(metadata),
                    Ok(None) => {}
                    Err(e) => warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable backup metadata"
                    ),
                }
            }
        }
        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(backups)
    }

    /// Replace the agent's live state with the snapshot at `backup_path`.
    /// Directories absent from the snapshot are left untouched.
    pub fn restore(
        &self,
        backup_path: &Path,
        agent_id: &AgentId,
    ) -> Result<RestoreReport, StorageError> {
        let metadata_path = backup_path.join(METADATA_FILE);
        let metadata: BackupMetadata = read_json(&metadata_path)?.ok_or_else(|| {
            StorageError::io(
                &metadata_path,
                io::Error::new(io::ErrorKind::NotFound, "backup metadata not found"),
            )
        })?;

        let agent_dir = self.layout.agent_dir(agent_id);
        for name in STATE_DIRS {
            let src = backup_path.join(name);
            if src.is_dir() {
                let dst = agent_dir.join(name);
                remove_dir_if_exists(&dst)?;
                copy_dir(&src, &dst)?;
            }
        }
        let config = backup_path.join(CONFIG_FILE);
        if config.is_file() {
            ensure_dir(&agent_dir)?;
            fs::copy(&config, agent_dir.join(CONFIG_FILE))
                .map_err(|e| StorageError::io(&config, e))?;
        }

        info!(agent_id = %agent_id, backup = %metadata.timestamp, "Restored backup");
        Ok(RestoreReport {
            timestamp: Utc::now().format("%Y%m%d_%H%M%S").to_string(),
            backup_timestamp: metadata.timestamp,
            agent: metadata.agent,
            restored_contents: metadata.contents,
        })
    }

    /// Delete snapshots older than the retention window; returns how many.
    pub fn cleanup(&self, retention_days: i64) -> Result<usize, StorageError> {
        self.cleanup_at(Utc::now(), retention_days)
    }

    pub fn cleanup_at(
        &self,
        now: DateTime<Utc>,
        retention_days: i64,
    ) -> Result<usize, StorageError> {
        let cutoff = (now - Duration::days(retention_days)).format("%Y%m%d").to_string();

        let mut deleted = 0;
        for agent_dir in subdirectories(&self.layout.backups_dir())? {
            for snapshot in subdirectories(&agent_dir)? {
                let name = snapshot
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let date = name.split('_').next().unwrap_or_default();
                if date < cutoff.as_str() {
                    remove_dir_if_exists(&snapshot)?;
                    deleted += 1;
                    info!(path = %snapshot.display(), "Deleted old backup");
                }
            }
        }
        Ok(deleted)
    }
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(dir, e)),
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StorageError::io(dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
