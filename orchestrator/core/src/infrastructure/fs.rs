// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Garden Filesystem Layout
//!
//! Every piece of garden state is a discrete JSON file under one data
//! directory:
//!
//! ```text
//! <data_dir>/
//!   agents/<id>/config.json
//!   agents/<id>/tasks/{open,completed,assigned,prioritized}_tasks.json
//!   agents/<id>/memories/*.jsonl
//!   agents/<id>/reflections/*.json|*.md
//!   agents/<id>/knowledge/<category>.json
//!   agents/<id>/outputs/
//!   messages/<id>/<message_id>.json
//!   backups/<id>/<YYYYMMDD_HHMMSS>/
//!   archive/<id>/
//!   perception/cache.json
//! ```
//!
//! Writes go through [`write_json_atomic`]: the payload lands in a sibling
//! temp file which is then renamed over the target, so readers never see a
//! partially written file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use walkdir::WalkDir;

use crate::domain::agent::AgentId;
use crate::domain::repository::StorageError;

#[derive(Debug, Clone)]
pub struct GardenLayout {
    root: PathBuf,
}

impl GardenLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    pub fn agent_dir(&self, id: &AgentId) -> PathBuf {
        self.agents_dir().join(id.as_str())
    }

    pub fn agent_config(&self, id: &AgentId) -> PathBuf {
        self.agent_dir(id).join("config.json")
    }

    pub fn tasks_dir(&self, id: &AgentId) -> PathBuf {
        self.agent_dir(id).join("tasks")
    }

    pub fn memories_dir(&self, id: &AgentId) -> PathBuf {
        self.agent_dir(id).join("memories")
    }

    pub fn reflections_dir(&self, id: &AgentId) -> PathBuf {
        self.agent_dir(id).join("reflections")
    }

    pub fn knowledge_dir(&self, id: &AgentId) -> PathBuf {
        self.agent_dir(id).join("knowledge")
    }

    pub fn outputs_dir(&self, id: &AgentId) -> PathBuf {
        self.agent_dir(id).join("outputs")
    }

    pub fn mailbox_dir(&self, id: &AgentId) -> PathBuf {
        self.root.join("messages").join(id.as_str())
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    pub fn archive_dir(&self, id: &AgentId) -> PathBuf {
        self.root.join("archive").join(id.as_str())
    }

    pub fn perception_cache(&self) -> PathBuf {
        self.root.join("perception").join("cache.json")
    }
}

pub fn ensure_dir(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path).map_err(|e| StorageError::io(path, e))
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| StorageError::serialization(path, e))?;
    write_bytes_atomic(path, &bytes)
}

pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

    fs::write(&tmp, bytes).map_err(|e| StorageError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StorageError::io(path, e)
    })
}

/// `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::serialization(path, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StorageError> {
    Ok(read_json(path)?.unwrap_or_default())
}

/// Files directly inside `dir` with the given extension, sorted by name.
/// A missing directory yields an empty list.
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, StorageError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(dir, e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StorageError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Recursively copy `src` into `dst`, creating `dst` as needed.
/// Returns the number of files copied; a missing `src` copies nothing.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<usize, StorageError> {
    if !src.exists() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| StorageError::io(src, io::Error::from(e)))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| StorageError::io(entry.path(), io::Error::new(io::ErrorKind::Other, e)))?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(entry.path(), &target).map_err(|e| StorageError::io(entry.path(), e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

pub fn remove_dir_if_exists(path: &Path) -> Result<(), StorageError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

/// Total size in bytes of every file under `path`.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}
