// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent Memory Storage
//!
//! Two stores live under each agent directory:
//!
//! - [`MemorySystem`]: append-only JSON Lines log (`memories/memory.jsonl`).
//!   Every `*.jsonl` file in the directory is read, so rotated logs stay
//!   queryable.
//! - [`KnowledgeStore`]: categorised documents (`knowledge/<category>.json`),
//!   each a map of entry id to [`KnowledgeEntry`].

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::agent::{AgentId, Specialization};
use crate::domain::memory::{KnowledgeEntry, MemoryEntry, MemoryMetadata, MemoryQuery};
use crate::domain::repository::StorageError;
use crate::infrastructure::fs::{
    ensure_dir, list_files, read_json_or_default, write_json_atomic, GardenLayout,
};

const MEMORY_LOG: &str = "memory.jsonl";
const DEFAULT_QUERY_LIMIT: usize = 100;

fn short_hex() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[derive(Debug, Clone)]
pub struct MemorySystem {
    dir: PathBuf,
}

impl MemorySystem {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_agent(layout: &GardenLayout, agent_id: &AgentId) -> Self {
        Self::new(layout.memories_dir(agent_id))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append a new entry to the log and return it.
    pub fn add(
        &self,
        content: impl Into<String>,
        category: impl Into<String>,
        tags: Vec<String>,
        metadata: MemoryMetadata,
    ) -> Result<MemoryEntry, StorageError> {
        let now = Utc::now();
        let entry = MemoryEntry {
            id: format!("mem_{}_{}", now.format("%Y%m%d%H%M%S"), short_hex()),
            timestamp: now,
            content: content.into(),
            category: category.into(),
            tags,
            metadata,
        };

        ensure_dir(&self.dir)?;
        let path = self.dir.join(MEMORY_LOG);
        let mut line =
            serde_json::to_string(&entry).map_err(|e| StorageError::serialization(&path, e))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| StorageError::io(&path, e))?;

        debug!(memory_id = %entry.id, category = %entry.category, "Stored memory");
        Ok(entry)
    }

    /// Every entry across all log files, oldest first.
    /// Lines that fail to decode are skipped with a warning.
    pub fn all(&self) -> Result<Vec<MemoryEntry>, StorageError> {
        let mut entries = Vec::new();
        for path in list_files(&self.dir, "jsonl")? {
            let raw = fs::read_to_string(&path).map_err(|e| StorageError::io(&path, e))?;
            for (n, line) in raw.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<MemoryEntry>(line) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => warn!(
                        path = %path.display(),
                        line = n + 1,
                        error = %e,
                        "Skipping undecodable memory entry"
                    ),
                }
            }
        }
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    /// Matching entries in log order, oldest first, capped at the query limit
    /// (100 when unset).
    pub fn query(&self, query: &MemoryQuery) -> Result<Vec<MemoryEntry>, StorageError> {
        let limit = query.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        Ok(self
            .all()?
            .into_iter()
            .filter(|e| query.matches(e))
            .take(limit)
            .collect())
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<MemoryEntry>, StorageError> {
        let mut entries = self.all()?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}

#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    dir: PathBuf,
}

impl KnowledgeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_agent(layout: &GardenLayout, agent_id: &AgentId) -> Self {
        Self::new(layout.knowledge_dir(agent_id))
    }

    fn category_path(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{}.json", category))
    }

    /// Add `data` under `category` and return the new entry id.
    pub fn store(
        &self,
        category: &str,
        data: serde_json::Value,
        specialization: Option<Specialization>,
    ) -> Result<String, StorageError> {
        let path = self.category_path(category);
        let mut entries: BTreeMap<String, KnowledgeEntry> = read_json_or_default(&path)?;

        let now = Utc::now();
        let id = format!("{}_{}_{}", category, now.format("%Y%m%d%H%M%S"), short_hex());
        entries.insert(
            id.clone(),
            KnowledgeEntry {
                timestamp: now,
                data,
                specialization,
            },
        );
        write_json_atomic(&path, &entries)?;
        Ok(id)
    }

    pub fn entries(
        &self,
        category: &str,
    ) -> Result<BTreeMap<String, KnowledgeEntry>, StorageError> {
        read_json_or_default(&self.category_path(category))
    }

    pub fn categories(&self) -> Result<Vec<String>, StorageError> {
        Ok(list_files(&self.dir, "json")?
            .into_iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::memory::category;
    use tempfile::TempDir;

    #[test]
    fn add_and_query_memories() {
        let dir = TempDir::new().unwrap();
        let memory = MemorySystem::new(dir.path().join("memories"));

        let first = memory
            .add(
                "Rust ownership",
                category::KNOWLEDGE,
                vec!["rust".into()],
                MemoryMetadata::default(),
            )
            .unwrap();
        assert!(first.id.starts_with("mem_"));
        assert_eq!(first.id.len(), "mem_".len() + 14 + 1 + 8);

        memory
            .add("Finished task", category::TASK, vec!["task".into()], MemoryMetadata::default())
            .unwrap();

        assert_eq!(memory.all().unwrap().len(), 2);
        let knowledge = memory.query(&MemoryQuery::category(category::KNOWLEDGE)).unwrap();
        assert_eq!(knowledge.len(), 1);
        assert_eq!(knowledge[0].content, "Rust ownership");

        let recent = memory.recent(1).unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn reads_every_jsonl_file_and_skips_bad_lines() {
        let dir = TempDir::new().unwrap();
        let memory = MemorySystem::new(dir.path());
        memory
            .add("live", category::KNOWLEDGE, vec![], MemoryMetadata::default())
            .unwrap();

        let rotated = MemoryEntry {
            id: "mem_old".into(),
            timestamp: Utc::now() - chrono::Duration::days(3),
            content: "rotated".into(),
            category: category::KNOWLEDGE.into(),
            tags: vec![],
            metadata: MemoryMetadata::default(),
        };
        let body = format!("{}\nnot json\n\n", serde_json::to_string(&rotated).unwrap());
        fs::write(dir.path().join("2025.jsonl"), body).unwrap();

        let all = memory.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "rotated");
        assert_eq!(memory.recent(10).unwrap()[0].content, "live");
    }

    #[test]
    fn empty_log_is_empty() {
        let dir = TempDir::new().unwrap();
        let memory = MemorySystem::new(dir.path().join("never-created"));
        assert!(memory.all().unwrap().is_empty());
        assert!(memory.recent(5).unwrap().is_empty());
    }

    #[test]
    fn knowledge_entries_are_grouped_by_category() {
        let dir = TempDir::new().unwrap();
        let store = KnowledgeStore::new(dir.path());

        let id = store
            .store("research", serde_json::json!({"topic": "soil"}), Some(Specialization::Research))
            .unwrap();
        store.store("research", serde_json::json!({"topic": "rain"}), None).unwrap();
        store.store("monitoring", serde_json::json!(1), None).unwrap();

        let research = store.entries("research").unwrap();
        assert_eq!(research.len(), 2);
        assert_eq!(research[&id].data["topic"], "soil");
        assert_eq!(store.categories().unwrap(), vec!["monitoring", "research"]);
        assert!(store.entries("absent").unwrap().is_empty());
    }
}
