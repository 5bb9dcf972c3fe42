// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Memory Domain Types
//!
//! Entries of the append-only memory log and of the categorised knowledge
//! store, plus the frequency ranking used by every summarising component.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::Specialization;

/// Well-known memory categories.
pub mod category {
    pub const KNOWLEDGE: &str = "knowledge";
    pub const TASK: &str = "task";
    pub const REFLECTION: &str = "reflection";
    pub const HELPER_REPORT: &str = "helper_report";
    pub const HELPER_AGENT: &str = "helper_agent";
    pub const RECOMMENDATION: &str = "recommendation";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "MemoryMetadata::is_empty")]
    pub metadata: MemoryMetadata,
}

impl MemoryEntry {
    pub fn has_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|t| self.tags.contains(t))
    }
}

/// Structured details attached to task and reflection memories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub challenges: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub learnings: Vec<String>,
}

impl MemoryMetadata {
    pub fn is_empty(&self) -> bool {
        self.task_type.is_none()
            && self.task_id.is_none()
            && self.success.is_none()
            && self.challenges.is_empty()
            && self.learnings.is_empty()
    }

    pub fn task_outcome(
        task_type: impl Into<String>,
        task_id: impl Into<String>,
        success: bool,
        challenges: Vec<String>,
        learnings: Vec<String>,
    ) -> Self {
        Self {
            task_type: Some(task_type.into()),
            task_id: Some(task_id.into()),
            success: Some(success),
            challenges,
            learnings,
        }
    }
}

/// Filter for `MemorySystem::query`.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuery {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl MemoryQuery {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn matches(&self, entry: &MemoryEntry) -> bool {
        if let Some(category) = &self.category {
            if &entry.category != category {
                return false;
            }
        }
        if !entry.has_tags(&self.tags) {
            return false;
        }
        if self.since.is_some_and(|since| entry.timestamp < since) {
            return false;
        }
        if self.until.is_some_and(|until| entry.timestamp > until) {
            return false;
        }
        true
    }
}

/// Value stored under `knowledge/<category>.json`, keyed by entry id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
    #[serde(default)]
    pub specialization: Option<Specialization>,
}

/// The `limit` most frequent non-empty items, most frequent first.
/// Ties keep the order in which items were first seen.
pub fn top_by_frequency<I, S>(items: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in items {
        let item = item.as_ref();
        if item.is_empty() {
            continue;
        }
        let count = counts.entry(item.to_string()).or_insert(0);
        if *count == 0 {
            order.push(item.to_string());
        }
        *count += 1;
    }
    // sort_by is stable, so equal counts stay in first-seen order
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(limit);
    order
}

/// Order-preserving de-duplication.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_ranking_is_deterministic() {
        let items = ["b", "a", "c", "a", "b", "d", "a", ""];
        assert_eq!(top_by_frequency(items, 3), vec!["a", "b", "c"]);
        assert_eq!(top_by_frequency(Vec::<String>::new(), 3), Vec::<String>::new());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let items = vec!["x".to_string(), "y".into(), "x".into(), "z".into()];
        assert_eq!(dedup_preserving_order(items), vec!["x", "y", "z"]);
    }

    #[test]
    fn empty_metadata_is_not_serialized() {
        let entry = MemoryEntry {
            id: "mem_1".into(),
            timestamp: Utc::now(),
            content: "hello".into(),
            category: category::KNOWLEDGE.into(),
            tags: vec!["garden".into()],
            metadata: MemoryMetadata::default(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("metadata").is_none());
        assert!(MemoryQuery::category("knowledge").with_tag("garden").matches(&entry));
        assert!(!MemoryQuery::category("task").matches(&entry));
    }
}
