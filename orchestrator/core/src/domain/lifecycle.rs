// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Helper Lifecycle Types
//!
//! Retirement policy outcomes and the archival summary of a retired helper.
//!
//! ```text
//! Active ──(age ≥ max_days | completed ≥ max_tasks)──▶ RetirementCandidate
//! RetirementCandidate ──(population above cap)──▶ Retired (archived)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentId;

/// Ordering key for retirement candidates; age-based retirements go first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetirementReasonKind {
    Age,
    TaskCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetirementReason {
    Age { age_days: i64, max_days: i64 },
    TaskCount { completed: usize, max_tasks: usize },
}

impl RetirementReason {
    pub fn kind(&self) -> RetirementReasonKind {
        match self {
            RetirementReason::Age { .. } => RetirementReasonKind::Age,
            RetirementReason::TaskCount { .. } => RetirementReasonKind::TaskCount,
        }
    }
}

impl fmt::Display for RetirementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetirementReason::Age { max_days, .. } => {
                write!(f, "Agent has reached maximum age of {} days", max_days)
            }
            RetirementReason::TaskCount { completed, max_tasks } => write!(
                f,
                "Agent has completed {} tasks (threshold: {})",
                completed, max_tasks
            ),
        }
    }
}

/// Result of `LifecycleManager::check_retirement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetirementStatus {
    Active,
    Candidate(RetirementReason),
    /// The agent record could not be found.
    NotFound,
}

impl RetirementStatus {
    pub fn should_retire(&self) -> bool {
        matches!(self, RetirementStatus::Candidate(_))
    }

    pub fn reason(&self) -> Option<&RetirementReason> {
        match self {
            RetirementStatus::Candidate(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for RetirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetirementStatus::Active => f.write_str("Agent is still active"),
            RetirementStatus::Candidate(reason) => reason.fmt(f),
            RetirementStatus::NotFound => f.write_str("Agent not found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeArea {
    pub count: usize,
    pub summary: String,
    pub samples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPattern {
    pub count: usize,
    pub success_rate: f64,
    pub common_challenges: Vec<String>,
}

/// Lossy archival summary of an agent's memory log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedMemorySummary {
    pub agent_id: AgentId,
    pub compression_date: DateTime<Utc>,
    pub knowledge_areas: BTreeMap<String, KnowledgeArea>,
    pub task_patterns: BTreeMap<String, TaskPattern>,
    pub key_learnings: Vec<String>,
    pub specialization_insights: Vec<String>,
}

impl CompressedMemorySummary {
    pub fn empty(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            compression_date: Utc::now(),
            knowledge_areas: BTreeMap::new(),
            task_patterns: BTreeMap::new(),
            key_learnings: Vec::new(),
            specialization_insights: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementMetadata {
    pub agent_id: AgentId,
    pub retirement_date: DateTime<Utc>,
    pub compressed_memory_size: u64,
    pub reason: String,
}

/// Outcome of a single retirement; failures are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RetirementOutcome {
    Retired(RetirementMetadata),
    Failed { error: String },
}

impl RetirementOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RetirementOutcome::Retired(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationReport {
    pub before_count: usize,
    pub after_count: usize,
    pub retired_ids: Vec<AgentId>,
    pub reasons: BTreeMap<AgentId, RetirementReason>,
    /// Candidates whose retirement failed; the sweep continued past them.
    pub failures: BTreeMap<AgentId, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_sorts_before_task_count() {
        let mut reasons = vec![
            RetirementReason::TaskCount { completed: 60, max_tasks: 50 },
            RetirementReason::Age { age_days: 40, max_days: 30 },
        ];
        reasons.sort_by_key(|r| r.kind());
        assert_eq!(reasons[0].kind(), RetirementReasonKind::Age);
    }

    #[test]
    fn status_display_and_flags() {
        let status = RetirementStatus::Candidate(RetirementReason::Age {
            age_days: 31,
            max_days: 30,
        });
        assert!(status.should_retire());
        assert_eq!(status.to_string(), "Agent has reached maximum age of 30 days");
        assert!(!RetirementStatus::Active.should_retire());
        assert!(RetirementStatus::NotFound.reason().is_none());
    }
}
