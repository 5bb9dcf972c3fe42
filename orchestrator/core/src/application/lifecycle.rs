// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Helper Lifecycle Manager
//!
//! Decides when a helper has outlived its usefulness and retires it:
//! memory is compressed into an archival summary, the record and reflections
//! are copied under `archive/<id>/`, and the live directory is removed.
//!
//! Candidates are only retired while the helper population is above
//! `max_active_helpers`, and never more than needed to get back under it.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Retirement policy, memory compression, population sweep

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::domain::agent::{Agent, AgentId};
use crate::domain::config::LifecycleConfig;
use crate::domain::lifecycle::{
    CompressedMemorySummary, KnowledgeArea, PopulationReport, RetirementMetadata, RetirementOutcome,
    RetirementReason, RetirementStatus, TaskPattern,
};
use crate::domain::memory::{category, top_by_frequency, MemoryEntry};
use crate::domain::repository::{AgentRepository, StorageError, TaskRepository};
use crate::domain::task::TaskCollection;
use crate::infrastructure::fs::{copy_dir, dir_size, write_json_atomic, GardenLayout};
use crate::infrastructure::memory::MemorySystem;

const DEFAULT_RETIREMENT_REASON: &str = "Lifecycle management";

pub struct LifecycleManager {
    agents: Arc<dyn AgentRepository>,
    tasks: Arc<dyn TaskRepository>,
    layout: GardenLayout,
    config: LifecycleConfig,
}

impl LifecycleManager {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        tasks: Arc<dyn TaskRepository>,
        layout: GardenLayout,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            agents,
            tasks,
            layout,
            config,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub async fn check_retirement(
        &self,
        agent_id: &AgentId,
    ) -> Result<RetirementStatus, StorageError> {
        self.check_retirement_at(agent_id, Utc::now()).await
    }

    /// Age is checked before completed-task count.
    pub async fn check_retirement_at(
        &self,
        agent_id: &AgentId,
        now: DateTime<Utc>,
    ) -> Result<RetirementStatus, StorageError> {
        let Some(agent) = self.agents.find_by_id(agent_id).await? else {
            return Ok(RetirementStatus::NotFound);
        };

        let age_days = agent.age_days(now);
        if age_days >= self.config.max_days_threshold {
            return Ok(RetirementStatus::Candidate(RetirementReason::Age {
                age_days,
                max_days: self.config.max_days_threshold,
            }));
        }

        let completed = self.tasks.load(agent_id, TaskCollection::Completed).await?.len();
        if completed >= self.config.max_tasks_threshold {
            return Ok(RetirementStatus::Candidate(RetirementReason::TaskCount {
                completed,
                max_tasks: self.config.max_tasks_threshold,
            }));
        }

        Ok(RetirementStatus::Active)
    }

    pub async fn compress_memory(
        &self,
        agent_id: &AgentId,
    ) -> Result<CompressedMemorySummary, StorageError> {
        let entries = MemorySystem::for_agent(&self.layout, agent_id).all()?;
        let agent = self.agents.find_by_id(agent_id).await?;
        Ok(summarize(agent_id.clone(), agent.as_ref(), &entries))
    }

    pub async fn retire(&self, agent_id: &AgentId) -> RetirementOutcome {
        self.retire_with_reason(agent_id, None).await
    }

    /// Archive and remove the agent. Failures come back as
    /// [`RetirementOutcome::Failed`]; this never returns an error.
    pub async fn retire_with_reason(
        &self,
        agent_id: &AgentId,
        reason: Option<&RetirementReason>,
    ) -> RetirementOutcome {
        match self.try_retire(agent_id, reason).await {
            Ok(metadata) => {
                info!(agent_id = %agent_id, reason = %metadata.reason, "Retired agent");
                RetirementOutcome::Retired(metadata)
            }
            Err(e) => {
                error!(agent_id = %agent_id, error = %e, "Failed to retire agent");
                RetirementOutcome::Failed { error: e }
            }
        }
    }

    async fn try_retire(
        &self,
        agent_id: &AgentId,
        reason: Option<&RetirementReason>,
    ) -> Result<RetirementMetadata, String> {
        let agent_dir = self.layout.agent_dir(agent_id);
        if !agent_dir.is_dir() {
            return Err("Agent directory not found".to_string());
        }

        let summary = self.compress_memory(agent_id).await.map_err(|e| e.to_string())?;

        let archive = self.layout.archive_dir(agent_id);
        let summary_path = archive.join("compressed_memory.json");
        write_json_atomic(&summary_path, &summary).map_err(|e| e.to_string())?;

        let config = self.layout.agent_config(agent_id);
        if config.is_file() {
            std::fs::copy(&config, archive.join("config.json")).map_err(|e| e.to_string())?;
        }
        copy_dir(&self.layout.reflections_dir(agent_id), &archive.join("reflections"))
            .map_err(|e| e.to_string())?;

        let metadata = RetirementMetadata {
            agent_id: agent_id.clone(),
            retirement_date: Utc::now(),
            compressed_memory_size: dir_size(&summary_path),
            reason: reason
                .map(ToString::to_string)
                .unwrap_or_else(|| DEFAULT_RETIREMENT_REASON.to_string()),
        };
        write_json_atomic(&archive.join("retirement_metadata.json"), &metadata)
            .map_err(|e| e.to_string())?;

        self.agents.delete(agent_id).await.map_err(|e| e.to_string())?;
        Ok(metadata)
    }

    /// Helpers, optionally only those under `parent_id`, in creation order.
    pub async fn helpers(&self, parent_id: Option<&AgentId>) -> Result<Vec<Agent>, StorageError> {
        Ok(self
            .agents
            .list_all()
            .await?
            .into_iter()
            .filter(|a| a.is_helper())
            .filter(|a| parent_id.is_none() || a.parent_id.as_ref() == parent_id)
            .collect())
    }

    pub async fn manage_population(
        &self,
        parent_id: Option<&AgentId>,
    ) -> Result<PopulationReport, StorageError> {
        self.manage_population_at(parent_id, Utc::now()).await
    }

    pub async fn manage_population_at(
        &self,
        parent_id: Option<&AgentId>,
        now: DateTime<Utc>,
    ) -> Result<PopulationReport, StorageError> {
        let helpers = self.helpers(parent_id).await?;
        let before_count = helpers.len();
        let mut report = PopulationReport {
            before_count,
            after_count: before_count,
            ..Default::default()
        };

        let cap = self.config.max_active_helpers;
        if before_count <= cap {
            return Ok(report);
        }
        let excess = before_count - cap;

        let mut candidates = Vec::new();
        for helper in &helpers {
            match self.check_retirement_at(&helper.id, now).await {
                Ok(RetirementStatus::Candidate(reason)) => {
                    candidates.push((helper.id.clone(), reason))
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        agent_id = %helper.id,
                        error = %e,
                        "Retirement check failed, continuing sweep"
                    );
                    report.failures.insert(helper.id.clone(), e.to_string());
                }
            }
        }
        candidates.sort_by_key(|(_, reason)| reason.kind());

        info!(
            active = before_count,
            cap,
            candidates = candidates.len(),
            "Population above cap, retiring candidates"
        );

        for (id, reason) in candidates {
            if report.retired_ids.len() >= excess {
                break;
            }
            match self.retire_with_reason(&id, Some(&reason)).await {
                RetirementOutcome::Retired(_) => {
                    report.retired_ids.push(id.clone());
                    report.reasons.insert(id, reason);
                }
                RetirementOutcome::Failed { error } => {
                    warn!(agent_id = %id, error = %error, "Retirement failed, continuing sweep");
                    report.failures.insert(id, error);
                }
            }
        }

        report.after_count = before_count - report.retired_ids.len();
        Ok(report)
    }
}

/// Lossy summary of a memory log, grouped by category.
pub fn summarize(
    agent_id: AgentId,
    agent: Option<&Agent>,
    entries: &[MemoryEntry],
) -> CompressedMemorySummary {
    let mut summary = CompressedMemorySummary::empty(agent_id);

    let mut knowledge: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    let mut tasks: BTreeMap<String, Vec<&MemoryEntry>> = BTreeMap::new();
    let mut learnings: Vec<&str> = Vec::new();

    for entry in entries {
        match entry.category.as_str() {
            category::KNOWLEDGE => {
                for tag in &entry.tags {
                    knowledge.entry(tag.clone()).or_default().push(&entry.content);
                }
            }
            category::TASK => {
                let task_type = entry
                    .metadata
                    .task_type
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                tasks.entry(task_type).or_default().push(entry);
            }
            category::REFLECTION => {
                learnings.extend(entry.metadata.learnings.iter().map(String::as_str));
            }
            _ => {}
        }
    }

    summary.knowledge_areas = knowledge
        .into_iter()
        .map(|(tag, contents)| {
            let area = KnowledgeArea {
                count: contents.len(),
                summary: format!("Knowledge about {} based on {} memories", tag, contents.len()),
                samples: contents.iter().take(3).map(|c| c.to_string()).collect(),
            };
            (tag, area)
        })
        .collect();

    summary.task_patterns = tasks
        .into_iter()
        .map(|(task_type, memories)| {
            let successes = memories
                .iter()
                .filter(|m| m.metadata.success == Some(true))
                .count();
            let pattern = TaskPattern {
                count: memories.len(),
                success_rate: successes as f64 / memories.len() as f64,
                common_challenges: top_by_frequency(
                    memories.iter().flat_map(|m| m.metadata.challenges.iter()),
                    3,
                ),
            };
            (task_type, pattern)
        })
        .collect();

    summary.key_learnings = top_by_frequency(learnings, 5);
    summary.specialization_insights = agent
        .map(|a| a.specialization.insights())
        .unwrap_or_default();
    summary
}
