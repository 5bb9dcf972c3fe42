// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Instances
//!
//! Runtime handles reconstructed from persisted agent records. The
//! orchestrator loads as [`AgentInstance::Base`]; any agent with a parent
//! loads as [`AgentInstance::Helper`], which also carries its reflection
//! system and the skill bound to its specialization.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Helper task processing and end-of-day reporting

use std::sync::Arc;

use chrono::Utc;
use garden_core::application::{SkillRegistry, TaskScheduler};
use garden_core::domain::agent::{Agent, AgentId, Specialization};
use garden_core::domain::events::GardenEvent;
use garden_core::domain::memory::{
    category, dedup_preserving_order, top_by_frequency, MemoryMetadata,
};
use garden_core::domain::reflection::{
    DailyReflection, ImprovementPlan, NightlyReport, SkillReflection, TaskReflection,
};
use garden_core::domain::repository::StorageError;
use garden_core::domain::skill::{Skill, SkillOutcome};
use garden_core::domain::task::Task;
use garden_core::infrastructure::event_bus::EventBus;
use garden_core::infrastructure::memory::{KnowledgeStore, MemorySystem};
use garden_core::infrastructure::reflection::ReflectionSystem;
use serde_json::json;
use tracing::{info, warn};

use crate::application::message_bus::MessageBus;
use crate::domain::message::{Message, MessageKind};

/// The orchestrator, or any agent without a parent.
pub struct BaseAgent {
    pub agent: Agent,
    pub scheduler: TaskScheduler,
    pub memory: MemorySystem,
}

pub struct HelperAgent {
    pub agent: Agent,
    pub scheduler: TaskScheduler,
    pub memory: MemorySystem,
    pub knowledge: KnowledgeStore,
    pub reflections: ReflectionSystem,
    /// Skill named after the helper's specialization, if one is registered.
    pub skill: Option<Arc<dyn Skill>>,
    pub skills: Arc<SkillRegistry>,
    pub events: EventBus,
}

pub enum AgentInstance {
    Base(BaseAgent),
    Helper(HelperAgent),
}

impl AgentInstance {
    pub fn agent(&self) -> &Agent {
        match self {
            AgentInstance::Base(base) => &base.agent,
            AgentInstance::Helper(helper) => &helper.agent,
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.agent().id
    }

    pub fn as_helper(&self) -> Option<&HelperAgent> {
        match self {
            AgentInstance::Helper(helper) => Some(helper),
            AgentInstance::Base(_) => None,
        }
    }
}

/// What happened to a task handed to a helper.
#[derive(Debug, Clone)]
pub enum HelperTaskOutcome {
    Completed(SkillOutcome),
    Failed { error: String },
}

impl HelperTaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, HelperTaskOutcome::Completed(_))
    }
}

impl HelperAgent {
    pub fn id(&self) -> &AgentId {
        &self.agent.id
    }

    pub fn specialization(&self) -> &Specialization {
        &self.agent.specialization
    }

    fn parent_id(&self) -> AgentId {
        self.agent
            .parent_id
            .clone()
            .unwrap_or_else(|| self.agent.id.clone())
    }

    /// Run `task` with the specialization skill, falling back to registry
    /// lookup, and report the result to the parent.
    ///
    /// Skill failures are recorded and reported, not returned. Only storage
    /// failures surface as errors.
    pub async fn process_task(
        &self,
        task: &Task,
        bus: &MessageBus,
    ) -> Result<HelperTaskOutcome, StorageError> {
        let skill = self
            .skill
            .clone()
            .or_else(|| self.skills.find_skill_for(task));

        let outcome = match skill {
            None => HelperTaskOutcome::Failed {
                error: format!("No skill available for task {}", task.id),
            },
            Some(skill) => {
                info!(
                    helper_id = %self.agent.id,
                    task_id = %task.id,
                    skill = skill.name(),
                    "Helper executing task"
                );
                match skill.execute(task).await {
                    Ok(result) if result.success => HelperTaskOutcome::Completed(result),
                    Ok(result) => HelperTaskOutcome::Failed {
                        error: result
                            .challenges
                            .first()
                            .cloned()
                            .unwrap_or(result.summary),
                    },
                    Err(e) => HelperTaskOutcome::Failed { error: e.to_string() },
                }
            }
        };

        match &outcome {
            HelperTaskOutcome::Completed(result) => self.record_success(task, result, bus).await?,
            HelperTaskOutcome::Failed { error } => self.record_failure(task, error, bus).await?,
        }
        Ok(outcome)
    }

    async fn record_success(
        &self,
        task: &Task,
        result: &SkillOutcome,
        bus: &MessageBus,
    ) -> Result<(), StorageError> {
        let spec = self.specialization().as_str().to_string();

        self.scheduler
            .record_completed(task.clone(), Some(result.output.clone()))
            .await?;

        self.reflections.create_task(TaskReflection {
            task_id: task.id.to_string(),
            task_description: task.description.clone(),
            outcome: result.summary.clone(),
            success: true,
            challenges: result.challenges.clone(),
            learnings: result.learnings.clone(),
            improvement_ideas: Vec::new(),
        })?;
        self.reflections.create_skill(SkillReflection {
            skill_name: spec.clone(),
            effectiveness: 8,
            strengths: result.learnings.clone(),
            weaknesses: result.challenges.clone(),
            improvement_ideas: Vec::new(),
        })?;

        self.memory.add(
            format!("Completed task {}: {}", task.id, task.description),
            category::TASK,
            vec![spec.clone(), "task_completion".to_string()],
            MemoryMetadata::task_outcome(
                spec.clone(),
                task.id.to_string(),
                true,
                result.challenges.clone(),
                result.learnings.clone(),
            ),
        )?;

        self.knowledge.store(
            &spec,
            json!({
                "task_id": task.id,
                "description": task.description,
                "summary": result.summary,
                "output": result.output,
            }),
            Some(self.specialization().clone()),
        )?;

        bus.send(Message::new(
            self.agent.id.clone(),
            self.parent_id(),
            format!("Completed task: {}", task.description),
            format!("I have completed task {}: {}", task.id, result.summary),
            MessageKind::TaskCompletion {
                task_id: task.id.clone(),
            },
        ))
        .await?;

        metrics::counter!("garden_tasks_completed_total", "agent" => "helper").increment(1);
        self.events.publish(GardenEvent::TaskCompleted {
            agent_id: self.agent.id.clone(),
            task_id: task.id.clone(),
            completed_at: Utc::now(),
        });
        Ok(())
    }

    async fn record_failure(
        &self,
        task: &Task,
        error: &str,
        bus: &MessageBus,
    ) -> Result<(), StorageError> {
        let spec = self.specialization().as_str().to_string();
        warn!(helper_id = %self.agent.id, task_id = %task.id, error, "Helper task failed");

        self.reflections.create_task(TaskReflection {
            task_id: task.id.to_string(),
            task_description: task.description.clone(),
            outcome: format!("Failed: {}", error),
            success: false,
            challenges: vec![error.to_string()],
            learnings: Vec::new(),
            improvement_ideas: vec![format!("Review approach for {} tasks", spec)],
        })?;
        self.reflections.create_skill(SkillReflection {
            skill_name: spec.clone(),
            effectiveness: 4,
            strengths: Vec::new(),
            weaknesses: vec![error.to_string()],
            improvement_ideas: vec![format!("Handle failures like: {}", error)],
        })?;

        self.memory.add(
            format!("Failed task {}: {}", task.id, task.description),
            category::TASK,
            vec![spec.clone(), "task_failure".to_string()],
            MemoryMetadata::task_outcome(
                spec,
                task.id.to_string(),
                false,
                vec![error.to_string()],
                Vec::new(),
            ),
        )?;

        bus.send(Message::new(
            self.agent.id.clone(),
            self.parent_id(),
            format!("Error processing task: {}", task.description),
            format!("Error: {}", error),
            MessageKind::Error {
                task_id: Some(task.id.clone()),
            },
        ))
        .await?;

        metrics::counter!("garden_tasks_failed_total", "agent" => "helper").increment(1);
        self.events.publish(GardenEvent::TaskFailed {
            agent_id: self.agent.id.clone(),
            task_id: task.id.clone(),
            error: error.to_string(),
            failed_at: Utc::now(),
        });
        Ok(())
    }

    /// Summarize today from the task store and today's task reflections, and
    /// persist it as a daily reflection.
    pub async fn create_daily_reflection(&self) -> Result<DailyReflection, StorageError> {
        let pending = self.scheduler.open_tasks().await?.len();
        let completed = self.scheduler.completed_tasks().await?.len();
        let today = self.reflections.task_reflections_on(Utc::now())?;

        let achievements = dedup_preserving_order(
            today
                .iter()
                .filter(|r| r.success)
                .map(|r| format!("Completed: {}", r.task_description))
                .collect(),
        );
        let challenges =
            dedup_preserving_order(today.iter().flat_map(|r| r.challenges.clone()).collect());
        let learnings =
            dedup_preserving_order(today.iter().flat_map(|r| r.learnings.clone()).collect());

        let mut next_day_focus =
            top_by_frequency(today.iter().flat_map(|r| r.improvement_ideas.iter()), 2);
        next_day_focus.push(self.specialization().next_day_focus().to_string());

        let daily = DailyReflection {
            tasks_completed: completed,
            tasks_pending: pending,
            achievements,
            challenges,
            learnings,
            next_day_focus,
        };
        self.reflections.create_daily(daily.clone())?;

        // Compressed into key learnings when the helper retires
        self.memory.add(
            format!(
                "Daily reflection: {} tasks completed, {} pending",
                daily.tasks_completed, daily.tasks_pending
            ),
            category::REFLECTION,
            vec![self.specialization().as_str().to_string(), "daily_reflection".to_string()],
            MemoryMetadata {
                learnings: daily.learnings.clone(),
                ..Default::default()
            },
        )?;
        Ok(daily)
    }

    pub fn generate_improvement_plan(&self) -> Result<ImprovementPlan, StorageError> {
        self.reflections.generate_improvement_plan()
    }

    pub fn generate_nightly_report(&self) -> Result<NightlyReport, StorageError> {
        self.reflections
            .generate_nightly_report(Some(self.specialization()))
    }
}
