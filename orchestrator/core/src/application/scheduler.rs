// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Task Scheduler
//!
//! Turns an agent's unordered backlog into a ranked, tiered plan.
//!
//! A task lives in exactly one of the open, completed or assigned
//! collections. The prioritized collection is a snapshot of the last ranking
//! and never owns a task.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Backlog mutation, weighted scoring and daily planning

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::agent::{AgentId, Specialization};
use crate::domain::repository::{StorageError, TaskRepository};
use crate::domain::task::{
    format_duration_minutes, CriteriaOverrides, DailyPlan, NewTask, PrioritizationCriteria,
    Priority, Task, TaskCollection, TaskId, TaskUpdate,
};

#[derive(Clone)]
pub struct TaskScheduler {
    repo: Arc<dyn TaskRepository>,
    agent_id: AgentId,
}

impl TaskScheduler {
    pub fn new(repo: Arc<dyn TaskRepository>, agent_id: AgentId) -> Self {
        Self { repo, agent_id }
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    async fn load(&self, collection: TaskCollection) -> Result<Vec<Task>, StorageError> {
        self.repo.load(&self.agent_id, collection).await
    }

    async fn save(&self, collection: TaskCollection, tasks: &[Task]) -> Result<(), StorageError> {
        self.repo.save(&self.agent_id, collection, tasks).await
    }

    pub async fn open_tasks(&self) -> Result<Vec<Task>, StorageError> {
        self.load(TaskCollection::Open).await
    }

    pub async fn completed_tasks(&self) -> Result<Vec<Task>, StorageError> {
        self.load(TaskCollection::Completed).await
    }

    pub async fn assigned_tasks(&self) -> Result<Vec<Task>, StorageError> {
        self.load(TaskCollection::Assigned).await
    }

    /// One past the highest numeric suffix across open, completed and assigned.
    async fn next_id(&self) -> Result<TaskId, StorageError> {
        let mut max = 0;
        for collection in [
            TaskCollection::Open,
            TaskCollection::Completed,
            TaskCollection::Assigned,
        ] {
            for task in self.load(collection).await? {
                if let Some(n) = task.id.sequence() {
                    max = max.max(n);
                }
            }
        }
        Ok(TaskId::from_sequence(max + 1))
    }

    pub async fn add(&self, new: NewTask) -> Result<Task, StorageError> {
        let task = Task {
            id: self.next_id().await?,
            description: new.description,
            priority: new.priority.unwrap_or_default(),
            due_date: new.due_date,
            tags: new.tags,
            skill_required: new.skill_required,
            estimated_minutes: new.estimated_minutes,
            delegated_to: None,
            specialization: new.specialization,
            parameters: Default::default(),
            created_at: Utc::now(),
            completed_at: None,
            result: None,
        };

        let mut open = self.open_tasks().await?;
        open.push(task.clone());
        self.save(TaskCollection::Open, &open).await?;

        info!(agent_id = %self.agent_id, task_id = %task.id, "Added task");
        Ok(task)
    }

    /// Rank the open backlog, highest score first, and write the ranking back
    /// to the open and prioritized collections.
    pub async fn prioritize(
        &self,
        overrides: Option<CriteriaOverrides>,
    ) -> Result<Vec<Task>, StorageError> {
        let criteria = PrioritizationCriteria::default().merged(overrides.unwrap_or_default());
        self.prioritize_with(&criteria, Utc::now()).await
    }

    pub async fn prioritize_with(
        &self,
        criteria: &PrioritizationCriteria,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, StorageError> {
        let open = self.open_tasks().await?;
        let ranked = rank(open, criteria, now);

        self.save(TaskCollection::Open, &ranked).await?;
        self.save(TaskCollection::Prioritized, &ranked).await?;

        debug!(agent_id = %self.agent_id, count = ranked.len(), "Prioritized backlog");
        Ok(ranked)
    }

    /// Move a task from open (or assigned) to completed. `None` if the id is
    /// in neither collection.
    pub async fn complete(
        &self,
        task_id: &TaskId,
        result: Option<serde_json::Value>,
    ) -> Result<Option<Task>, StorageError> {
        for collection in [TaskCollection::Open, TaskCollection::Assigned] {
            let mut tasks = self.load(collection).await?;
            let Some(pos) = tasks.iter().position(|t| &t.id == task_id) else {
                continue;
            };

            let mut task = tasks.remove(pos);
            task.completed_at = Some(Utc::now());
            task.result = result;

            let mut completed = self.completed_tasks().await?;
            completed.push(task.clone());
            self.save(TaskCollection::Completed, &completed).await?;
            self.save(collection, &tasks).await?;

            info!(agent_id = %self.agent_id, task_id = %task_id, "Completed task");
            return Ok(Some(task));
        }
        Ok(None)
    }

    /// Append a task finished elsewhere to this agent's completed collection.
    pub async fn record_completed(
        &self,
        mut task: Task,
        result: Option<serde_json::Value>,
    ) -> Result<Task, StorageError> {
        task.completed_at = Some(Utc::now());
        task.result = result;
        let mut completed = self.completed_tasks().await?;
        completed.retain(|t| t.id != task.id);
        completed.push(task.clone());
        self.save(TaskCollection::Completed, &completed).await?;
        Ok(task)
    }

    /// Move an open task to the assigned collection under `helper_id`. A
    /// specialization given here replaces the task's own, so the completed
    /// record later shows what the task was delegated as.
    pub async fn assign(
        &self,
        task_id: &TaskId,
        helper_id: &AgentId,
        specialization: Option<Specialization>,
    ) -> Result<Option<Task>, StorageError> {
        let mut open = self.open_tasks().await?;
        let Some(pos) = open.iter().position(|t| &t.id == task_id) else {
            return Ok(None);
        };

        let mut task = open.remove(pos);
        task.delegated_to = Some(helper_id.clone());
        if specialization.is_some() {
            task.specialization = specialization;
        }

        let mut assigned = self.assigned_tasks().await?;
        assigned.push(task.clone());
        self.save(TaskCollection::Assigned, &assigned).await?;
        self.save(TaskCollection::Open, &open).await?;

        info!(
            agent_id = %self.agent_id,
            task_id = %task_id,
            helper_id = %helper_id,
            "Assigned task"
        );
        Ok(Some(task))
    }

    /// Move an assigned task back to open and clear its delegation. `None`
    /// if the id is not assigned.
    pub async fn reopen(&self, task_id: &TaskId) -> Result<Option<Task>, StorageError> {
        let mut assigned = self.assigned_tasks().await?;
        let Some(pos) = assigned.iter().position(|t| &t.id == task_id) else {
            return Ok(None);
        };

        let mut task = assigned.remove(pos);
        task.delegated_to = None;

        let mut open = self.open_tasks().await?;
        open.push(task.clone());
        self.save(TaskCollection::Open, &open).await?;
        self.save(TaskCollection::Assigned, &assigned).await?;

        info!(agent_id = %self.agent_id, task_id = %task_id, "Reopened task");
        Ok(Some(task))
    }

    pub async fn get(&self, task_id: &TaskId) -> Result<Option<Task>, StorageError> {
        Ok(self.open_tasks().await?.into_iter().find(|t| &t.id == task_id))
    }

    pub async fn update(
        &self,
        task_id: &TaskId,
        update: TaskUpdate,
    ) -> Result<Option<Task>, StorageError> {
        let mut open = self.open_tasks().await?;
        let Some(task) = open.iter_mut().find(|t| &t.id == task_id) else {
            return Ok(None);
        };
        update.apply(task);
        let updated = task.clone();
        self.save(TaskCollection::Open, &open).await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, task_id: &TaskId) -> Result<bool, StorageError> {
        let mut open = self.open_tasks().await?;
        let before = open.len();
        open.retain(|t| &t.id != task_id);
        if open.len() == before {
            return Ok(false);
        }
        self.save(TaskCollection::Open, &open).await?;
        Ok(true)
    }

    /// Prioritize, then group by declared priority.
    pub async fn generate_daily_plan(
        &self,
        overrides: Option<CriteriaOverrides>,
    ) -> Result<DailyPlan, StorageError> {
        let ranked = self.prioritize(overrides).await?;
        Ok(build_plan(ranked, Utc::now()))
    }
}

/// Stable descending sort by score; equal scores keep backlog order.
pub fn rank(tasks: Vec<Task>, criteria: &PrioritizationCriteria, now: DateTime<Utc>) -> Vec<Task> {
    let mut scored: Vec<(f64, Task)> = tasks
        .into_iter()
        .map(|t| (criteria.score(&t, now), t))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, t)| t).collect()
}

pub fn build_plan(ranked: Vec<Task>, now: DateTime<Utc>) -> DailyPlan {
    let total_tasks = ranked.len();
    let estimated_minutes: u32 = ranked.iter().map(Task::planned_minutes).sum();

    let mut plan = DailyPlan {
        date: now.date_naive(),
        high_priority_tasks: Vec::new(),
        medium_priority_tasks: Vec::new(),
        low_priority_tasks: Vec::new(),
        total_tasks,
        estimated_minutes,
        estimated_completion_time: format_duration_minutes(estimated_minutes),
    };
    for task in ranked {
        match task.priority {
            Priority::High => plan.high_priority_tasks.push(task),
            Priority::Medium => plan.medium_priority_tasks.push(task),
            Priority::Low => plan.low_priority_tasks.push(task),
        }
    }
    plan
}
