// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Task Domain Types
//!
//! Backlog entries owned by a single agent, plus the value objects the
//! scheduler works with (criteria, daily plan, partial updates).
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Task records, collections and scoring inputs

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentId, Specialization};

pub const TASK_ID_PREFIX: &str = "task_";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn from_sequence(n: u64) -> Self {
        Self(format!("{}{:03}", TASK_ID_PREFIX, n))
    }

    /// Numeric suffix of a `task_NNN` id, if it has one.
    pub fn sequence(&self) -> Option<u64> {
        self.0
            .strip_prefix(TASK_ID_PREFIX)
            .and_then(|rest| rest.split('_').next())
            .and_then(|n| n.parse().ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Planning estimate used when a task carries no explicit duration.
    pub fn default_minutes(&self) -> u32 {
        match self {
            Priority::High => 60,
            Priority::Medium => 30,
            Priority::Low => 15,
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    /// Kept verbatim; see [`Task::due_at`] for the parsed form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegated_to: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<Specialization>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl Task {
    /// Parsed due date. Accepts RFC 3339, a naive ISO date-time (read as UTC)
    /// or a bare ISO date (midnight UTC).
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_date.as_deref().and_then(parse_due_date)
    }

    pub fn planned_minutes(&self) -> u32 {
        self.estimated_minutes
            .unwrap_or_else(|| self.priority.default_minutes())
    }
}

pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Input to `TaskScheduler::add`; id and creation time are assigned there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub skill_required: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub specialization: Option<Specialization>,
}

impl NewTask {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due: impl Into<String>) -> Self {
        self.due_date = Some(due.into());
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill_required = Some(skill.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimated_minutes = Some(minutes);
        self
    }
}

/// Partial update applied by `TaskScheduler::update`. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub skill_required: Option<String>,
    pub estimated_minutes: Option<u32>,
}

impl TaskUpdate {
    pub fn apply(self, task: &mut Task) {
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due) = self.due_date {
            task.due_date = Some(due);
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(skill) = self.skill_required {
            task.skill_required = Some(skill);
        }
        if let Some(minutes) = self.estimated_minutes {
            task.estimated_minutes = Some(minutes);
        }
    }
}

/// The four per-agent task files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskCollection {
    Open,
    Completed,
    Assigned,
    Prioritized,
}

impl TaskCollection {
    pub fn file_name(&self) -> &'static str {
        match self {
            TaskCollection::Open => "open_tasks.json",
            TaskCollection::Completed => "completed_tasks.json",
            TaskCollection::Assigned => "assigned_tasks.json",
            TaskCollection::Prioritized => "prioritized_tasks.json",
        }
    }
}

/// Scoring weights for `TaskScheduler::prioritize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizationCriteria {
    pub priority_weights: HashMap<String, f64>,
    pub due_date_weight: f64,
    pub creation_date_weight: f64,
    pub tag_weights: HashMap<String, f64>,
}

impl Default for PrioritizationCriteria {
    fn default() -> Self {
        Self {
            priority_weights: HashMap::from([
                ("high".to_string(), 10.0),
                ("medium".to_string(), 5.0),
                ("low".to_string(), 1.0),
            ]),
            due_date_weight: 8.0,
            creation_date_weight: 2.0,
            tag_weights: HashMap::new(),
        }
    }
}

/// Caller-supplied overrides, merged into the defaults key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteriaOverrides {
    #[serde(default)]
    pub priority_weights: HashMap<String, f64>,
    #[serde(default)]
    pub due_date_weight: Option<f64>,
    #[serde(default)]
    pub creation_date_weight: Option<f64>,
    #[serde(default)]
    pub tag_weights: HashMap<String, f64>,
}

impl PrioritizationCriteria {
    pub fn merged(mut self, overrides: CriteriaOverrides) -> Self {
        self.priority_weights.extend(overrides.priority_weights);
        self.tag_weights.extend(overrides.tag_weights);
        if let Some(w) = overrides.due_date_weight {
            self.due_date_weight = w;
        }
        if let Some(w) = overrides.creation_date_weight {
            self.creation_date_weight = w;
        }
        self
    }

    /// Urgency multiplier for the due-date term, from floored days until due.
    pub fn due_factor(days_until_due: i64) -> f64 {
        match days_until_due {
            d if d < 0 => 10.0,
            0 => 8.0,
            1..=2 => 6.0,
            3..=7 => 4.0,
            _ => 2.0,
        }
    }

    pub fn score(&self, task: &Task, now: DateTime<Utc>) -> f64 {
        let mut score = self
            .priority_weights
            .get(task.priority.as_str())
            .copied()
            .unwrap_or(5.0);

        if let Some(due) = task.due_at() {
            let days = (due - now).num_seconds().div_euclid(86_400);
            score += self.due_date_weight * Self::due_factor(days);
        }

        let age_days = (now - task.created_at)
            .num_seconds()
            .div_euclid(86_400)
            .clamp(0, 10);
        score += self.creation_date_weight * age_days as f64 / 10.0;

        score += task
            .tags
            .iter()
            .map(|tag| self.tag_weights.get(tag).copied().unwrap_or(0.0))
            .sum::<f64>();

        score
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPlan {
    pub date: NaiveDate,
    pub high_priority_tasks: Vec<Task>,
    pub medium_priority_tasks: Vec<Task>,
    pub low_priority_tasks: Vec<Task>,
    pub total_tasks: usize,
    pub estimated_minutes: u32,
    pub estimated_completion_time: String,
}

impl DailyPlan {
    /// All tiers in execution order: high, then medium, then low.
    pub fn ordered_tasks(&self) -> impl Iterator<Item = &Task> {
        self.high_priority_tasks
            .iter()
            .chain(self.medium_priority_tasks.iter())
            .chain(self.low_priority_tasks.iter())
    }
}

pub fn format_duration_minutes(total: u32) -> String {
    let hours = total / 60;
    let minutes = total % 60;
    if hours > 0 {
        format!("{} hours {} minutes", hours, minutes)
    } else {
        format!("{} minutes", minutes)
    }
}
