// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Skill Port
//!
//! Contract for the external capabilities that actually carry out a task.
//! The orchestration loop only ever sees a [`Skill`] through the
//! `SkillRegistry`; concrete skills live in infrastructure or in the host.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::task::Task;

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("skill '{skill}' failed: {message}")]
    Execution { skill: String, message: String },

    #[error("skill '{skill}' cannot handle task {task_id}")]
    Unsupported { skill: String, task_id: String },
}

impl SkillError {
    pub fn execution(skill: impl Into<String>, message: impl Into<String>) -> Self {
        SkillError::Execution {
            skill: skill.into(),
            message: message.into(),
        }
    }
}

/// What a skill reports back after running a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillOutcome {
    pub success: bool,
    pub summary: String,
    #[serde(default)]
    pub output: serde_json::Value,
    #[serde(default)]
    pub learnings: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
}

impl SkillOutcome {
    pub fn success(summary: impl Into<String>) -> Self {
        Self {
            success: true,
            summary: summary.into(),
            output: serde_json::Value::Null,
            learnings: Vec::new(),
            challenges: Vec::new(),
        }
    }

    pub fn failure(summary: impl Into<String>, challenge: impl Into<String>) -> Self {
        Self {
            success: false,
            summary: summary.into(),
            output: serde_json::Value::Null,
            learnings: Vec::new(),
            challenges: vec![challenge.into()],
        }
    }
}

#[async_trait]
pub trait Skill: Send + Sync {
    fn name(&self) -> &str;

    fn aliases(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether this skill accepts the task. Defaults to a name or alias match
    /// on `skill_required`.
    fn validate(&self, task: &Task) -> bool {
        match task.skill_required.as_deref() {
            Some(required) => {
                required == self.name() || self.aliases().iter().any(|a| a == required)
            }
            None => false,
        }
    }

    async fn execute(&self, task: &Task) -> Result<SkillOutcome, SkillError>;
}
