// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! The in-tree `record` skill.
//!
//! Writes the task it receives as a Markdown note under
//! `agents/<id>/outputs/<task_id>.md`, where `<id>` is the helper the task was
//! delegated to, or the owning agent otherwise. It accepts any task that names
//! no skill, or names `record` or one of the built-in specializations.

use std::fmt::Write as _;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::agent::AgentId;
use crate::domain::skill::{Skill, SkillError, SkillOutcome};
use crate::domain::task::Task;
use crate::infrastructure::fs::{write_bytes_atomic, GardenLayout};

pub const RECORD_SKILL: &str = "record";

#[derive(Debug, Clone)]
pub struct RecordSkill {
    layout: GardenLayout,
    owner: AgentId,
}

impl RecordSkill {
    pub fn new(layout: GardenLayout, owner: AgentId) -> Self {
        Self { layout, owner }
    }

    fn render(task: &Task) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# {}\n", task.description);
        let _ = writeln!(md, "- **Task:** {}", task.id);
        let _ = writeln!(md, "- **Priority:** {}", task.priority);
        if let Some(due) = &task.due_date {
            let _ = writeln!(md, "- **Due:** {}", due);
        }
        if let Some(spec) = &task.specialization {
            let _ = writeln!(md, "- **Specialization:** {}", spec);
        }
        if !task.tags.is_empty() {
            let tags: Vec<&str> = task.tags.iter().map(String::as_str).collect();
            let _ = writeln!(md, "- **Tags:** {}", tags.join(", "));
        }
        let _ = writeln!(md, "- **Recorded:** {}", Utc::now().to_rfc3339());

        if !task.parameters.is_empty() {
            let _ = writeln!(md, "\n## Parameters\n");
            for (key, value) in &task.parameters {
                let _ = writeln!(md, "- **{}:** {}", key, value);
            }
        }
        md
    }
}

#[async_trait]
impl Skill for RecordSkill {
    fn name(&self) -> &str {
        RECORD_SKILL
    }

    fn aliases(&self) -> Vec<String> {
        ["research", "content_creation", "monitoring", "general"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn validate(&self, task: &Task) -> bool {
        match task.skill_required.as_deref() {
            None => true,
            Some(required) => {
                required == RECORD_SKILL || self.aliases().iter().any(|a| a == required)
            }
        }
    }

    async fn execute(&self, task: &Task) -> Result<SkillOutcome, SkillError> {
        if !self.validate(task) {
            return Err(SkillError::Unsupported {
                skill: RECORD_SKILL.to_string(),
                task_id: task.id.to_string(),
            });
        }

        let agent = task.delegated_to.as_ref().unwrap_or(&self.owner);
        let path = self
            .layout
            .outputs_dir(agent)
            .join(format!("{}.md", task.id));

        write_bytes_atomic(&path, Self::render(task).as_bytes())
            .map_err(|e| SkillError::execution(RECORD_SKILL, e.to_string()))?;

        let mut outcome =
            SkillOutcome::success(format!("Recorded {} to {}", task.id, path.display()));
        outcome.output = serde_json::json!({ "path": path });
        outcome
            .learnings
            .push(format!("Captured notes for '{}'", task.description));
        Ok(outcome)
    }
}
