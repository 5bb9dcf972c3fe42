// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Reflection Domain Types
//!
//! Structured self-assessments written by agents after tasks, about skills,
//! and at the end of each day, plus the derived analyses and nightly report.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Reflection records and their human-readable rendering

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentId, Specialization};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReflectionKind {
    Task,
    Daily,
    Skill,
}

impl ReflectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReflectionKind::Task => "task",
            ReflectionKind::Daily => "daily",
            ReflectionKind::Skill => "skill",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReflection {
    pub task_id: String,
    pub task_description: String,
    pub outcome: String,
    pub success: bool,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub learnings: Vec<String>,
    #[serde(default)]
    pub improvement_ideas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillReflection {
    pub skill_name: String,
    /// 1 to 10.
    pub effectiveness: u8,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub improvement_ideas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReflection {
    pub tasks_completed: usize,
    pub tasks_pending: usize,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub learnings: Vec<String>,
    #[serde(default)]
    pub next_day_focus: Vec<String>,
}

/// Type-specific body of a [`Reflection`]; the `type` tag selects the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ReflectionContent {
    Task(TaskReflection),
    Daily(DailyReflection),
    Skill(SkillReflection),
}

impl ReflectionContent {
    pub fn kind(&self) -> ReflectionKind {
        match self {
            ReflectionContent::Task(_) => ReflectionKind::Task,
            ReflectionContent::Daily(_) => ReflectionKind::Daily,
            ReflectionContent::Skill(_) => ReflectionKind::Skill,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    #[serde(flatten)]
    pub content: ReflectionContent,
}

impl Reflection {
    pub fn kind(&self) -> ReflectionKind {
        self.content.kind()
    }

    pub fn as_task(&self) -> Option<&TaskReflection> {
        match &self.content {
            ReflectionContent::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_skill(&self) -> Option<&SkillReflection> {
        match &self.content {
            ReflectionContent::Skill(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPerformance {
    pub total_tasks: usize,
    /// Percentage, 0 to 100.
    pub success_rate: f64,
    pub common_challenges: Vec<String>,
    pub key_learnings: Vec<String>,
    pub improvement_areas: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillEffectiveness {
    pub average_effectiveness: f64,
    pub common_strengths: Vec<String>,
    pub common_weaknesses: Vec<String>,
    pub common_improvement_ideas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementPlan {
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    pub task_success_rate: f64,
    pub skill_effectiveness: BTreeMap<String, f64>,
    pub prioritized_improvements: Vec<String>,
    pub implementation_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightlyReport {
    pub date: NaiveDate,
    pub agent_id: AgentId,
    pub specialization: Option<Specialization>,
    pub tasks_completed: usize,
    /// Fraction, 0 to 1.
    pub success_rate: f64,
    pub key_achievements: Vec<String>,
    pub key_challenges: Vec<String>,
    pub key_learnings: Vec<String>,
    pub improvement_ideas: Vec<String>,
    pub skill_effectiveness: BTreeMap<String, f64>,
    pub improvement_plan: Vec<String>,
    pub next_day_focus: Vec<String>,
}

impl NightlyReport {
    pub fn to_markdown(&self) -> String {
        let specialization = self
            .specialization
            .as_ref()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "General".to_string());

        let mut md = String::new();
        let _ = writeln!(md, "# Nightly Report - {} Agent\n", specialization);
        let _ = writeln!(md, "**Date:** {}\n", self.date);
        let _ = writeln!(md, "**Agent ID:** {}\n", self.agent_id);
        let _ = writeln!(md, "## Performance Summary\n");
        let _ = writeln!(md, "- **Tasks Completed:** {}", self.tasks_completed);
        let _ = writeln!(md, "- **Success Rate:** {:.1}%\n", self.success_rate * 100.0);

        bullet_section(&mut md, "Key Achievements", &self.key_achievements);
        bullet_section(&mut md, "Key Challenges", &self.key_challenges);
        bullet_section(&mut md, "Key Learnings", &self.key_learnings);

        let _ = writeln!(md, "## Skill Effectiveness\n");
        for (skill, score) in &self.skill_effectiveness {
            let _ = writeln!(md, "- **{}:** {:.1}/10", skill, score);
        }
        md.push('\n');

        bullet_section(&mut md, "Improvement Plan", &self.improvement_plan);
        bullet_section(&mut md, "Next Day Focus", &self.next_day_focus);
        md
    }
}

fn bullet_section(md: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(md, "## {}\n", title);
    for item in items {
        let _ = writeln!(md, "- {}", item);
    }
    md.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflection_serializes_with_type_and_content() {
        let reflection = Reflection {
            timestamp: Utc::now(),
            agent_id: AgentId::from("helper_1234abcd"),
            content: ReflectionContent::Skill(SkillReflection {
                skill_name: "research".into(),
                effectiveness: 6,
                strengths: vec![],
                weaknesses: vec!["slow".into()],
                improvement_ideas: vec![],
            }),
        };
        let value = serde_json::to_value(&reflection).unwrap();
        assert_eq!(value["type"], "skill");
        assert_eq!(value["content"]["skill_name"], "research");
        assert_eq!(value["agent_id"], "helper_1234abcd");

        let back: Reflection = serde_json::from_value(value).unwrap();
        assert_eq!(back.kind(), ReflectionKind::Skill);
        assert_eq!(back.as_skill().unwrap().effectiveness, 6);
    }

    #[test]
    fn nightly_report_markdown_has_sections() {
        let report = NightlyReport {
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            agent_id: AgentId::from("helper_00000001"),
            specialization: Some(Specialization::Monitoring),
            tasks_completed: 4,
            success_rate: 0.75,
            key_achievements: vec!["Shipped".into()],
            key_challenges: vec![],
            key_learnings: vec![],
            improvement_ideas: vec![],
            skill_effectiveness: BTreeMap::from([("monitoring".to_string(), 6.5)]),
            improvement_plan: vec![],
            next_day_focus: vec!["Optimize task execution efficiency".into()],
        };
        let md = report.to_markdown();
        assert!(md.starts_with("# Nightly Report - monitoring Agent"));
        assert!(md.contains("- **Success Rate:** 75.0%"));
        assert!(md.contains("- **monitoring:** 6.5/10"));
        assert!(md.contains("## Next Day Focus\n\n- Optimize task execution efficiency"));
    }
}
