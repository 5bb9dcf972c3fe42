// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Reflection Storage and Analysis
//!
//! Reflections are individual JSON files under `agents/<id>/reflections/`
//! named `<YYYY-MM-DD>_<type>_<HHMMSS>_<n>.json`. The same directory also
//! holds the nightly report (`<date>_nightly_report.{json,md}`) and the
//! orchestrator's combined reflection (`<date>_reflection.md`); listing only
//! picks up files whose second name segment is a reflection type.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::agent::{AgentId, Specialization};
use crate::domain::memory::top_by_frequency;
use crate::domain::reflection::{
    DailyReflection, ImprovementPlan, NightlyReport, Reflection, ReflectionContent, ReflectionKind,
    SkillEffectiveness, SkillReflection, TaskPerformance, TaskReflection,
};
use crate::domain::repository::StorageError;
use crate::infrastructure::fs::{
    list_files, read_json, write_bytes_atomic, write_json_atomic, GardenLayout,
};

/// Reflections considered by the analyses.
const ANALYSIS_WINDOW: usize = 50;
/// Average effectiveness below which a skill's ideas enter the improvement plan.
const EFFECTIVENESS_THRESHOLD: f64 = 7.0;

#[derive(Debug, Clone)]
pub struct ReflectionSystem {
    agent_id: AgentId,
    dir: PathBuf,
}

impl ReflectionSystem {
    pub fn new(agent_id: AgentId, dir: impl Into<PathBuf>) -> Self {
        Self {
            agent_id,
            dir: dir.into(),
        }
    }

    pub fn for_agent(layout: &GardenLayout, agent_id: &AgentId) -> Self {
        Self::new(agent_id.clone(), layout.reflections_dir(agent_id))
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    pub fn create(&self, content: ReflectionContent) -> Result<PathBuf, StorageError> {
        let reflection = Reflection {
            timestamp: Utc::now(),
            agent_id: self.agent_id.clone(),
            content,
        };
        let kind = reflection.kind();
        let stem = format!(
            "{}_{}_{}",
            reflection.timestamp.format("%Y-%m-%d"),
            kind.as_str(),
            reflection.timestamp.format("%H%M%S")
        );

        let mut n = 0;
        let path = loop {
            let candidate = self.dir.join(format!("{}_{}.json", stem, n));
            if !candidate.exists() {
                break candidate;
            }
            n += 1;
        };

        write_json_atomic(&path, &reflection)?;
        info!(agent_id = %self.agent_id, kind = kind.as_str(), "Created reflection");
        Ok(path)
    }

    pub fn create_task(&self, reflection: TaskReflection) -> Result<PathBuf, StorageError> {
        self.create(ReflectionContent::Task(reflection))
    }

    /// Effectiveness is clamped into 1..=10.
    pub fn create_skill(&self, mut reflection: SkillReflection) -> Result<PathBuf, StorageError> {
        reflection.effectiveness = reflection.effectiveness.clamp(1, 10);
        self.create(ReflectionContent::Skill(reflection))
    }

    pub fn create_daily(&self, reflection: DailyReflection) -> Result<PathBuf, StorageError> {
        self.create(ReflectionContent::Daily(reflection))
    }

    /// Newest first, after skipping `skip` entries.
    pub fn list(
        &self,
        kind: Option<ReflectionKind>,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Reflection>, StorageError> {
        let mut reflections = Vec::new();
        for path in list_files(&self.dir, "json")? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let Some(file_kind) = kind_from_file_name(&name) else {
                continue;
            };
            if kind.is_some_and(|k| k != file_kind) {
                continue;
            }
            match read_json::<Reflection>(&path) {
                Ok(Some(reflection)) => reflections.push(reflection),
                Ok(None) => {}
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "Skipping unreadable reflection"
                ),
            }
        }
        reflections.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(reflections.into_iter().skip(skip).take(limit).collect())
    }

    pub fn task_reflections(&self, limit: usize) -> Result<Vec<TaskReflection>, StorageError> {
        Ok(self
            .list(Some(ReflectionKind::Task), limit, 0)?
            .iter()
            .filter_map(|r| r.as_task().cloned())
            .collect())
    }

    /// Task reflections written on the same UTC date as `now`.
    pub fn task_reflections_on(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TaskReflection>, StorageError> {
        let today = now.date_naive();
        Ok(self
            .list(Some(ReflectionKind::Task), ANALYSIS_WINDOW, 0)?
            .iter()
            .filter(|r| r.timestamp.date_naive() == today)
            .filter_map(|r| r.as_task().cloned())
            .collect())
    }

    pub fn analyze_task_performance(&self) -> Result<TaskPerformance, StorageError> {
        let reflections = self.task_reflections(ANALYSIS_WINDOW)?;
        if reflections.is_empty() {
            return Ok(TaskPerformance::default());
        }

        let total = reflections.len();
        let successes = reflections.iter().filter(|r| r.success).count();

        Ok(TaskPerformance {
            total_tasks: total,
            success_rate: successes as f64 / total as f64 * 100.0,
            common_challenges: top_by_frequency(
                reflections.iter().flat_map(|r| r.challenges.iter()),
                5,
            ),
            key_learnings: top_by_frequency(reflections.iter().flat_map(|r| r.learnings.iter()), 5),
            improvement_areas: top_by_frequency(
                reflections.iter().flat_map(|r| r.improvement_ideas.iter()),
                5,
            ),
        })
    }

    pub fn analyze_skill_effectiveness(
        &self,
    ) -> Result<BTreeMap<String, SkillEffectiveness>, StorageError> {
        let mut grouped: BTreeMap<String, Vec<SkillReflection>> = BTreeMap::new();
        for reflection in self.list(Some(ReflectionKind::Skill), ANALYSIS_WINDOW, 0)? {
            if let Some(skill) = reflection.as_skill() {
                grouped.entry(skill.skill_name.clone()).or_default().push(skill.clone());
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(name, reflections)| {
                let ratings: Vec<f64> =
                    reflections.iter().map(|r| r.effectiveness as f64).collect();
                let average = ratings.iter().sum::<f64>() / ratings.len() as f64;
                let analysis = SkillEffectiveness {
                    average_effectiveness: average,
                    common_strengths: top_by_frequency(
                        reflections.iter().flat_map(|r| r.strengths.iter()),
                        3,
                    ),
                    common_weaknesses: top_by_frequency(
                        reflections.iter().flat_map(|r| r.weaknesses.iter()),
                        3,
                    ),
                    common_improvement_ideas: top_by_frequency(
                        reflections.iter().flat_map(|r| r.improvement_ideas.iter()),
                        3,
                    ),
                };
                (name, analysis)
            })
            .collect())
    }

    pub fn generate_improvement_plan(&self) -> Result<ImprovementPlan, StorageError> {
        let tasks = self.analyze_task_performance()?;
        let skills = self.analyze_skill_effectiveness()?;

        let mut improvements = tasks.improvement_areas.clone();
        for (name, analysis) in &skills {
            if analysis.average_effectiveness < EFFECTIVENESS_THRESHOLD {
                improvements.extend(
                    analysis
                        .common_improvement_ideas
                        .iter()
                        .map(|idea| format!("Improve {}: {}", name, idea)),
                );
            }
        }
        improvements.truncate(5);

        Ok(ImprovementPlan {
            timestamp: Utc::now(),
            agent_id: self.agent_id.clone(),
            task_success_rate: tasks.success_rate,
            skill_effectiveness: skills
                .iter()
                .map(|(name, a)| (name.clone(), a.average_effectiveness))
                .collect(),
            implementation_steps: improvements.iter().map(|i| format!("Implement {}", i)).collect(),
            prioritized_improvements: improvements,
        })
    }

    /// Build today's report and save it as `<date>_nightly_report.json` and `.md`.
    pub fn generate_nightly_report(
        &self,
        specialization: Option<&Specialization>,
    ) -> Result<NightlyReport, StorageError> {
        let now = Utc::now();
        let today = self.task_reflections_on(now)?;

        let completed = today.len();
        let successes = today.iter().filter(|r| r.success).count();
        let success_rate = if completed > 0 {
            successes as f64 / completed as f64
        } else {
            0.0
        };

        let learnings: Vec<&String> = today.iter().flat_map(|r| r.learnings.iter()).collect();
        let challenges: Vec<&String> = today.iter().flat_map(|r| r.challenges.iter()).collect();
        let ideas: Vec<&String> = today.iter().flat_map(|r| r.improvement_ideas.iter()).collect();

        let plan = self.generate_improvement_plan()?;

        let mut next_day_focus: Vec<String> =
            plan.prioritized_improvements.iter().take(2).cloned().collect();
        next_day_focus.push(
            specialization
                .cloned()
                .unwrap_or_default()
                .next_day_focus()
                .to_string(),
        );
        next_day_focus.push("Optimize task execution efficiency".to_string());

        let report = NightlyReport {
            date: now.date_naive(),
            agent_id: self.agent_id.clone(),
            specialization: specialization.cloned(),
            tasks_completed: completed,
            success_rate,
            key_achievements: top_by_frequency(learnings.iter(), 3),
            key_challenges: top_by_frequency(challenges.iter(), 3),
            key_learnings: top_by_frequency(learnings.iter(), 5),
            improvement_ideas: top_by_frequency(ideas.iter(), 3),
            skill_effectiveness: plan.skill_effectiveness.clone(),
            improvement_plan: plan.prioritized_improvements.clone(),
            next_day_focus,
        };

        let stem = format!("{}_nightly_report", report.date);
        write_json_atomic(&self.dir.join(format!("{}.json", stem)), &report)?;
        self.write_markdown(&format!("{}.md", stem), &report.to_markdown())?;

        info!(agent_id = %self.agent_id, tasks = completed, "Generated nightly report");
        Ok(report)
    }

    /// Write a human-readable rendering next to the reflection records.
    pub fn write_markdown(&self, file_name: &str, body: &str) -> Result<PathBuf, StorageError> {
        let path = self.dir.join(file_name);
        write_bytes_atomic(&path, body.as_bytes())?;
        Ok(path)
    }
}

fn kind_from_file_name(name: &str) -> Option<ReflectionKind> {
    match name.split('_').nth(1)? {
        "task" => Some(ReflectionKind::Task),
        "daily" => Some(ReflectionKind::Daily),
        "skill" => Some(ReflectionKind::Skill),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn system(dir: &TempDir) -> ReflectionSystem {
        ReflectionSystem::new(AgentId::from("helper_0000abcd"), dir.path())
    }

    fn task(
        id: &str,
        success: bool,
        challenges: &[&str],
        learnings: &[&str],
        ideas: &[&str],
    ) -> TaskReflection {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        TaskReflection {
            task_id: id.into(),
            task_description: format!("Task {}", id),
            outcome: "done".into(),
            success,
            challenges: owned(challenges),
            learnings: owned(learnings),
            improvement_ideas: owned(ideas),
        }
    }

    fn skill(name: &str, effectiveness: u8, ideas: &[&str]) -> SkillReflection {
        SkillReflection {
            skill_name: name.into(),
            effectiveness,
            strengths: vec!["fast".into()],
            weaknesses: vec![],
            improvement_ideas: ideas.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn files_do_not_collide_within_a_second() {
        let dir = TempDir::new().unwrap();
        let reflections = system(&dir);
        let a = reflections.create_task(task("task_001", true, &[], &[], &[])).unwrap();
        let b = reflections.create_task(task("task_002", true, &[], &[], &[])).unwrap();
        assert_ne!(a, b);
        assert_eq!(reflections.list(None, 10, 0).unwrap().len(), 2);
    }

    #[test]
    fn list_filters_by_kind_and_ignores_reports() {
        let dir = TempDir::new().unwrap();
        let reflections = system(&dir);
        reflections.create_task(task("task_001", true, &[], &[], &[])).unwrap();
        reflections.create_skill(skill("research", 12, &[])).unwrap();
        reflections
            .write_markdown("2026-01-01_reflection.md", "# Daily Reflection")
            .unwrap();
        std::fs::write(dir.path().join("2026-01-01_nightly_report.json"), "{}").unwrap();

        assert_eq!(reflections.list(Some(ReflectionKind::Task), 10, 0).unwrap().len(), 1);
        let skills = reflections.list(Some(ReflectionKind::Skill), 10, 0).unwrap();
        assert_eq!(skills[0].as_skill().unwrap().effectiveness, 10);
        assert_eq!(reflections.list(None, 10, 1).unwrap().len(), 1);
    }

    #[test]
    fn task_performance_uses_percentages() {
        let dir = TempDir::new().unwrap();
        let reflections = system(&dir);
        assert_eq!(reflections.analyze_task_performance().unwrap().total_tasks, 0);

        reflections
            .create_task(task(
                "task_001",
                true,
                &["flaky source"],
                &["cite early"],
                &["cache sources"],
            ))
            .unwrap();
        reflections
            .create_task(task("task_002", false, &["flaky source"], &[], &[]))
            .unwrap();

        let perf = reflections.analyze_task_performance().unwrap();
        assert_eq!(perf.total_tasks, 2);
        assert_eq!(perf.success_rate, 50.0);
        assert_eq!(perf.common_challenges, vec!["flaky source"]);
        assert_eq!(perf.improvement_areas, vec!["cache sources"]);
    }

    #[test]
    fn improvement_plan_includes_weak_skills_only() {
        let dir = TempDir::new().unwrap();
        let reflections = system(&dir);
        reflections.create_skill(skill("research", 5, &["read more"])).unwrap();
        reflections.create_skill(skill("writing", 9, &["shorter drafts"])).unwrap();

        let plan = reflections.generate_improvement_plan().unwrap();
        assert_eq!(plan.prioritized_improvements, vec!["Improve research: read more"]);
        assert_eq!(plan.implementation_steps, vec!["Implement Improve research: read more"]);
        assert_eq!(plan.skill_effectiveness["writing"], 9.0);
    }

    #[test]
    fn nightly_report_is_saved_in_both_formats() {
        let dir = TempDir::new().unwrap();
        let reflections = system(&dir);
        reflections
            .create_task(task("task_001", true, &[], &["use checklists"], &["batch work"]))
            .unwrap();

        let report = reflections
            .generate_nightly_report(Some(&Specialization::Monitoring))
            .unwrap();
        assert_eq!(report.tasks_completed, 1);
        assert_eq!(report.success_rate, 1.0);
        assert_eq!(report.key_achievements, vec!["use checklists"]);
        assert_eq!(
            report.next_day_focus,
            vec![
                "batch work".to_string(),
                "Enhance pattern recognition and anomaly detection".to_string(),
                "Optimize task execution efficiency".to_string(),
            ]
        );

        let stem = format!("{}_nightly_report", report.date);
        assert!(dir.path().join(format!("{}.json", stem)).exists());
        assert!(dir.path().join(format!("{}.md", stem)).exists());
    }
}
