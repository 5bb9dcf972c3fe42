// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Nightly Reflection Synthesis
//!
//! Renders the orchestrator's combined end-of-day reflection from perception
//! data, recent memories, helper reports and the backlog counts.

use std::fmt::Write as _;

use chrono::NaiveDate;
use garden_core::domain::agent::{AgentId, Specialization};
use garden_core::domain::memory::{dedup_preserving_order, top_by_frequency, MemoryEntry};
use garden_core::domain::perception::PerceptionSnapshot;
use garden_core::domain::reflection::{DailyReflection, ImprovementPlan, NightlyReport};
use serde_json::Value;

const DEFAULT_IMPROVEMENTS: &[&str] = &[
    "Develop more sophisticated task prioritization",
    "Improve coordination with helper agents",
    "Enhance perception analysis capabilities",
];

const DEFAULT_FOCUS: &[&str] = &[
    "Optimize task delegation to specialized helper agents",
    "Enhance coordination and knowledge sharing between agents",
];

/// End-of-day material collected from one helper.
#[derive(Debug, Clone)]
pub struct HelperReport {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub specialization: Specialization,
    pub report: NightlyReport,
    pub daily: Option<DailyReflection>,
    pub improvement_plan: Option<ImprovementPlan>,
}

pub struct SynthesisInput<'a> {
    pub date: NaiveDate,
    pub perceptions: &'a PerceptionSnapshot,
    /// Newest first.
    pub recent_memories: &'a [MemoryEntry],
    pub helper_reports: &'a [HelperReport],
    pub open_tasks: usize,
    pub completed_tasks: usize,
}

/// Rendered reflection plus the aggregates that went into it.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub markdown: String,
    pub common_achievements: Vec<String>,
    pub common_challenges: Vec<String>,
    pub common_learnings: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub focus: Vec<String>,
}

impl Synthesis {
    /// Daily reflection record for the orchestrator.
    pub fn to_daily_reflection(&self, input: &SynthesisInput<'_>) -> DailyReflection {
        DailyReflection {
            tasks_completed: input.completed_tasks,
            tasks_pending: input.open_tasks,
            achievements: self.common_achievements.clone(),
            challenges: self.common_challenges.clone(),
            learnings: self.common_learnings.clone(),
            next_day_focus: self.focus.clone(),
        }
    }
}

pub fn report_subject(date: NaiveDate) -> String {
    format!("Agent Garden Daily Report - {}", date)
}

pub fn reflection_file_name(date: NaiveDate) -> String {
    format!("{}_reflection.md", date)
}

pub fn synthesize(input: &SynthesisInput<'_>) -> Synthesis {
    let mut md = String::new();
    let _ = writeln!(md, "# Daily Reflection - {}\n", input.date);

    write_perception_insights(&mut md, input.perceptions);
    write_memory_insights(&mut md, input.recent_memories);

    let reports = input.helper_reports;
    if !reports.is_empty() {
        let _ = writeln!(md, "## Helper Agent Reports\n");
        for report in reports {
            write_helper_report(&mut md, report);
        }
    }

    let total = input.open_tasks + input.completed_tasks;
    let completion_rate = if total > 0 {
        input.completed_tasks as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    let _ = writeln!(md, "## Self-Assessment\n");
    let _ = writeln!(md, "- **Task Completion Rate:** {:.1}%", completion_rate);
    let _ = writeln!(md, "- **Open Tasks:** {}", input.open_tasks);
    let _ = writeln!(md, "- **Completed Tasks:** {}\n", input.completed_tasks);

    let common_achievements =
        top_by_frequency(reports.iter().flat_map(|r| r.report.key_achievements.iter()), 3);
    let common_challenges =
        top_by_frequency(reports.iter().flat_map(|r| r.report.key_challenges.iter()), 3);
    let common_learnings =
        top_by_frequency(reports.iter().flat_map(|r| r.report.key_learnings.iter()), 3);
    let common_improvements =
        top_by_frequency(reports.iter().flat_map(|r| r.report.improvement_plan.iter()), 3);
    let common_focus =
        top_by_frequency(reports.iter().flat_map(|r| r.report.next_day_focus.iter()), 3);

    let _ = writeln!(md, "## System-Wide Insights\n");
    write_list_section(&mut md, "Common Achievements", &common_achievements);
    write_list_section(&mut md, "Common Challenges", &common_challenges);
    write_list_section(&mut md, "Common Learnings", &common_learnings);

    let mut improvement_areas: Vec<String> =
        DEFAULT_IMPROVEMENTS.iter().map(|s| s.to_string()).collect();
    improvement_areas.extend(
        common_challenges
            .iter()
            .map(|c| format!("Address common helper challenge: {}", c)),
    );
    improvement_areas.extend(common_improvements);
    let mut improvement_areas = dedup_preserving_order(improvement_areas);
    improvement_areas.truncate(5);

    let _ = writeln!(md, "## Areas for Improvement\n");
    for area in &improvement_areas {
        let _ = writeln!(md, "- {}", area);
    }
    let _ = writeln!(md);

    let mut focus: Vec<String> = DEFAULT_FOCUS.iter().map(|s| s.to_string()).collect();
    focus.extend(
        common_focus
            .iter()
            .map(|f| format!("Support helper agents with: {}", f)),
    );
    let mut focus = dedup_preserving_order(focus);
    focus.truncate(5);

    let _ = writeln!(md, "## Focus for Tomorrow\n");
    for item in &focus {
        let _ = writeln!(md, "- {}", item);
    }

    Synthesis {
        markdown: md,
        common_achievements,
        common_challenges,
        common_learnings,
        improvement_areas,
        focus,
    }
}

fn write_perception_insights(md: &mut String, perceptions: &PerceptionSnapshot) {
    let _ = writeln!(md, "## Perception Insights\n");
    for (source, data) in perceptions {
        let lines = perception_lines(data);
        if lines.is_empty() {
            continue;
        }
        let _ = writeln!(md, "### {} Insights\n", title_case(source));
        for line in lines {
            let _ = writeln!(md, "- {}", line);
        }
        let _ = writeln!(md);
    }
}

/// An `insights` string array if the source provides one, otherwise up to
/// five scalar fields.
fn perception_lines(data: &Value) -> Vec<String> {
    if let Some(insights) = data.get("insights").and_then(Value::as_array) {
        return insights
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }
    match data {
        Value::Object(fields) => fields
            .iter()
            .filter_map(|(key, value)| match value {
                Value::String(s) => Some(format!("{}: {}", key, s)),
                Value::Number(n) => Some(format!("{}: {}", key, n)),
                Value::Bool(b) => Some(format!("{}: {}", key, b)),
                _ => None,
            })
            .take(5)
            .collect(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn write_memory_insights(md: &mut String, memories: &[MemoryEntry]) {
    let _ = writeln!(md, "## Memory Insights\n");

    let mut categories: Vec<&str> = Vec::new();
    for memory in memories {
        if !categories.contains(&memory.category.as_str()) {
            categories.push(&memory.category);
        }
    }
    for category in categories {
        let _ = writeln!(md, "### {} Memories\n", title_case(category));
        for memory in memories.iter().filter(|m| m.category == category).take(3) {
            let _ = writeln!(md, "- {}", memory.content);
        }
        let _ = writeln!(md);
    }
}

fn write_helper_report(md: &mut String, helper: &HelperReport) {
    let report = &helper.report;
    let _ = writeln!(md, "### {} ({})\n", helper.agent_name, helper.specialization);
    let _ = writeln!(md, "- **Tasks Completed:** {}", report.tasks_completed);
    let _ = writeln!(md, "- **Success Rate:** {:.1}%\n", report.success_rate * 100.0);

    write_bold_list(md, "Key Achievements", &report.key_achievements);
    write_bold_list(md, "Key Challenges", &report.key_challenges);
    write_bold_list(md, "Key Learnings", &report.key_learnings);
    write_bold_list(md, "Next Day Focus", &report.next_day_focus);
    write_bold_list(md, "Improvement Plan", &report.improvement_plan);

    let _ = writeln!(md, "---\n");
}

fn write_bold_list(md: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(md, "**{}:**", title);
    for item in items.iter().take(3) {
        let _ = writeln!(md, "- {}", item);
    }
    let _ = writeln!(md);
}

fn write_list_section(md: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(md, "### {}\n", title);
    for item in items {
        let _ = writeln!(md, "- {}", item);
    }
    let _ = writeln!(md);
}

fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use garden_core::domain::memory::MemoryMetadata;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn memory(category: &str, content: &str) -> MemoryEntry {
        MemoryEntry {
            id: "mem_1".into(),
            timestamp: Utc::now(),
            content: content.into(),
            category: category.into(),
            tags: Vec::new(),
            metadata: MemoryMetadata::default(),
        }
    }

    fn helper_report(name: &str, challenges: &[&str], focus: &[&str]) -> HelperReport {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        HelperReport {
            agent_id: AgentId::from(name),
            agent_name: name.into(),
            specialization: Specialization::Research,
            report: NightlyReport {
                date,
                agent_id: AgentId::from(name),
                specialization: Some(Specialization::Research),
                tasks_completed: 2,
                success_rate: 0.5,
                key_achievements: vec!["Shipped summary".into()],
                key_challenges: challenges.iter().map(|s| s.to_string()).collect(),
                key_learnings: vec!["Cite sources".into()],
                improvement_ideas: Vec::new(),
                skill_effectiveness: BTreeMap::new(),
                improvement_plan: Vec::new(),
                next_day_focus: focus.iter().map(|s| s.to_string()).collect(),
            },
            daily: None,
            improvement_plan: None,
        }
    }

    #[test]
    fn renders_every_section_with_defaults() {
        let perceptions = PerceptionSnapshot::new();
        let input = SynthesisInput {
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            perceptions: &perceptions,
            recent_memories: &[],
            helper_reports: &[],
            open_tasks: 0,
            completed_tasks: 0,
        };
        let out = synthesize(&input);

        assert!(out.markdown.starts_with("# Daily Reflection - 2026-03-01"));
        for section in [
            "## Perception Insights",
            "## Memory Insights",
            "## Self-Assessment",
            "## System-Wide Insights",
            "## Areas for Improvement",
            "## Focus for Tomorrow",
        ] {
            assert!(out.markdown.contains(section), "missing {}", section);
        }
        assert!(!out.markdown.contains("## Helper Agent Reports"));
        assert!(out.markdown.contains("- **Task Completion Rate:** 0.0%"));
        assert_eq!(out.improvement_areas.len(), 3);
        assert_eq!(out.focus.len(), 2);
    }

    #[test]
    fn helper_reports_feed_system_wide_sections() {
        let mut perceptions = PerceptionSnapshot::new();
        perceptions.insert("news_feed".into(), json!({ "insights": ["Rates are up"] }));
        let memories = vec![
            memory("helper_report", "Helper helper_1 reported: done"),
            memory("task", "Failed task task_002"),
        ];
        let reports = vec![
            helper_report("alpha", &["Slow sources"], &["Go deeper"]),
            helper_report("beta", &["Slow sources"], &["Go deeper"]),
        ];
        let input = SynthesisInput {
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            perceptions: &perceptions,
            recent_memories: &memories,
            helper_reports: &reports,
            open_tasks: 1,
            completed_tasks: 3,
        };
        let out = synthesize(&input);

        assert!(out.markdown.contains("### News Feed Insights"));
        assert!(out.markdown.contains("- Rates are up"));
        assert!(out.markdown.contains("### Helper Report Memories"));
        assert!(out.markdown.contains("### alpha (research)"));
        assert!(out.markdown.contains("- **Success Rate:** 50.0%"));
        assert!(out.markdown.contains("- **Task Completion Rate:** 75.0%"));
        assert_eq!(out.common_challenges, vec!["Slow sources"]);
        assert!(out
            .improvement_areas
            .contains(&"Address common helper challenge: Slow sources".to_string()));
        assert!(out.focus.contains(&"Support helper agents with: Go deeper".to_string()));

        let daily = out.to_daily_reflection(&input);
        assert_eq!(daily.tasks_completed, 3);
        assert_eq!(daily.tasks_pending, 1);
    }

    #[test]
    fn subject_and_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(report_subject(date), "Agent Garden Daily Report - 2026-03-01");
        assert_eq!(reflection_file_name(date), "2026-03-01_reflection.md");
    }
}
