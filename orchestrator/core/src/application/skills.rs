// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Skill Registry
//!
//! Resolves the skill that should run a task. Lookup order:
//!
//! 1. the skill named by `skill_required`, if it validates the task
//! 2. a skill listing `skill_required` as an alias, if it validates
//! 3. the first registered skill that validates the task

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::domain::skill::Skill;
use crate::domain::task::Task;

#[derive(Default)]
pub struct SkillRegistry {
    skills: RwLock<Vec<Arc<dyn Skill>>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill. A later skill with the same name replaces the earlier one.
    pub fn register(&self, skill: Arc<dyn Skill>) {
        let mut skills = self.skills.write();
        skills.retain(|s| s.name() != skill.name());
        info!(skill = skill.name(), "Registered skill");
        skills.push(skill);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Skill>> {
        self.skills.read().iter().find(|s| s.name() == name).cloned()
    }

    /// Skill whose name or alias is `name`.
    pub fn get_by_name_or_alias(&self, name: &str) -> Option<Arc<dyn Skill>> {
        self.get(name).or_else(|| {
            self.skills
                .read()
                .iter()
                .find(|s| s.aliases().iter().any(|a| a == name))
                .cloned()
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.skills.read().iter().map(|s| s.name().to_string()).collect()
    }

    pub fn find_skill_for(&self, task: &Task) -> Option<Arc<dyn Skill>> {
        let skills = self.skills.read();

        if let Some(required) = task.skill_required.as_deref() {
            if let Some(skill) = skills.iter().find(|s| s.name() == required && s.validate(task)) {
                return Some(skill.clone());
            }
            if let Some(skill) = skills
                .iter()
                .find(|s| s.aliases().iter().any(|a| a == required) && s.validate(task))
            {
                return Some(skill.clone());
            }
        }

        let found = skills.iter().find(|s| s.validate(task)).cloned();
        if found.is_none() {
            debug!(task_id = %task.id, "No skill validates task");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::skill::{SkillError, SkillOutcome};
    use crate::domain::task::TaskId;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::{BTreeMap, BTreeSet};

    struct NamedSkill {
        name: &'static str,
        aliases: Vec<String>,
        accepts_all: bool,
    }

    #[async_trait]
    impl Skill for NamedSkill {
        fn name(&self) -> &str {
            self.name
        }

        fn aliases(&self) -> Vec<String> {
            self.aliases.clone()
        }

        fn validate(&self, task: &Task) -> bool {
            self.accepts_all
                || task.skill_required.as_deref() == Some(self.name)
                || self.aliases.iter().any(|a| task.skill_required.as_deref() == Some(a))
        }

        async fn execute(&self, _task: &Task) -> Result<SkillOutcome, SkillError> {
            Ok(SkillOutcome::success(self.name))
        }
    }

    fn task(skill: Option<&str>) -> Task {
        Task {
            id: TaskId::from_sequence(1),
            description: "t".into(),
            priority: Default::default(),
            due_date: None,
            tags: BTreeSet::new(),
            skill_required: skill.map(String::from),
            estimated_minutes: None,
            delegated_to: None,
            specialization: None,
            parameters: BTreeMap::new(),
            created_at: Utc::now(),
            completed_at: None,
            result: None,
        }
    }

    fn registry() -> SkillRegistry {
        let registry = SkillRegistry::new();
        registry.register(Arc::new(NamedSkill {
            name: "fallback",
            aliases: vec![],
            accepts_all: true,
        }));
        registry.register(Arc::new(NamedSkill {
            name: "research",
            aliases: vec!["investigate".into()],
            accepts_all: false,
        }));
        registry
    }

    #[test]
    fn exact_name_wins_over_fallback() {
        let found = registry().find_skill_for(&task(Some("research"))).unwrap();
        assert_eq!(found.name(), "research");
    }

    #[test]
    fn alias_match_before_any_validating_skill() {
        let found = registry().find_skill_for(&task(Some("investigate"))).unwrap();
        assert_eq!(found.name(), "research");
        assert_eq!(
            registry().get_by_name_or_alias("investigate").unwrap().name(),
            "research"
        );
    }

    #[test]
    fn falls_back_to_any_validating_skill() {
        let found = registry().find_skill_for(&task(Some("translation"))).unwrap();
        assert_eq!(found.name(), "fallback");
        assert!(SkillRegistry::new().find_skill_for(&task(None)).is_none());
    }

    #[test]
    fn re_registering_replaces() {
        let registry = registry();
        registry.register(Arc::new(NamedSkill {
            name: "research",
            aliases: vec![],
            accepts_all: false,
        }));
        assert_eq!(registry.names(), vec!["fallback", "research"]);
        assert!(registry.get_by_name_or_alias("investigate").is_none());
    }
}
