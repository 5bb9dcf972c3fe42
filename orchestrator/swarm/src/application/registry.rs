// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Registry
//!
//! Identity records and parent/child relationships, plus reconstruction of
//! runtime [`AgentInstance`]s from what is on disk.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Helper creation, lookup and instance loading

use std::sync::Arc;

use garden_core::application::{SkillRegistry, TaskScheduler};
use garden_core::domain::agent::{Agent, AgentId, Specialization};
use garden_core::domain::repository::{AgentRepository, StorageError, TaskRepository};
use garden_core::domain::task::TaskCollection;
use garden_core::infrastructure::event_bus::EventBus;
use garden_core::infrastructure::fs::{ensure_dir, GardenLayout};
use garden_core::infrastructure::memory::{KnowledgeStore, MemorySystem};
use garden_core::infrastructure::reflection::ReflectionSystem;
use tracing::{error, info};

use crate::application::agents::{AgentInstance, BaseAgent, HelperAgent};
use crate::domain::error::RegistryError;

#[derive(Clone)]
pub struct AgentRegistry {
    agents: Arc<dyn AgentRepository>,
    tasks: Arc<dyn TaskRepository>,
    layout: GardenLayout,
    skills: Arc<SkillRegistry>,
    events: EventBus,
}

impl AgentRegistry {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        tasks: Arc<dyn TaskRepository>,
        layout: GardenLayout,
        skills: Arc<SkillRegistry>,
        events: EventBus,
    ) -> Self {
        Self {
            agents,
            tasks,
            layout,
            skills,
            events,
        }
    }

    /// Create and persist a helper under `parent_id`, with an empty task
    /// store and its working directories in place.
    pub async fn create_helper(
        &self,
        name: &str,
        mission: &str,
        parent_id: &AgentId,
        specialization: Specialization,
    ) -> Result<(AgentId, Agent), RegistryError> {
        if self.agents.find_by_id(parent_id).await?.is_none() {
            error!(parent_id = %parent_id, "Parent agent not found");
            return Err(RegistryError::ParentNotFound(parent_id.clone()));
        }

        let helper = Agent::helper(name, mission, parent_id.clone(), specialization);
        self.agents.save(&helper).await?;

        self.tasks.save(&helper.id, TaskCollection::Open, &[]).await?;
        self.tasks.save(&helper.id, TaskCollection::Completed, &[]).await?;
        for dir in [
            self.layout.memories_dir(&helper.id),
            self.layout.reflections_dir(&helper.id),
            self.layout.outputs_dir(&helper.id),
        ] {
            ensure_dir(&dir)?;
        }

        info!(
            helper_id = %helper.id,
            parent_id = %parent_id,
            specialization = %helper.specialization,
            "Created helper agent"
        );
        Ok((helper.id.clone(), helper))
    }

    pub async fn get(&self, agent_id: &AgentId) -> Result<Option<Agent>, StorageError> {
        self.agents.find_by_id(agent_id).await
    }

    /// Helpers whose parent is `parent_id`, oldest first.
    pub async fn get_helpers(&self, parent_id: &AgentId) -> Result<Vec<Agent>, StorageError> {
        Ok(self
            .agents
            .list_all()
            .await?
            .into_iter()
            .filter(|a| a.parent_id.as_ref() == Some(parent_id))
            .collect())
    }

    /// Create the root agent if it does not exist yet.
    pub async fn ensure_orchestrator(
        &self,
        id: &AgentId,
        name: &str,
        mission: &str,
    ) -> Result<Agent, StorageError> {
        if let Some(existing) = self.agents.find_by_id(id).await? {
            return Ok(existing);
        }
        let agent = Agent::orchestrator(id.clone(), name, mission);
        self.agents.save(&agent).await?;
        self.tasks.save(id, TaskCollection::Open, &[]).await?;
        self.tasks.save(id, TaskCollection::Completed, &[]).await?;
        info!(agent_id = %id, name, "Created orchestrator agent");
        Ok(agent)
    }

    /// `false` if the agent is unknown or already has the skill.
    pub async fn add_skill(&self, agent_id: &AgentId, skill: &str) -> Result<bool, StorageError> {
        let Some(mut agent) = self.agents.find_by_id(agent_id).await? else {
            return Ok(false);
        };
        if !agent.skills.insert(skill.to_string()) {
            return Ok(false);
        }
        self.agents.save(&agent).await?;
        info!(agent_id = %agent_id, skill, "Added skill");
        Ok(true)
    }

    pub async fn load_instance(
        &self,
        agent_id: &AgentId,
    ) -> Result<Option<AgentInstance>, StorageError> {
        let Some(agent) = self.agents.find_by_id(agent_id).await? else {
            return Ok(None);
        };
        let scheduler = TaskScheduler::new(self.tasks.clone(), agent.id.clone());
        let memory = MemorySystem::for_agent(&self.layout, &agent.id);

        if !agent.is_helper() {
            return Ok(Some(AgentInstance::Base(BaseAgent {
                agent,
                scheduler,
                memory,
            })));
        }

        let skill = self
            .skills
            .get_by_name_or_alias(agent.specialization.as_str());
        Ok(Some(AgentInstance::Helper(HelperAgent {
            knowledge: KnowledgeStore::for_agent(&self.layout, &agent.id),
            reflections: ReflectionSystem::for_agent(&self.layout, &agent.id),
            skill,
            skills: self.skills.clone(),
            events: self.events.clone(),
            agent,
            scheduler,
            memory,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::infrastructure::repositories::{FileAgentRepository, FileTaskRepository};
    use garden_core::infrastructure::skills::RecordSkill;
    use tempfile::TempDir;

    fn registry(dir: &TempDir) -> AgentRegistry {
        let layout = GardenLayout::new(dir.path());
        let skills = Arc::new(SkillRegistry::new());
        skills.register(Arc::new(RecordSkill::new(layout.clone(), "agent_001".into())));
        AgentRegistry::new(
            Arc::new(FileAgentRepository::new(layout.clone())),
            Arc::new(FileTaskRepository::new(layout.clone())),
            layout,
            skills,
            EventBus::with_default_capacity(),
        )
    }

    #[tokio::test]
    async fn create_helper_requires_known_parent() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        let err = registry
            .create_helper("Scout", "Find things", &"agent_001".into(), Specialization::Research)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::ParentNotFound(ref id) if id.as_str() == "agent_001"));
    }

    #[tokio::test]
    async fn create_helper_builds_skeleton() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let parent: AgentId = "agent_001".into();
        registry.ensure_orchestrator(&parent, "Aurora", "Help").await.unwrap();

        let (id, helper) = registry
            .create_helper("Scout", "Find things", &parent, Specialization::Research)
            .await
            .unwrap();
        assert!(id.as_str().starts_with("helper_"));
        assert_eq!(helper.parent_id, Some(parent.clone()));

        let layout = GardenLayout::new(dir.path());
        assert!(layout.tasks_dir(&id).join("open_tasks.json").exists());
        assert!(layout.tasks_dir(&id).join("completed_tasks.json").exists());
        assert!(layout.memories_dir(&id).is_dir());
        assert!(layout.reflections_dir(&id).is_dir());
        assert!(layout.outputs_dir(&id).is_dir());

        let helpers = registry.get_helpers(&parent).await.unwrap();
        assert_eq!(helpers.len(), 1);
        assert!(registry.get_helpers(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_instance_selects_variant_by_parent() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let parent: AgentId = "agent_001".into();
        registry.ensure_orchestrator(&parent, "Aurora", "Help").await.unwrap();
        let (id, _) = registry
            .create_helper("Scout", "Find things", &parent, Specialization::Monitoring)
            .await
            .unwrap();

        let base = registry.load_instance(&parent).await.unwrap().unwrap();
        assert!(matches!(base, AgentInstance::Base(_)));

        let helper = registry.load_instance(&id).await.unwrap().unwrap();
        let helper = helper.as_helper().unwrap();
        assert_eq!(helper.skill.as_ref().unwrap().name(), "record");

        assert!(registry.load_instance(&"ghost".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_skill_is_set_like() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let id: AgentId = "agent_001".into();
        registry.ensure_orchestrator(&id, "Aurora", "Help").await.unwrap();

        assert!(registry.add_skill(&id, "writing").await.unwrap());
        assert!(!registry.add_skill(&id, "writing").await.unwrap());
        assert!(!registry.add_skill(&"ghost".into(), "writing").await.unwrap());
        assert!(registry.get(&id).await.unwrap().unwrap().skills.contains("writing"));
    }
}
