// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # File Agent Repository
//!
//! `AgentRepository` backed by `agents/<id>/config.json`. Deleting an agent
//! removes its whole directory.

use std::fs;
use std::io;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::repository::{AgentRepository, StorageError};
use crate::infrastructure::fs::{read_json, remove_dir_if_exists, write_json_atomic, GardenLayout};

#[derive(Debug, Clone)]
pub struct FileAgentRepository {
    layout: GardenLayout,
}

impl FileAgentRepository {
    pub fn new(layout: GardenLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl AgentRepository for FileAgentRepository {
    async fn save(&self, agent: &Agent) -> Result<(), StorageError> {
        write_json_atomic(&self.layout.agent_config(&agent.id), agent)
    }

    async fn find_by_id(&self, id: &AgentId) -> Result<Option<Agent>, StorageError> {
        read_json(&self.layout.agent_config(id))
    }

    /// Ordered by creation time, then id.
    async fn list_all(&self) -> Result<Vec<Agent>, StorageError> {
        let dir = self.layout.agents_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&dir, e)),
        };

        let mut agents = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StorageError::io(&dir, e))?.path();
            if !path.is_dir() {
                continue;
            }
            let config = path.join("config.json");
            match read_json::<Agent>(&config) {
                Ok(Some(agent)) => agents.push(agent),
                Ok(None) => {}
                Err(e) => warn!(
                    path = %config.display(),
                    error = %e,
                    "Skipping unreadable agent config"
                ),
            }
        }
        agents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(agents)
    }

    async fn delete(&self, id: &AgentId) -> Result<(), StorageError> {
        remove_dir_if_exists(&self.layout.agent_dir(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::Specialization;
    use tempfile::TempDir;

    #[tokio::test]
    async fn save_find_list_delete() {
        let dir = TempDir::new().unwrap();
        let repo = FileAgentRepository::new(GardenLayout::new(dir.path()));

        let root = Agent::orchestrator(AgentId::from("agent_001"), "Aurora", "Tend");
        let helper = Agent::helper("Scout", "Research", root.id.clone(), Specialization::Research);
        repo.save(&root).await.unwrap();
        repo.save(&helper).await.unwrap();

        let found = repo.find_by_id(&helper.id).await.unwrap().unwrap();
        assert_eq!(found.parent_id, Some(root.id.clone()));
        assert_eq!(repo.list_all().await.unwrap().len(), 2);

        repo.delete(&helper.id).await.unwrap();
        assert!(repo.find_by_id(&helper.id).await.unwrap().is_none());
        assert!(!dir.path().join("agents").join(helper.id.as_str()).exists());
    }

    #[tokio::test]
    async fn corrupt_config_is_skipped_when_listing() {
        let dir = TempDir::new().unwrap();
        let layout = GardenLayout::new(dir.path());
        let repo = FileAgentRepository::new(layout.clone());
        repo.save(&Agent::orchestrator(AgentId::from("agent_001"), "A", "M"))
            .await
            .unwrap();

        let broken = layout.agent_config(&AgentId::from("broken"));
        fs::create_dir_all(broken.parent().unwrap()).unwrap();
        fs::write(&broken, "{").unwrap();

        let agents = repo.list_all().await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id.as_str(), "agent_001");
    }
}
