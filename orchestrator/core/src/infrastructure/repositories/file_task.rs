// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # File Task Repository
//!
//! `TaskRepository` backed by one JSON array per collection under
//! `agents/<id>/tasks/`. A missing file is an empty collection.

use async_trait::async_trait;

use crate::domain::agent::AgentId;
use crate::domain::repository::{StorageError, TaskRepository};
use crate::domain::task::{Task, TaskCollection};
use crate::infrastructure::fs::{read_json_or_default, write_json_atomic, GardenLayout};

#[derive(Debug, Clone)]
pub struct FileTaskRepository {
    layout: GardenLayout,
}

impl FileTaskRepository {
    pub fn new(layout: GardenLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl TaskRepository for FileTaskRepository {
    async fn load(
        &self,
        agent_id: &AgentId,
        collection: TaskCollection,
    ) -> Result<Vec<Task>, StorageError> {
        let path = self.layout.tasks_dir(agent_id).join(collection.file_name());
        read_json_or_default(&path)
    }

    async fn save(
        &self,
        agent_id: &AgentId,
        collection: TaskCollection,
        tasks: &[Task],
    ) -> Result<(), StorageError> {
        let path = self.layout.tasks_dir(agent_id).join(collection.file_name());
        write_json_atomic(&path, tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::TaskId;
    use chrono::Utc;
    use std::collections::{BTreeMap, BTreeSet};
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_collection_is_empty_then_persists() {
        let dir = TempDir::new().unwrap();
        let repo = FileTaskRepository::new(GardenLayout::new(dir.path()));
        let agent = AgentId::from("agent_001");

        assert!(repo.load(&agent, TaskCollection::Open).await.unwrap().is_empty());

        let task = Task {
            id: TaskId::from_sequence(1),
            description: "Draft newsletter".into(),
            priority: Default::default(),
            due_date: None,
            tags: BTreeSet::new(),
            skill_required: None,
            estimated_minutes: None,
            delegated_to: None,
            specialization: None,
            parameters: BTreeMap::new(),
            created_at: Utc::now(),
            completed_at: None,
            result: None,
        };
        repo.save(&agent, TaskCollection::Open, &[task.clone()]).await.unwrap();

        let loaded = repo.load(&agent, TaskCollection::Open).await.unwrap();
        assert_eq!(loaded, vec![task]);
        assert!(dir
            .path()
            .join("agents/agent_001/tasks/open_tasks.json")
            .exists());
    }
}
