// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! This module provides infrastructure implementations of repository abstractions
//! defined in the domain layer, following the Repository pattern from DDD.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve domain aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## File Repositories
//!
//! One JSON document per aggregate under the garden data directory:
//! - **FileAgentRepository** - `agents/<id>/config.json`
//! - **FileTaskRepository** - `agents/<id>/tasks/*_tasks.json`
//!
//! ## In-Memory Repositories
//!
//! Lightweight implementations for testing:
//! - **InMemoryTaskRepository** - Thread-safe HashMap-backed task collections

pub mod file_agent;
pub mod file_task;

pub use file_agent::FileAgentRepository;
pub use file_task::FileTaskRepository;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::agent::AgentId;
use crate::domain::repository::{StorageError, TaskRepository};
use crate::domain::task::{Task, TaskCollection};

#[derive(Clone, Default)]
pub struct InMemoryTaskRepository {
    collections: Arc<RwLock<HashMap<(AgentId, TaskCollection), Vec<Task>>>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn load(
        &self,
        agent_id: &AgentId,
        collection: TaskCollection,
    ) -> Result<Vec<Task>, StorageError> {
        let collections = self.collections.read();
        Ok(collections
            .get(&(agent_id.clone(), collection))
            .cloned()
            .unwrap_or_default())
    }

    async fn save(
        &self,
        agent_id: &AgentId,
        collection: TaskCollection,
        tasks: &[Task],
    ) -> Result<(), StorageError> {
        self.collections
            .write()
            .insert((agent_id.clone(), collection), tasks.to_vec());
        Ok(())
    }
}
