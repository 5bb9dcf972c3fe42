// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the agent and task aggregates. Interfaces live
//! in the domain layer; the file-backed implementations live in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `AgentRepository` | `Agent` | `FileAgentRepository` |
//! | `TaskRepository` | `Task` collections | `FileTaskRepository` |
//!
//! Absence is never an error here: lookups return `Option`, and a missing
//! collection file reads as an empty collection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::task::{Task, TaskCollection};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error at {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn serialization(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        StorageError::Serialization {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Create or overwrite the agent record.
    async fn save(&self, agent: &Agent) -> Result<(), StorageError>;

    async fn find_by_id(&self, id: &AgentId) -> Result<Option<Agent>, StorageError>;

    /// Every agent with a readable record.
    async fn list_all(&self) -> Result<Vec<Agent>, StorageError>;

    /// Remove the agent and all of its live state.
    async fn delete(&self, id: &AgentId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn load(
        &self,
        agent_id: &AgentId,
        collection: TaskCollection,
    ) -> Result<Vec<Task>, StorageError>;

    async fn save(
        &self,
        agent_id: &AgentId,
        collection: TaskCollection,
        tasks: &[Task],
    ) -> Result<(), StorageError>;
}
