// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # File Mailbox
//!
//! `MessageStore` backed by `messages/<agent_id>/<message_id>.json`. Every
//! write goes through a temp file and a rename, so readers only ever see
//! complete messages.

use std::fs;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use garden_core::domain::agent::AgentId;
use garden_core::domain::repository::StorageError;
use garden_core::infrastructure::fs::{list_files, read_json, write_json_atomic, GardenLayout};
use tracing::warn;

use crate::domain::message::{Message, MessageId, MessageStore};

#[derive(Debug, Clone)]
pub struct FileMailbox {
    layout: GardenLayout,
}

impl FileMailbox {
    pub fn new(layout: GardenLayout) -> Self {
        Self { layout }
    }

    fn message_path(&self, agent_id: &AgentId, message_id: &MessageId) -> PathBuf {
        self.layout
            .mailbox_dir(agent_id)
            .join(format!("{}.json", message_id))
    }
}

#[async_trait]
impl MessageStore for FileMailbox {
    async fn put(&self, message: &Message) -> Result<(), StorageError> {
        write_json_atomic(
            &self.message_path(&message.recipient_id, &message.message_id),
            message,
        )
    }

    async fn list(&self, agent_id: &AgentId) -> Result<Vec<Message>, StorageError> {
        let mut messages = Vec::new();
        for path in list_files(&self.layout.mailbox_dir(agent_id), "json")? {
            match read_json::<Message>(&path) {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping undecodable message"),
            }
        }
        Ok(messages)
    }

    async fn get(
        &self,
        agent_id: &AgentId,
        message_id: &MessageId,
    ) -> Result<Option<Message>, StorageError> {
        read_json(&self.message_path(agent_id, message_id))
    }

    async fn delete(
        &self,
        agent_id: &AgentId,
        message_id: &MessageId,
    ) -> Result<bool, StorageError> {
        let path = self.message_path(agent_id, message_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }
}
