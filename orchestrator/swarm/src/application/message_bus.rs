// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Message Bus
//!
//! Send, read, acknowledge and reply on top of a [`MessageStore`].
//!
//! Delivery is at-most-once per write: `send` returns once the message file
//! has been renamed into the recipient's mailbox, and the message is visible
//! to every later read. Marking a message as read rewrites the same file.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Per-recipient ordering and read tracking

use std::sync::Arc;

use garden_core::domain::agent::AgentId;
use garden_core::domain::repository::StorageError;
use garden_core::domain::task::Task;
use tracing::{debug, info, warn};

use crate::domain::message::{Message, MessageId, MessageKind, MessageStore};

#[derive(Clone)]
pub struct MessageBus {
    store: Arc<dyn MessageStore>,
}

impl MessageBus {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    pub async fn send(&self, message: Message) -> Result<MessageId, StorageError> {
        self.store.put(&message).await?;
        metrics::counter!("garden_messages_sent_total", "message_type" => message.message_type())
            .increment(1);
        info!(
            sender = %message.sender_id,
            recipient = %message.recipient_id,
            message_type = message.message_type(),
            subject = %message.subject,
            "Sent message"
        );
        Ok(message.message_id)
    }

    /// Mailbox contents, oldest first. An absent mailbox is empty.
    pub async fn get_messages(
        &self,
        agent_id: &AgentId,
        unread_only: bool,
    ) -> Result<Vec<Message>, StorageError> {
        let mut messages = self.store.list(agent_id).await?;
        if unread_only {
            messages.retain(|m| !m.read);
        }
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    pub async fn get_unread_messages(
        &self,
        agent_id: &AgentId,
    ) -> Result<Vec<Message>, StorageError> {
        self.get_messages(agent_id, true).await
    }

    /// `false` if the message does not exist. Already-read messages are left
    /// untouched and still report `true`.
    pub async fn mark_as_read(
        &self,
        agent_id: &AgentId,
        message_id: &MessageId,
    ) -> Result<bool, StorageError> {
        let Some(mut message) = self.store.get(agent_id, message_id).await? else {
            warn!(agent_id = %agent_id, message_id = %message_id, "Message not found");
            return Ok(false);
        };
        if message.read {
            return Ok(true);
        }
        message.read = true;
        self.store.put(&message).await?;
        debug!(agent_id = %agent_id, message_id = %message_id, "Marked message as read");
        Ok(true)
    }

    pub async fn assign_task(
        &self,
        sender_id: &AgentId,
        recipient_id: &AgentId,
        task: Task,
        instructions: Option<String>,
    ) -> Result<MessageId, StorageError> {
        let subject = format!("Task Assignment: {}", task.description);
        let content = instructions
            .unwrap_or_else(|| format!("Please complete the following task: {}", task.description));
        self.send(Message::new(
            sender_id.clone(),
            recipient_id.clone(),
            subject,
            content,
            MessageKind::Task { task },
        ))
        .await
    }

    /// Send a reply to `original`, addressed back to its sender.
    pub async fn reply_to(
        &self,
        original: &Message,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Result<Message, StorageError> {
        let reply = Message::new(
            original.recipient_id.clone(),
            original.sender_id.clone(),
            format!("Re: {}", original.subject),
            content,
            kind,
        )
        .with_reference(original.message_id);
        self.send(reply.clone()).await?;
        Ok(reply)
    }

    pub async fn delete_message(
        &self,
        agent_id: &AgentId,
        message_id: &MessageId,
    ) -> Result<bool, StorageError> {
        let deleted = self.store.delete(agent_id, message_id).await?;
        if deleted {
            info!(agent_id = %agent_id, message_id = %message_id, "Deleted message");
        } else {
            warn!(agent_id = %agent_id, message_id = %message_id, "Message not found");
        }
        Ok(deleted)
    }
}
