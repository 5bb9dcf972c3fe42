// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Inter-Agent Messages
//!
//! - [`Message`] - one mailbox entry, addressed to a single recipient.
//! - [`MessageKind`] - what the message is about. Task-carrying and
//!   completion messages hold their payload inline, so there is no separate
//!   channel for task hand-off.
//! - [`MessageStore`] - persistence port for mailboxes.
//!
//! On disk the kind is flattened into the record as a `message_type` field:
//!
//! ```json
//! { "message_id": "…", "message_type": "task_completion", "task_id": "task_004", … }
//! ```

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garden_core::domain::agent::AgentId;
use garden_core::domain::repository::StorageError;
use garden_core::domain::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Generate a new random `MessageId`.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum MessageKind {
    General,
    Response,
    Welcome,
    /// A failure report. Carries the task id when a delegated task failed.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<TaskId>,
    },
    HelperReport,
    /// A helper finished a delegated task.
    TaskCompletion { task_id: TaskId },
    /// A task assignment. The full task record travels with the message.
    Task { task: Task },
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::General => "general",
            MessageKind::Response => "response",
            MessageKind::Welcome => "welcome",
            MessageKind::Error { .. } => "error",
            MessageKind::HelperReport => "helper_report",
            MessageKind::TaskCompletion { .. } => "task_completion",
            MessageKind::Task { .. } => "task",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mailbox entry.
///
/// `read` only ever moves from `false` to `true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub sender_id: AgentId,
    pub recipient_id: AgentId,
    pub subject: String,
    pub content: String,
    #[serde(flatten)]
    pub kind: MessageKind,
    /// The message this one answers, if any.
    #[serde(default)]
    pub reference_id: Option<MessageId>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Message {
    pub fn new(
        sender_id: AgentId,
        recipient_id: AgentId,
        subject: impl Into<String>,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            message_id: MessageId::new(),
            sender_id,
            recipient_id,
            subject: subject.into(),
            content: content.into(),
            kind,
            reference_id: None,
            timestamp: Utc::now(),
            read: false,
        }
    }

    pub fn with_reference(mut self, reference_id: MessageId) -> Self {
        self.reference_id = Some(reference_id);
        self
    }

    pub fn message_type(&self) -> &'static str {
        self.kind.as_str()
    }

    /// The embedded task of a task assignment.
    pub fn task(&self) -> Option<&Task> {
        match &self.kind {
            MessageKind::Task { task } => Some(task),
            _ => None,
        }
    }
}

/// Persistence port for per-agent mailboxes.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Write (or overwrite) `message` in its recipient's mailbox.
    async fn put(&self, message: &Message) -> Result<(), StorageError>;

    /// Every decodable message in the mailbox, in no particular order.
    async fn list(&self, agent_id: &AgentId) -> Result<Vec<Message>, StorageError>;

    async fn get(
        &self,
        agent_id: &AgentId,
        message_id: &MessageId,
    ) -> Result<Option<Message>, StorageError>;

    /// `false` if there was nothing to delete.
    async fn delete(
        &self,
        agent_id: &AgentId,
        message_id: &MessageId,
    ) -> Result<bool, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn sample_task() -> Task {
        Task {
            id: TaskId::from_sequence(7),
            description: "Research open banking".into(),
            priority: Default::default(),
            due_date: None,
            tags: BTreeSet::new(),
            skill_required: Some("research".into()),
            estimated_minutes: None,
            delegated_to: None,
            specialization: None,
            parameters: BTreeMap::new(),
            created_at: Utc::now(),
            completed_at: None,
            result: None,
        }
    }

    #[test]
    fn kind_is_flattened_as_message_type() {
        let message = Message::new(
            "agent_001".into(),
            "helper_1".into(),
            "Done",
            "finished",
            MessageKind::TaskCompletion {
                task_id: TaskId::from_sequence(4),
            },
        );
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["message_type"], "task_completion");
        assert_eq!(json["task_id"], "task_004");
        assert_eq!(json["read"], false);
        assert!(json["reference_id"].is_null());
    }

    #[test]
    fn task_message_carries_full_task() {
        let message = Message::new(
            "agent_001".into(),
            "helper_1".into(),
            "Task Assignment: Research open banking",
            "go",
            MessageKind::Task { task: sample_task() },
        );
        let raw = serde_json::to_string(&message).unwrap();
        let decoded: Message = serde_json::from_str(&raw).unwrap();

        assert_eq!(decoded.message_type(), "task");
        let task = decoded.task().unwrap();
        assert_eq!(task.id, TaskId::from_sequence(7));
        assert_eq!(task.skill_required.as_deref(), Some("research"));
    }

    #[test]
    fn error_without_task_id_still_decodes() {
        let raw = serde_json::json!({
            "message_id": Uuid::new_v4(),
            "sender_id": "helper_1",
            "recipient_id": "agent_001",
            "subject": "Error processing task",
            "content": "Error: boom",
            "message_type": "error",
            "timestamp": "2026-03-01T09:00:00Z"
        });
        let message: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(message.kind, MessageKind::Error { task_id: None });

        let failed = Message::new(
            "helper_1".into(),
            "agent_001".into(),
            "Error processing task",
            "Error: boom",
            MessageKind::Error {
                task_id: Some(TaskId::from_sequence(2)),
            },
        );
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["message_type"], "error");
        assert_eq!(json["task_id"], "task_002");
    }

    #[test]
    fn plain_kinds_decode_without_payload() {
        let raw = serde_json::json!({
            "message_id": Uuid::new_v4(),
            "sender_id": "agent_001",
            "recipient_id": "helper_1",
            "subject": "Welcome to the Agent Garden",
            "content": "hi",
            "message_type": "welcome",
            "timestamp": "2026-03-01T09:00:00Z"
        });
        let message: Message = serde_json::from_value(raw).unwrap();
        assert!(matches!(message.kind, MessageKind::Welcome));
        assert!(!message.read);
        assert!(message.task().is_none());
    }
}
