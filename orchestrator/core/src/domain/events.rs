// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentId, Specialization};
use crate::domain::lifecycle::RetirementReason;
use crate::domain::task::TaskId;

/// Events published while a pulse runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GardenEvent {
    PulseStarted {
        phase: String,
        started_at: DateTime<Utc>,
    },
    PulseCompleted {
        phase: String,
        completed_at: DateTime<Utc>,
    },
    HelperSpawned {
        agent_id: AgentId,
        parent_id: AgentId,
        specialization: Specialization,
        spawned_at: DateTime<Utc>,
    },
    TaskDelegated {
        task_id: TaskId,
        helper_id: AgentId,
        delegated_at: DateTime<Utc>,
    },
    TaskCompleted {
        agent_id: AgentId,
        task_id: TaskId,
        completed_at: DateTime<Utc>,
    },
    TaskFailed {
        agent_id: AgentId,
        task_id: TaskId,
        error: String,
        failed_at: DateTime<Utc>,
    },
    /// A helper failed a delegated task and it went back to the backlog.
    TaskReturned {
        task_id: TaskId,
        helper_id: AgentId,
        returned_at: DateTime<Utc>,
    },
    /// No skill could be resolved; the task stays open.
    TaskSkipped {
        agent_id: AgentId,
        task_id: TaskId,
        reason: String,
    },
    AgentRetired {
        agent_id: AgentId,
        reason: Option<RetirementReason>,
        retired_at: DateTime<Utc>,
    },
    HelperRecommended {
        skill: String,
        completed_tasks: usize,
    },
    BackupCreated {
        agent_id: AgentId,
        timestamp: String,
    },
}
