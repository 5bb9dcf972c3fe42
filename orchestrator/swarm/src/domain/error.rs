// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use garden_core::domain::agent::AgentId;
use garden_core::domain::repository::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Parent agent {0} not found")]
    ParentNotFound(AgentId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
