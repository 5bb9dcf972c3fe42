// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Perception and Notification Ports
//!
//! Outward-facing collaborators consumed by the garden: sources of external
//! observations, and a channel for delivering the nightly report.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest data per source name.
pub type PerceptionSnapshot = BTreeMap<String, serde_json::Value>;

#[async_trait]
pub trait PerceptionSource: Send + Sync {
    fn name(&self) -> &str;

    /// Minimum time between two non-forced refreshes.
    fn frequency(&self) -> Duration;

    async fn perceive(&self) -> anyhow::Result<serde_json::Value>;
}

/// One cached observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPerception {
    pub fetched_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl CachedPerception {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}
