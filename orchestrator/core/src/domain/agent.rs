// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Aggregate
//!
//! Identity record for every agent in the garden. The orchestrator is the only
//! agent without a `parent_id`; every other agent is a helper spawned under it.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Agent identity, specialization and parent/child relationship

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix shared by every helper agent id.
pub const HELPER_ID_PREFIX: &str = "helper_";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh helper id of the form `helper_<8 hex>`.
    pub fn new_helper() -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", HELPER_ID_PREFIX, &raw[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Skill focus of a helper.
///
/// Serialized as a plain snake_case string so that unknown specializations
/// coming from the CLI survive a round trip as [`Specialization::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Specialization {
    Research,
    ContentCreation,
    Monitoring,
    General,
    Custom(String),
}

impl Specialization {
    pub fn as_str(&self) -> &str {
        match self {
            Specialization::Research => "research",
            Specialization::ContentCreation => "content_creation",
            Specialization::Monitoring => "monitoring",
            Specialization::General => "general",
            Specialization::Custom(name) => name.as_str(),
        }
    }

    /// Fixed insight strings kept in a retired agent's compressed memory.
    pub fn insights(&self) -> Vec<String> {
        let lines: &[&str] = match self {
            Specialization::Research => &[
                "Research methodology patterns",
                "Source evaluation techniques",
                "Information synthesis approaches",
            ],
            Specialization::ContentCreation => &[
                "Content structure patterns",
                "Audience engagement techniques",
                "Narrative development approaches",
            ],
            Specialization::Monitoring => &[
                "Metric tracking patterns",
                "Anomaly detection techniques",
                "Trend analysis approaches",
            ],
            _ => &[],
        };
        lines.iter().map(|s| s.to_string()).collect()
    }

    /// Focus line appended to a helper's plan for the next day.
    pub fn next_day_focus(&self) -> &'static str {
        match self {
            Specialization::Research => "Deepen research methodology and source evaluation",
            Specialization::ContentCreation => {
                "Improve content structure and engagement techniques"
            }
            Specialization::Monitoring => "Enhance pattern recognition and anomaly detection",
            _ => "Develop core skills and knowledge base",
        }
    }
}

impl Default for Specialization {
    fn default() -> Self {
        Specialization::General
    }
}

impl From<String> for Specialization {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "research" => Specialization::Research,
            "content_creation" => Specialization::ContentCreation,
            "monitoring" => Specialization::Monitoring,
            "general" | "" => Specialization::General,
            other => Specialization::Custom(other.to_string()),
        }
    }
}

impl From<&str> for Specialization {
    fn from(value: &str) -> Self {
        Specialization::from(value.to_string())
    }
}

impl From<Specialization> for String {
    fn from(value: Specialization) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted agent record (`agents/<id>/config.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(rename = "agent_id")]
    pub id: AgentId,
    pub name: String,
    pub mission: String,
    #[serde(default)]
    pub parent_id: Option<AgentId>,
    #[serde(default)]
    pub specialization: Specialization,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
}

impl Agent {
    /// Root agent record with no parent.
    pub fn orchestrator(id: AgentId, name: impl Into<String>, mission: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            mission: mission.into(),
            parent_id: None,
            specialization: Specialization::General,
            created_at: Utc::now(),
            skills: BTreeSet::new(),
        }
    }

    pub fn helper(
        name: impl Into<String>,
        mission: impl Into<String>,
        parent_id: AgentId,
        specialization: Specialization,
    ) -> Self {
        Self {
            id: AgentId::new_helper(),
            name: name.into(),
            mission: mission.into(),
            parent_id: Some(parent_id),
            specialization,
            created_at: Utc::now(),
            skills: BTreeSet::new(),
        }
    }

    pub fn is_helper(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Whole days elapsed since creation, floored.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds().div_euclid(86_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn helper_ids_have_prefix_and_eight_hex_chars() {
        let id = AgentId::new_helper();
        let suffix = id.as_str().strip_prefix(HELPER_ID_PREFIX).unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn specialization_round_trips_through_strings() {
        assert_eq!(Specialization::from("Research"), Specialization::Research);
        assert_eq!(Specialization::from("content_creation"), Specialization::ContentCreation);
        assert_eq!(
            Specialization::from("translation"),
            Specialization::Custom("translation".to_string())
        );

        let json = serde_json::to_string(&Specialization::Monitoring).unwrap();
        assert_eq!(json, "\"monitoring\"");
        let back: Specialization = serde_json::from_str("\"translation\"").unwrap();
        assert_eq!(back.as_str(), "translation");
    }

    #[test]
    fn agent_config_uses_agent_id_key() {
        let agent = Agent::orchestrator(AgentId::from("agent_001"), "Aurora", "Tend the garden");
        let value = serde_json::to_value(&agent).unwrap();
        assert_eq!(value["agent_id"], "agent_001");
        assert!(value["parent_id"].is_null());
        assert!(!agent.is_helper());
    }

    #[test]
    fn age_is_floored_in_days() {
        let mut agent = Agent::orchestrator(AgentId::from("a"), "a", "m");
        let now = Utc::now();
        agent.created_at = now - Duration::days(31) - Duration::hours(5);
        assert_eq!(agent.age_days(now), 31);
    }
}
