// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! JSON-file perception source.
//!
//! Reads a JSON document from disk on every `perceive()`. Whatever process
//! maintains the file (a cron job, a feed fetcher) is outside the garden.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use crate::domain::config::PerceptionSourceConfig;
use crate::domain::perception::PerceptionSource;

#[derive(Debug, Clone)]
pub struct FilePerceptionSource {
    name: String,
    path: PathBuf,
    frequency: Duration,
}

impl FilePerceptionSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, frequency: Duration) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            frequency,
        }
    }

    /// Relative paths in the config resolve against the garden data directory.
    pub fn from_config(config: &PerceptionSourceConfig, data_dir: &std::path::Path) -> Self {
        let path = if config.path.is_absolute() {
            config.path.clone()
        } else {
            data_dir.join(&config.path)
        };
        Self::new(
            config.name.clone(),
            path,
            Duration::from_secs(config.frequency_minutes * 60),
        )
    }
}

#[async_trait]
impl PerceptionSource for FilePerceptionSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn frequency(&self) -> Duration {
        self.frequency
    }

    async fn perceive(&self) -> anyhow::Result<serde_json::Value> {
        let raw = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read perception source {:?}", self.path))?;
        let value = serde_json::from_slice(&raw)
            .with_context(|| format!("Perception source {:?} is not valid JSON", self.path))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reads_json_and_reports_errors() {
        let dir = TempDir::new().unwrap();
        let config = PerceptionSourceConfig {
            name: "news".into(),
            path: PathBuf::from("feeds/news.json"),
            frequency_minutes: 5,
        };
        let source = FilePerceptionSource::from_config(&config, dir.path());
        assert_eq!(source.frequency(), Duration::from_secs(300));
        assert!(source.perceive().await.is_err());

        std::fs::create_dir_all(dir.path().join("feeds")).unwrap();
        std::fs::write(dir.path().join("feeds/news.json"), r#"{"headlines": ["rain"]}"#).unwrap();
        let value = source.perceive().await.unwrap();
        assert_eq!(value["headlines"][0], "rain");
    }
}
