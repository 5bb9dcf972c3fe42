// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Garden Configuration Types
//
// Defines the configuration schema for an agent garden, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Orchestrator identity and on-disk data directory
// - Day/night pulse boundaries
// - Helper lifecycle thresholds and backup retention
// - Perception polling and notification settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "garden/v1";
pub const KIND: &str = "GardenConfig";

/// Top-level garden configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GardenConfigManifest {
    /// API version (must be "garden/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "GardenConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: GardenConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GardenConfigSpec {
    /// Root of the persisted layout (agents/, messages/, backups/, archive/)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub pulse: PulseConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub backups: BackupConfig,

    #[serde(default)]
    pub perception: PerceptionConfig,

    #[serde(default)]
    pub helpers: HelperConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Default for GardenConfigSpec {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            orchestrator: OrchestratorConfig::default(),
            pulse: PulseConfig::default(),
            lifecycle: LifecycleConfig::default(),
            backups: BackupConfig::default(),
            perception: PerceptionConfig::default(),
            helpers: HelperConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_orchestrator_id")]
    pub id: String,

    #[serde(default = "default_orchestrator_name")]
    pub name: String,

    #[serde(default = "default_orchestrator_mission")]
    pub mission: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            id: default_orchestrator_id(),
            name: default_orchestrator_name(),
            mission: default_orchestrator_mission(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// First hour (UTC) of the day phase
    #[serde(default = "default_day_start")]
    pub day_start_hour: u32,

    /// First hour (UTC) of the night phase
    #[serde(default = "default_night_start")]
    pub night_start_hour: u32,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            day_start_hour: default_day_start(),
            night_start_hour: default_night_start(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "default_max_active_helpers")]
    pub max_active_helpers: usize,

    #[serde(default = "default_max_tasks_threshold")]
    pub max_tasks_threshold: usize,

    #[serde(default = "default_max_days_threshold")]
    pub max_days_threshold: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_active_helpers: default_max_active_helpers(),
            max_tasks_threshold: default_max_tasks_threshold(),
            max_days_threshold: default_max_days_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Background poll interval; also the maximum age of a cached reading
    #[serde(default = "default_perception_interval")]
    pub interval_seconds: u64,

    #[serde(default)]
    pub sources: Vec<PerceptionSourceConfig>,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_perception_interval(),
            sources: Vec::new(),
        }
    }
}

/// A JSON file read as a perception source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionSourceConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default = "default_source_frequency")]
    pub frequency_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelperConfig {
    /// Completed tasks of one skill before a dedicated helper is recommended
    #[serde(default = "default_recommendation_threshold")]
    pub recommendation_threshold: usize,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            recommendation_threshold: default_recommendation_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_recipient")]
    pub recipient: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            recipient: default_recipient(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_orchestrator_id() -> String {
    "agent_001".to_string()
}

fn default_orchestrator_name() -> String {
    "Aurora".to_string()
}

fn default_orchestrator_mission() -> String {
    "Coordinate helper agents and keep the garden's backlog moving".to_string()
}

fn default_day_start() -> u32 {
    8
}

fn default_night_start() -> u32 {
    20
}

fn default_max_active_helpers() -> usize {
    20
}

fn default_max_tasks_threshold() -> usize {
    50
}

fn default_max_days_threshold() -> i64 {
    30
}

fn default_retention_days() -> i64 {
    7
}

fn default_true() -> bool {
    true
}

fn default_perception_interval() -> u64 {
    60
}

fn default_source_frequency() -> u64 {
    60
}

fn default_recommendation_threshold() -> usize {
    3
}

fn default_recipient() -> String {
    "admin@example.com".to_string()
}

impl Default for GardenConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "agent-garden".to_string(),
                version: Some("1.0.0".to_string()),
            },
            spec: GardenConfigSpec::default(),
        }
    }
}

impl GardenConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. GARDEN_CONFIG_PATH environment variable
    /// 2. ./garden-config.yaml (working directory)
    /// 3. ~/.garden/config.yaml (user home)
    /// 4. /etc/garden/config.yaml (system, Unix) or C:\ProgramData\Garden\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GARDEN_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./garden-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".garden").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/garden/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Garden\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Override source is injectable so tests don't touch process env.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("GARDEN_DATA_DIR") {
            tracing::info!("Environment override: GARDEN_DATA_DIR={}", dir);
            self.spec.data_dir = PathBuf::from(dir);
        }

        if let Some(val) = lookup("BACKUP_RETENTION_DAYS") {
            match val.trim().parse::<i64>() {
                Ok(days) => {
                    tracing::info!("Environment override: BACKUP_RETENTION_DAYS={}", days);
                    self.spec.backups.retention_days = days;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for BACKUP_RETENTION_DAYS: '{}'. Expected an integer. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Some(recipient) = lookup("RECIPIENT_EMAIL") {
            self.spec.notifications.recipient = recipient;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.spec.orchestrator.id.trim().is_empty() {
            anyhow::bail!("spec.orchestrator.id cannot be empty");
        }

        let pulse = &self.spec.pulse;
        if pulse.day_start_hour > 23 || pulse.night_start_hour > 23 {
            anyhow::bail!(
                "Pulse hours must be within 0..=23 (day_start_hour={}, night_start_hour={})",
                pulse.day_start_hour,
                pulse.night_start_hour
            );
        }
        if pulse.day_start_hour >= pulse.night_start_hour {
            anyhow::bail!(
                "spec.pulse.day_start_hour ({}) must be earlier than night_start_hour ({})",
                pulse.day_start_hour,
                pulse.night_start_hour
            );
        }

        let lifecycle = &self.spec.lifecycle;
        if lifecycle.max_tasks_threshold == 0 || lifecycle.max_days_threshold <= 0 {
            anyhow::bail!("Lifecycle thresholds must be greater than zero");
        }

        if self.spec.backups.retention_days < 0 {
            anyhow::bail!("spec.backups.retention_days cannot be negative");
        }

        if self.spec.perception.interval_seconds == 0 {
            anyhow::bail!("spec.perception.interval_seconds must be greater than zero");
        }

        for source in &self.spec.perception.sources {
            if source.name.is_empty() {
                anyhow::bail!("Perception source name cannot be empty");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_manifest() {
        let manifest = GardenConfigManifest::default();
        assert_eq!(manifest.api_version, "garden/v1");
        assert_eq!(manifest.kind, "GardenConfig");
        assert_eq!(manifest.spec.orchestrator.id, "agent_001");
        assert_eq!(manifest.spec.pulse.day_start_hour, 8);
        assert_eq!(manifest.spec.pulse.night_start_hour, 20);
        assert_eq!(manifest.spec.lifecycle.max_active_helpers, 20);
        assert_eq!(manifest.spec.lifecycle.max_tasks_threshold, 50);
        assert_eq!(manifest.spec.lifecycle.max_days_threshold, 30);
        assert_eq!(manifest.spec.backups.retention_days, 7);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
apiVersion: garden/v1
kind: GardenConfig
metadata:
  name: test-garden
spec:
  data_dir: /tmp/garden
  lifecycle:
    max_active_helpers: 5
  perception:
    sources:
      - name: news
        path: feeds/news.json
"#;
        let manifest = GardenConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.data_dir, PathBuf::from("/tmp/garden"));
        assert_eq!(manifest.spec.lifecycle.max_active_helpers, 5);
        assert_eq!(manifest.spec.lifecycle.max_days_threshold, 30);
        assert_eq!(manifest.spec.perception.sources[0].frequency_minutes, 60);
        assert_eq!(manifest.spec.orchestrator.name, "Aurora");
    }

    #[test]
    fn test_yaml_roundtrip() {
        let manifest = GardenConfigManifest::default();
        let yaml = serde_yaml::to_string(&manifest).unwrap();
        let parsed = GardenConfigManifest::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed.metadata.name, "agent-garden");
        assert_eq!(parsed.spec.helpers.recommendation_threshold, 3);
    }

    #[test]
    fn test_validation() {
        let mut manifest = GardenConfigManifest::default();
        manifest.spec.pulse.day_start_hour = 20;
        manifest.spec.pulse.night_start_hour = 8;
        assert!(manifest.validate().is_err());

        let mut manifest = GardenConfigManifest::default();
        manifest.spec.pulse.night_start_hour = 24;
        assert!(manifest.validate().is_err());

        let mut manifest = GardenConfigManifest::default();
        manifest.spec.orchestrator.id = String::new();
        assert!(manifest.validate().is_err());

        let mut manifest = GardenConfigManifest::default();
        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            ("GARDEN_DATA_DIR", "/srv/garden"),
            ("BACKUP_RETENTION_DAYS", "14"),
            ("RECIPIENT_EMAIL", "ops@example.com"),
        ]);
        let mut manifest = GardenConfigManifest::default();
        manifest.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(manifest.spec.data_dir, PathBuf::from("/srv/garden"));
        assert_eq!(manifest.spec.backups.retention_days, 14);
        assert_eq!(manifest.spec.notifications.recipient, "ops@example.com");

        let bad = HashMap::from([("BACKUP_RETENTION_DAYS", "a week")]);
        let mut manifest = GardenConfigManifest::default();
        manifest.apply_overrides_from(|k| bad.get(k).map(|v| v.to_string()));
        assert_eq!(manifest.spec.backups.retention_days, 7);
    }
}
