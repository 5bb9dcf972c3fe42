// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Perception Manager - freshness-bounded cache over perception sources
//!
//! Reads never return an entry older than `max_staleness`: stale entries are
//! refreshed on the way out, and an entry whose refresh fails is left out of
//! the result rather than served stale.
//!
//! The cache is mirrored to `perception/cache.json` (last writer wins) so a
//! one-shot pulse can reuse readings taken by a long-running poller.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Source registry, refresh policy, background polling

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::perception::{CachedPerception, PerceptionSnapshot, PerceptionSource};
use crate::domain::repository::StorageError;
use crate::infrastructure::fs::{read_json, write_json_atomic};

pub struct PerceptionManager {
    sources: RwLock<Vec<Arc<dyn PerceptionSource>>>,
    cache: RwLock<BTreeMap<String, CachedPerception>>,
    max_staleness: Duration,
    mirror: Option<PathBuf>,
}

impl PerceptionManager {
    pub fn new(max_staleness: Duration) -> Self {
        Self {
            sources: RwLock::new(Vec::new()),
            cache: RwLock::new(BTreeMap::new()),
            max_staleness,
            mirror: None,
        }
    }

    /// Mirror the cache to `path`, seeding it from whatever is there now.
    pub fn with_mirror(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match read_json::<BTreeMap<String, CachedPerception>>(&path) {
            Ok(Some(entries)) => *self.cache.get_mut() = entries,
            Ok(None) => {}
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Ignoring unreadable perception cache"
            ),
        }
        self.mirror = Some(path);
        self
    }

    pub fn register(&self, source: Arc<dyn PerceptionSource>) {
        info!(source = source.name(), "Registered perception source");
        self.sources.write().push(source);
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.read().iter().map(|s| s.name().to_string()).collect()
    }

    pub fn max_staleness(&self) -> Duration {
        self.max_staleness
    }

    fn snapshot_sources(&self) -> Vec<Arc<dyn PerceptionSource>> {
        self.sources.read().clone()
    }

    fn cached(&self, name: &str) -> Option<CachedPerception> {
        self.cache.read().get(name).cloned()
    }

    /// Never fetched, or last fetched at least `frequency` ago.
    pub fn should_update(&self, source: &dyn PerceptionSource) -> bool {
        match self.cached(source.name()) {
            None => true,
            Some(entry) => entry.age(Utc::now()) >= source.frequency(),
        }
    }

    async fn refresh(&self, source: &dyn PerceptionSource) -> Option<serde_json::Value> {
        match source.perceive().await {
            Ok(data) => {
                self.cache.write().insert(
                    source.name().to_string(),
                    CachedPerception {
                        fetched_at: Utc::now(),
                        data: data.clone(),
                    },
                );
                debug!(source = source.name(), "Perception refreshed");
                Some(data)
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "Perception source failed");
                None
            }
        }
    }

    /// Refresh every due source (every source when `force`). A failed source
    /// keeps its previous entry. Returns the whole cache.
    pub async fn update_all(&self, force: bool) -> Result<PerceptionSnapshot, StorageError> {
        let mut refreshed = 0;
        for source in self.snapshot_sources() {
            if force || self.should_update(source.as_ref()) {
                if self.refresh(source.as_ref()).await.is_some() {
                    refreshed += 1;
                }
            }
        }
        if refreshed > 0 {
            self.persist()?;
        }

        Ok(self
            .cache
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.data.clone()))
            .collect())
    }

    /// Latest reading per registered source, none older than `max_staleness`.
    pub async fn latest(&self) -> Result<PerceptionSnapshot, StorageError> {
        let mut snapshot = PerceptionSnapshot::new();
        let mut refreshed = false;

        for source in self.snapshot_sources() {
            let name = source.name().to_string();
            let fresh = self
                .cached(&name)
                .filter(|entry| entry.age(Utc::now()) < self.max_staleness);

            match fresh {
                Some(entry) => {
                    snapshot.insert(name, entry.data);
                }
                None => {
                    if let Some(data) = self.refresh(source.as_ref()).await {
                        refreshed = true;
                        snapshot.insert(name, data);
                    }
                }
            }
        }
        if refreshed {
            self.persist()?;
        }
        Ok(snapshot)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let Some(path) = &self.mirror else {
            return Ok(());
        };
        let entries = self.cache.read().clone();
        write_json_atomic(path, &entries)
    }
}

/// Configuration for the perception poller
#[derive(Debug, Clone)]
pub struct PerceptionPollerConfig {
    /// How often to poll (in seconds)
    pub interval_seconds: u64,

    /// Whether polling is enabled
    pub enabled: bool,
}

impl Default for PerceptionPollerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
            enabled: true,
        }
    }
}

/// Perception Poller - Background task
pub struct PerceptionPoller {
    manager: Arc<PerceptionManager>,
    config: PerceptionPollerConfig,
    shutdown_token: CancellationToken,
}

impl PerceptionPoller {
    pub fn new(manager: Arc<PerceptionManager>, config: PerceptionPollerConfig) -> Self {
        Self {
            manager,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Start the poller background task
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        if !self.config.enabled {
            info!("Perception poller is disabled");
            return;
        }

        info!(
            interval_seconds = self.config.interval_seconds,
            "Starting perception poller background task"
        );

        let mut tick = interval(Duration::from_secs(self.config.interval_seconds.max(1)));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match self.poll_cycle().await {
                        Ok(count) => debug!(sources = count, "Perception poll completed"),
                        Err(e) => warn!("Perception poll failed: {}", e),
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping perception poller");
                    break;
                }
            }
        }

        info!("Perception poller background task stopped");
    }

    async fn poll_cycle(&self) -> Result<usize, StorageError> {
        Ok(self.manager.update_all(false).await?.len())
    }
}
