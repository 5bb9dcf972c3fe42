// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Garden Context
//!
//! Owns every service a pulse needs. Built once by the process entry point
//! from the loaded configuration; nothing here is a global.
//!
//! The perception poller is the only background task. It runs between
//! [`GardenContext::start_background`] and [`GardenContext::shutdown`].
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Service wiring and background task ownership

use std::sync::Arc;
use std::time::Duration;

use garden_core::application::{
    LifecycleManager, PerceptionManager, PerceptionPoller, PerceptionPollerConfig, SkillRegistry,
    TaskScheduler,
};
use garden_core::domain::agent::AgentId;
use garden_core::domain::config::GardenConfigSpec;
use garden_core::domain::perception::Notifier;
use garden_core::domain::repository::{AgentRepository, TaskRepository};
use garden_core::infrastructure::backup::BackupManager;
use garden_core::infrastructure::event_bus::EventBus;
use garden_core::infrastructure::fs::GardenLayout;
use garden_core::infrastructure::memory::MemorySystem;
use garden_core::infrastructure::notification::LogNotifier;
use garden_core::infrastructure::perception::FilePerceptionSource;
use garden_core::infrastructure::reflection::ReflectionSystem;
use garden_core::infrastructure::repositories::{FileAgentRepository, FileTaskRepository};
use garden_core::infrastructure::skills::RecordSkill;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::message_bus::MessageBus;
use crate::application::registry::AgentRegistry;
use crate::infrastructure::mailbox::FileMailbox;

pub struct GardenContext {
    pub config: GardenConfigSpec,
    pub layout: GardenLayout,
    pub agents: Arc<dyn AgentRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub registry: AgentRegistry,
    pub bus: MessageBus,
    pub lifecycle: LifecycleManager,
    pub perception: Arc<PerceptionManager>,
    pub skills: Arc<SkillRegistry>,
    pub backups: BackupManager,
    pub notifier: Arc<dyn Notifier>,
    pub events: EventBus,
    orchestrator_id: AgentId,
    poller: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl GardenContext {
    /// Wire file-backed services rooted at `config.data_dir`.
    pub fn new(config: GardenConfigSpec) -> Self {
        let layout = GardenLayout::new(config.data_dir.clone());
        let orchestrator_id = AgentId::new(config.orchestrator.id.clone());
        let agents: Arc<dyn AgentRepository> = Arc::new(FileAgentRepository::new(layout.clone()));
        let tasks: Arc<dyn TaskRepository> = Arc::new(FileTaskRepository::new(layout.clone()));
        let events = EventBus::with_default_capacity();

        let skills = Arc::new(SkillRegistry::new());
        skills.register(Arc::new(RecordSkill::new(layout.clone(), orchestrator_id.clone())));

        let interval = Duration::from_secs(config.perception.interval_seconds.max(1));
        let perception = PerceptionManager::new(interval).with_mirror(layout.perception_cache());
        for source in &config.perception.sources {
            perception.register(Arc::new(FilePerceptionSource::from_config(
                source,
                &config.data_dir,
            )));
        }

        Self {
            registry: AgentRegistry::new(
                agents.clone(),
                tasks.clone(),
                layout.clone(),
                skills.clone(),
                events.clone(),
            ),
            bus: MessageBus::new(Arc::new(FileMailbox::new(layout.clone()))),
            lifecycle: LifecycleManager::new(
                agents.clone(),
                tasks.clone(),
                layout.clone(),
                config.lifecycle.clone(),
            ),
            perception: Arc::new(perception),
            backups: BackupManager::new(layout.clone()),
            notifier: Arc::new(LogNotifier::new()),
            agents,
            tasks,
            skills,
            events,
            layout,
            orchestrator_id,
            config,
            poller: Mutex::new(None),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn orchestrator_id(&self) -> &AgentId {
        &self.orchestrator_id
    }

    /// The orchestrator's backlog.
    pub fn scheduler(&self) -> TaskScheduler {
        TaskScheduler::new(self.tasks.clone(), self.orchestrator_id.clone())
    }

    pub fn memory(&self) -> MemorySystem {
        MemorySystem::for_agent(&self.layout, &self.orchestrator_id)
    }

    pub fn reflections(&self) -> ReflectionSystem {
        ReflectionSystem::for_agent(&self.layout, &self.orchestrator_id)
    }

    /// Start the perception poller if enabled. Calling it again while the
    /// poller runs does nothing.
    pub fn start_background(&self) {
        if !self.config.perception.enabled {
            info!("Perception polling disabled by configuration");
            return;
        }
        let mut slot = self.poller.lock();
        if slot.is_some() {
            return;
        }
        let poller = Arc::new(PerceptionPoller::new(
            self.perception.clone(),
            PerceptionPollerConfig {
                interval_seconds: self.config.perception.interval_seconds,
                enabled: true,
            },
        ));
        let token = poller.shutdown_token();
        let handle = poller.start();
        *slot = Some((token, handle));
    }

    pub fn is_polling(&self) -> bool {
        self.poller.lock().is_some()
    }

    /// Stop the poller and wait for it to exit.
    pub async fn shutdown(&self) {
        let running = self.poller.lock().take();
        if let Some((token, handle)) = running {
            token.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "Perception poller exited abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::domain::config::GardenConfigSpec;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> GardenConfigSpec {
        GardenConfigSpec {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn wires_record_skill_and_orchestrator_id() {
        let dir = TempDir::new().unwrap();
        let ctx = GardenContext::new(config(&dir));
        assert_eq!(ctx.orchestrator_id().as_str(), "agent_001");
        assert_eq!(ctx.skills.names(), vec!["record"]);
        assert_eq!(ctx.scheduler().agent_id().as_str(), "agent_001");
    }

    #[tokio::test]
    async fn background_poller_starts_and_stops() {
        let dir = TempDir::new().unwrap();
        let ctx = GardenContext::new(config(&dir));

        ctx.start_background();
        assert!(ctx.is_polling());
        ctx.start_background();

        ctx.shutdown().await;
        assert!(!ctx.is_polling());
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn disabled_perception_never_polls() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.perception.enabled = false;
        let ctx = GardenContext::new(cfg);
        ctx.start_background();
        assert!(!ctx.is_polling());
    }
}
