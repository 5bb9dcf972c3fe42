// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! Services that compose the domain and infrastructure layers.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Scheduling, lifecycle, perception and skill lookup

pub mod lifecycle;
pub mod perception;
pub mod scheduler;
pub mod skills;

pub use lifecycle::LifecycleManager;
pub use perception::{PerceptionManager, PerceptionPoller, PerceptionPollerConfig};
pub use scheduler::TaskScheduler;
pub use skills::SkillRegistry;
