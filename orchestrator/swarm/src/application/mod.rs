// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! Multi-agent services: the message bus, the agent registry, helper
//! runtimes, delegation, nightly synthesis and the pulse itself.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrator/helper coordination

pub mod agents;
pub mod context;
pub mod delegation;
pub mod message_bus;
pub mod pulse;
pub mod registry;
pub mod synthesis;

pub use agents::{AgentInstance, BaseAgent, HelperAgent, HelperTaskOutcome};
pub use context::GardenContext;
pub use message_bus::MessageBus;
pub use pulse::{DayReport, NightReport, Orchestrator, PulseReport};
pub use registry::AgentRegistry;
