// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `garden-swarm` - Helper Coordination Crate
//!
//! Manages the orchestrator and its helper agents: who exists, who talks to
//! whom, which helper gets which task, and what a day or night pulse does.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `Message`, `MessageKind`, `MessageStore`, `RegistryError` |
//! | [`infrastructure`] | Infrastructure | `FileMailbox` (one JSON file per message) |
//! | [`application`] | Application | `MessageBus`, `AgentRegistry`, `HelperAgent`, delegation, synthesis, `GardenContext`, `Orchestrator` |
//!
//! ## Key Concepts
//!
//! - **Mailbox**: `messages/<agent_id>/` holds one file per message. A message
//!   is delivered once its file has been renamed into place; a crash never
//!   leaves a half-written message behind.
//! - **Delegation**: open tasks are routed to the first helper whose
//!   specialization matches the task, falling back to `general` helpers.
//! - **Pulse**: a single invocation of the day or night phase. The phase is
//!   derived from the UTC hour and never persisted.
//!
//! ## Concurrency Notes
//!
//! One pulse runs at a time per orchestrator. The only background work is the
//! perception poller owned by [`application::context::GardenContext`].

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
