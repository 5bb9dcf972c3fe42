// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Aggregates, value objects and ports shared by every garden component.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and traits; no I/O besides config loading

pub mod agent;
pub mod config;
pub mod events;
pub mod lifecycle;
pub mod memory;
pub mod perception;
pub mod phase;
pub mod reflection;
pub mod repository;
pub mod skill;
pub mod task;
