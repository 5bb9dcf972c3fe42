// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! File-backed adapters for the domain ports.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Persistence under the garden data directory, event bus, and
//!   the in-tree perception source, skill and notifier

pub mod backup;
pub mod event_bus;
pub mod fs;
pub mod memory;
pub mod notification;
pub mod perception;
pub mod reflection;
pub mod repositories;
pub mod skills;
