// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Garden Core
//!
//! Domain model, file-backed storage, task scheduling, helper lifecycle and
//! perception for the agent garden.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Everything a pulse needs below the level of messaging

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
