// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Pure domain types for agent coordination. No I/O dependencies.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`message`] | `Message`, `MessageId`, `MessageKind`, `MessageStore` |
//! | [`error`] | `RegistryError` |

pub mod error;
pub mod message;

pub use error::*;
pub use message::*;
