// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Notifier that hands reports to the tracing pipeline instead of a mail
//! transport. Subscribers decide where the record ends up.

use async_trait::async_trait;
use tracing::info;

use crate::domain::perception::Notifier;

#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(
            target: "garden::notification",
            recipient,
            subject,
            body_len = body.len(),
            "Report delivered"
        );
        tracing::debug!(target: "garden::notification", "{}", body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_always_succeeds() {
        let notifier = LogNotifier::new();
        notifier
            .send("admin@example.com", "Agent Garden Daily Report - 2026-01-01", "# Daily")
            .await
            .unwrap();
    }
}
