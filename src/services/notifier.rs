// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification delivery capability.

use async_trait::async_trait;

/// Delivery failed; the message may be retried later.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to send notification to {recipient}: {reason}")]
pub struct SendError {
    pub recipient: String,
    pub reason: String,
}

/// Delivers a message to a user.
///
/// Returning `Ok` means the message was accepted for delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), SendError>;
}

/// Notifier that writes each message to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), SendError> {
        tracing::info!(to = recipient, subject, body, "Notification");
        Ok(())
    }
}
