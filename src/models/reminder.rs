// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder model and status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reminder delivery status.
///
/// `Scheduled` moves to `Sent` or `Error` exactly once. `Cancelled` is only
/// ever written by an external cancellation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Scheduled,
    Sent,
    Cancelled,
    Error,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Scheduled => "scheduled",
            ReminderStatus::Sent => "sent",
            ReminderStatus::Cancelled => "cancelled",
            ReminderStatus::Error => "error",
        }
    }

    /// Whether the due-processor may move a reminder from `self` to `next`.
    pub fn can_transition_to(&self, next: ReminderStatus) -> bool {
        matches!(
            (self, next),
            (ReminderStatus::Scheduled, ReminderStatus::Sent)
                | (ReminderStatus::Scheduled, ReminderStatus::Error)
        )
    }
}

/// Stored reminder record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Reminder ID (UUID, also used as document ID)
    pub id: String,
    /// Owning user
    pub user_id: u64,
    /// Referenced saved content (owned by the same user)
    pub content_id: String,
    /// When the reminder is due
    pub reminder_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: ReminderStatus,
}

impl Reminder {
    /// Due when still scheduled and the reminder time has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ReminderStatus::Scheduled && self.reminder_time <= now
    }
}
