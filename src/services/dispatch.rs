// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Due-reminder processing.
//!
//! Each scan:
//! 1. Selects reminders that are `scheduled` with `reminder_time <= now`
//! 2. Resolves the owning user and the referenced content
//! 3. Sends the notification
//! 4. Commits every status change of the scan as one batch
//!
//! A missing user or content item moves the reminder to `error`. A failed
//! send or a failed lookup leaves it `scheduled`, so the next scan retries.

use crate::db::{ContentStore, ReminderStore, UserStore};
use crate::error::AppError;
use crate::models::{Reminder, ReminderStatus, SavedContent, User};
use crate::services::notifier::Notifier;
use crate::time_utils::format_utc_minutes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one due-processing scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessReport {
    /// Reminders found due
    pub due: usize,
    /// IDs moved to `sent`
    pub sent: Vec<String>,
    /// IDs moved to `error` (user or content gone)
    pub errors: Vec<String>,
    /// IDs left `scheduled` after a send or lookup failure
    pub deferred: Vec<String>,
}

/// Subject and body of a reminder notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderMessage {
    pub subject: String,
    pub body: String,
}

impl ReminderMessage {
    pub fn new(user: &User, content: &SavedContent) -> Self {
        let subject = format!(
            "Reminder: Check out this saved item from {}",
            content.platform
        );
        let body = format!(
            "Hi {email},\n\n\
             You asked to be reminded about this saved item:\n\n\
             Title: {title}\n\
             URL: {url}\n\
             Platform: {platform}\n\n\
             Saved on: {saved_on}\n\n\
             Best regards,\n\
             Your App",
            email = user.email,
            title = content.title.as_deref().unwrap_or("(untitled)"),
            url = content.url.as_deref().unwrap_or("(no link)"),
            platform = content.platform,
            saved_on = format_utc_minutes(content.saved_at),
        );
        Self { subject, body }
    }
}

enum Resolution {
    Ready(User, SavedContent),
    Missing,
}

/// Dispatches due reminders through a [`Notifier`].
#[derive(Clone)]
pub struct ReminderProcessor {
    users: Arc<dyn UserStore>,
    content: Arc<dyn ContentStore>,
    reminders: Arc<dyn ReminderStore>,
    notifier: Arc<dyn Notifier>,
}

impl ReminderProcessor {
    pub fn new(
        users: Arc<dyn UserStore>,
        content: Arc<dyn ContentStore>,
        reminders: Arc<dyn ReminderStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users,
            content,
            reminders,
            notifier,
        }
    }

    async fn resolve(&self, reminder: &Reminder) -> Result<Resolution, AppError> {
        let user = self.users.get_user(reminder.user_id).await?;
        let content = self.content.get_content(&reminder.content_id).await?;

        Ok(match (user, content) {
            (Some(user), Some(content)) => Resolution::Ready(user, content),
            _ => Resolution::Missing,
        })
    }

    /// Process every reminder due at `now`.
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<ProcessReport, AppError> {
        let due = self.reminders.due_reminders(now).await?;
        let mut report = ProcessReport {
            due: due.len(),
            ..Default::default()
        };
        let mut updates = Vec::new();

        for reminder in due {
            // The store already filters, but a racing scan may have moved it
            if !reminder.is_due(now) {
                continue;
            }

            match self.resolve(&reminder).await {
                Ok(Resolution::Ready(user, content)) => {
                    let message = ReminderMessage::new(&user, &content);
                    match self
                        .notifier
                        .send(&user.email, &message.subject, &message.body)
                        .await
                    {
                        Ok(()) => {
                            tracing::info!(
                                reminder_id = %reminder.id,
                                user_id = user.user_id,
                                content_id = %content.id,
                                "Sent reminder"
                            );
                            updates.push((reminder.id.clone(), ReminderStatus::Sent));
                            report.sent.push(reminder.id);
                        }
                        Err(e) => {
                            tracing::warn!(
                                reminder_id = %reminder.id,
                                error = %e,
                                "Reminder send failed, will retry on next scan"
                            );
                            report.deferred.push(reminder.id);
                        }
                    }
                }
                Ok(Resolution::Missing) => {
                    tracing::warn!(
                        reminder_id = %reminder.id,
                        user_id = reminder.user_id,
                        content_id = %reminder.content_id,
                        "User or content not found for reminder"
                    );
                    updates.push((reminder.id.clone(), ReminderStatus::Error));
                    report.errors.push(reminder.id);
                }
                Err(e) => {
                    tracing::error!(
                        reminder_id = %reminder.id,
                        error = %e,
                        "Failed to resolve reminder, will retry on next scan"
                    );
                    report.deferred.push(reminder.id);
                }
            }
        }

        debug_assert!(updates
            .iter()
            .all(|(_, status)| ReminderStatus::Scheduled.can_transition_to(*status)));
        self.reminders.update_reminder_statuses(&updates).await?;

        tracing::info!(
            due = report.due,
            sent = report.sent.len(),
            errors = report.errors.len(),
            deferred = report.deferred.len(),
            "Finished processing due reminders"
        );

        Ok(report)
    }
}
