// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder creation and listing.

use crate::db::{ContentStore, ReminderStore};
use crate::error::AppError;
use crate::models::{Platform, Reminder, ReminderStatus};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Reasons a reminder cannot be created.
#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("content {0} not found")]
    InvalidContent(String),

    #[error("invalid reminder time: {0:?}")]
    InvalidTime(String),

    #[error("reminder time must be in the future")]
    PastTime,

    #[error("storage error: {0}")]
    Storage(#[from] AppError),
}

/// A reminder joined with the content it points at.
///
/// Content fields are empty when the content no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderView {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub content_title: Option<String>,
    pub content_url: Option<String>,
    pub content_platform: Option<Platform>,
}

/// Parse a user-supplied reminder time.
///
/// Accepts RFC 3339 with an offset, or a naive `YYYY-MM-DDTHH:MM[:SS[.f]]`
/// which is taken as UTC.
pub fn parse_reminder_time(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Clone)]
pub struct ReminderService {
    content: Arc<dyn ContentStore>,
    reminders: Arc<dyn ReminderStore>,
}

impl ReminderService {
    pub fn new(content: Arc<dyn ContentStore>, reminders: Arc<dyn ReminderStore>) -> Self {
        Self { content, reminders }
    }

    /// Schedule a reminder on one of the user's saved items.
    ///
    /// Nothing is stored unless every check passes.
    pub async fn create_reminder(
        &self,
        user_id: u64,
        content_id: &str,
        reminder_time: &str,
        now: DateTime<Utc>,
    ) -> Result<Reminder, ReminderError> {
        let owned = self
            .content
            .get_content(content_id)
            .await?
            .is_some_and(|c| c.user_id == user_id);
        if !owned {
            return Err(ReminderError::InvalidContent(content_id.to_string()));
        }

        let reminder_time = parse_reminder_time(reminder_time)
            .ok_or_else(|| ReminderError::InvalidTime(reminder_time.to_string()))?;
        if reminder_time <= now {
            return Err(ReminderError::PastTime);
        }

        let reminder = Reminder {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            content_id: content_id.to_string(),
            reminder_time,
            created_at: now,
            status: ReminderStatus::Scheduled,
        };
        self.reminders.insert_reminder(&reminder).await?;

        tracing::info!(
            user_id,
            reminder_id = %reminder.id,
            content_id,
            reminder_time = %reminder.reminder_time,
            "Created reminder"
        );

        Ok(reminder)
    }

    /// All of a user's reminders, earliest first.
    pub async fn list_reminders(&self, user_id: u64) -> Result<Vec<Reminder>, AppError> {
        self.reminders.list_reminders(user_id).await
    }

    /// Reminders with their content details filled in.
    pub async fn list_reminder_views(&self, user_id: u64) -> Result<Vec<ReminderView>, AppError> {
        let reminders = self.list_reminders(user_id).await?;

        let mut views = Vec::with_capacity(reminders.len());
        for reminder in reminders {
            let content = self.content.get_content(&reminder.content_id).await?;
            views.push(ReminderView {
                content_title: content.as_ref().and_then(|c| c.title.clone()),
                content_url: content.as_ref().and_then(|c| c.url.clone()),
                content_platform: content.map(|c| c.platform),
                reminder,
            });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::{ContentType, SavedContent};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    async fn seeded() -> (Arc<MemoryDb>, ReminderService, String) {
        let db = Arc::new(MemoryDb::new());
        let content = SavedContent {
            id: SavedContent::content_id(1, Platform::Youtube, "video1"),
            user_id: 1,
            platform: Platform::Youtube,
            original_id: "video1".to_string(),
            title: Some("Video".to_string()),
            url: Some("http://youtube.com/watch?v=video1".to_string()),
            description: None,
            content_type: ContentType::Video,
            saved_at: now(),
            original_published_at: None,
        };
        db.insert_new_content(&[content.clone()]).await.unwrap();
        let service = ReminderService::new(db.clone(), db.clone());
        (db, service, content.id)
    }

    #[test]
    fn test_parse_reminder_time() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        assert_eq!(parse_reminder_time("2024-01-02T09:30:00Z"), Some(expected));
        assert_eq!(parse_reminder_time("2024-01-02T11:30:00+02:00"), Some(expected));
        assert_eq!(parse_reminder_time("2024-01-02T09:30:00"), Some(expected));
        assert_eq!(parse_reminder_time("2024-01-02T09:30"), Some(expected));
        assert_eq!(parse_reminder_time("next tuesday"), None);
        assert_eq!(parse_reminder_time(""), None);
    }

    #[tokio::test]
    async fn test_create_reminder() {
        let (db, service, content_id) = seeded().await;

        let reminder = service
            .create_reminder(1, &content_id, "2024-01-02T09:30:00Z", now())
            .await
            .unwrap();

        assert_eq!(reminder.status, ReminderStatus::Scheduled);
        assert_eq!(reminder.created_at, now());
        assert_eq!(db.list_reminders(1).await.unwrap(), vec![reminder]);
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_content() {
        let (db, service, content_id) = seeded().await;

        let err = service
            .create_reminder(2, &content_id, "2024-01-02T09:30:00Z", now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::InvalidContent(_)));

        let err = service
            .create_reminder(1, "missing", "2024-01-02T09:30:00Z", now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::InvalidContent(_)));
        assert!(db.list_reminders(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_times() {
        let (db, service, content_id) = seeded().await;

        let err = service
            .create_reminder(1, &content_id, "soon", now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::InvalidTime(_)));

        let exactly_now = now().to_rfc3339();
        let err = service
            .create_reminder(1, &content_id, &exactly_now, now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::PastTime));

        let past = (now() - Duration::minutes(1)).to_rfc3339();
        let err = service
            .create_reminder(1, &content_id, &past, now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::PastTime));

        assert!(db.list_reminders(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_views_tolerate_missing_content() {
        let (db, service, content_id) = seeded().await;
        service
            .create_reminder(1, &content_id, "2024-01-03T00:00:00Z", now())
            .await
            .unwrap();
        service
            .create_reminder(1, &content_id, "2024-01-02T00:00:00Z", now())
            .await
            .unwrap();

        let views = service.list_reminder_views(1).await.unwrap();
        assert_eq!(views.len(), 2);
        assert!(views[0].reminder.reminder_time < views[1].reminder.reminder_time);
        assert_eq!(views[0].content_title.as_deref(), Some("Video"));

        db.purge_content(&content_id);
        let views = service.list_reminder_views(1).await.unwrap();
        assert!(views.iter().all(|v| v.content_title.is_none()));
    }
}
