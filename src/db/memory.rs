// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process storage backend.
//!
//! Records are keyed exactly like the Firestore documents, so the same
//! uniqueness rules hold: one account per (user, platform) and one content
//! record per (user, platform, original_id).

use crate::db::{ContentStore, CredentialStore, ReminderStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::{Platform, PlatformAccount, Reminder, ReminderStatus, SavedContent, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory database. Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    users: DashMap<u64, User>,
    /// Lowercased email -> user ID
    emails: DashMap<String, u64>,
    accounts: DashMap<String, PlatformAccount>,
    content: DashMap<String, SavedContent>,
    reminders: DashMap<String, Reminder>,
    /// Serializes multi-record writes so each batch lands as one unit
    write_lock: Mutex<()>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a single content record without touching reminders that
    /// reference it (an out-of-band admin deletion).
    pub fn purge_content(&self, content_id: &str) -> bool {
        self.inner.content.remove(content_id).is_some()
    }

    /// Remove a user record only, leaving owned records behind (an
    /// out-of-band admin deletion).
    pub fn purge_user(&self, user_id: u64) -> bool {
        match self.inner.users.remove(&user_id) {
            Some((_, user)) => {
                self.inner.emails.remove(&user.email.to_lowercase());
                true
            }
            None => false,
        }
    }

    /// Total number of stored content records.
    pub fn content_count(&self) -> usize {
        self.inner.content.len()
    }

    /// Look up a reminder by ID.
    pub fn get_reminder(&self, reminder_id: &str) -> Option<Reminder> {
        self.inner
            .reminders
            .get(reminder_id)
            .map(|r| r.value().clone())
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let _guard = self.inner.write_lock.lock().await;

        match self.inner.emails.entry(user.email.to_lowercase()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "User with email {} already exists",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.user_id);
                self.inner.users.insert(user.user_id, user.clone());
                Ok(())
            }
        }
    }

    async fn get_user(&self, user_id: u64) -> Result<Option<User>> {
        Ok(self.inner.users.get(&user_id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user_id = match self.inner.emails.get(&email.to_lowercase()) {
            Some(id) => *id.value(),
            None => return Ok(None),
        };
        self.get_user(user_id).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .inner
            .users
            .iter()
            .map(|u| u.value().clone())
            .collect();
        users.sort_by_key(|u| u.user_id);
        Ok(users)
    }

    async fn delete_user_data(&self, user_id: u64) -> Result<usize> {
        let _guard = self.inner.write_lock.lock().await;
        let mut deleted_count = 0;

        let reminder_ids: Vec<String> = self
            .inner
            .reminders
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.key().clone())
            .collect();
        for id in &reminder_ids {
            self.inner.reminders.remove(id);
        }
        deleted_count += reminder_ids.len();

        let content_ids: Vec<String> = self
            .inner
            .content
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.key().clone())
            .collect();
        for id in &content_ids {
            self.inner.content.remove(id);
        }
        deleted_count += content_ids.len();

        for platform in Platform::ALL {
            if self
                .inner
                .accounts
                .remove(&PlatformAccount::doc_id(user_id, platform))
                .is_some()
            {
                deleted_count += 1;
            }
        }

        if let Some((_, user)) = self.inner.users.remove(&user_id) {
            self.inner.emails.remove(&user.email.to_lowercase());
            deleted_count += 1;
        }

        tracing::info!(user_id, deleted_count, "User data deletion complete");
        Ok(deleted_count)
    }
}

#[async_trait]
impl CredentialStore for MemoryDb {
    async fn get_account(
        &self,
        user_id: u64,
        platform: Platform,
    ) -> Result<Option<PlatformAccount>> {
        Ok(self
            .inner
            .accounts
            .get(&PlatformAccount::doc_id(user_id, platform))
            .map(|a| a.value().clone()))
    }

    async fn list_accounts(&self, user_id: u64) -> Result<Vec<PlatformAccount>> {
        let mut accounts: Vec<PlatformAccount> = self
            .inner
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.value().clone())
            .collect();
        accounts.sort_by_key(|a| a.platform);
        Ok(accounts)
    }

    async fn upsert_account(&self, account: &PlatformAccount) -> Result<()> {
        self.inner.accounts.insert(
            PlatformAccount::doc_id(account.user_id, account.platform),
            account.clone(),
        );
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryDb {
    async fn get_content(&self, content_id: &str) -> Result<Option<SavedContent>> {
        Ok(self
            .inner
            .content
            .get(content_id)
            .map(|c| c.value().clone()))
    }

    async fn list_content(
        &self,
        user_id: u64,
        platform: Option<Platform>,
    ) -> Result<Vec<SavedContent>> {
        let mut items: Vec<SavedContent> = self
            .inner
            .content
            .iter()
            .filter(|c| c.user_id == user_id && platform.map_or(true, |p| c.platform == p))
            .map(|c| c.value().clone())
            .collect();
        items.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(items)
    }

    async fn insert_new_content(&self, items: &[SavedContent]) -> Result<usize> {
        let _guard = self.inner.write_lock.lock().await;
        let mut inserted = 0;

        for item in items {
            if let Entry::Vacant(slot) = self.inner.content.entry(item.id.clone()) {
                slot.insert(item.clone());
                inserted += 1;
            }
        }

        Ok(inserted)
    }
}

#[async_trait]
impl ReminderStore for MemoryDb {
    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        let _guard = self.inner.write_lock.lock().await;

        match self.inner.reminders.entry(reminder.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "Reminder {} already exists",
                reminder.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(reminder.clone());
                Ok(())
            }
        }
    }

    async fn list_reminders(&self, user_id: u64) -> Result<Vec<Reminder>> {
        let mut reminders: Vec<Reminder> = self
            .inner
            .reminders
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        reminders.sort_by_key(|r| r.reminder_time);
        Ok(reminders)
    }

    async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        Ok(self
            .inner
            .reminders
            .iter()
            .filter(|r| r.is_due(now))
            .map(|r| r.value().clone())
            .collect())
    }

    async fn update_reminder_statuses(&self, updates: &[(String, ReminderStatus)]) -> Result<()> {
        let _guard = self.inner.write_lock.lock().await;

        for (reminder_id, status) in updates {
            match self.inner.reminders.get_mut(reminder_id) {
                Some(mut reminder) => reminder.status = *status,
                None => {
                    tracing::warn!(reminder_id = %reminder_id, "Reminder vanished before status update");
                }
            }
        }

        Ok(())
    }
}
