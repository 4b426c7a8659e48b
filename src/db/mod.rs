// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Services depend on the store traits below rather than on a concrete
//! backend. [`FirestoreDb`] is the production backend; [`MemoryDb`] keeps
//! everything in process and backs tests and local runs.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::Result;
use crate::models::{Platform, PlatformAccount, Reminder, ReminderStatus, SavedContent, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PLATFORM_ACCOUNTS: &str = "platform_accounts";
    pub const SAVED_CONTENT: &str = "saved_content";
    pub const REMINDERS: &str = "reminders";
}

/// User records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `AppError::Conflict` if the email is taken.
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, user_id: u64) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn list_users(&self) -> Result<Vec<User>>;

    /// Delete a user and everything the user owns: platform accounts, saved
    /// content and reminders. Returns the number of records removed.
    async fn delete_user_data(&self, user_id: u64) -> Result<usize>;
}

/// Linked platform credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_account(&self, user_id: u64, platform: Platform)
        -> Result<Option<PlatformAccount>>;

    async fn list_accounts(&self, user_id: u64) -> Result<Vec<PlatformAccount>>;

    /// Create or replace the single account for (user, platform).
    async fn upsert_account(&self, account: &PlatformAccount) -> Result<()>;
}

/// Normalized saved content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_content(&self, content_id: &str) -> Result<Option<SavedContent>>;

    /// Content for a user, newest `saved_at` first, optionally for one platform.
    async fn list_content(
        &self,
        user_id: u64,
        platform: Option<Platform>,
    ) -> Result<Vec<SavedContent>>;

    /// Insert every item whose ID is not already stored.
    ///
    /// Writes commit atomically, in units no larger than the backend's write
    /// limit. Existing records are never modified, and of two writers racing
    /// on one ID only one inserts it. Returns how many items were newly
    /// inserted.
    async fn insert_new_content(&self, items: &[SavedContent]) -> Result<usize>;
}

/// Reminder records.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()>;

    /// All reminders for a user, earliest `reminder_time` first.
    async fn list_reminders(&self, user_id: u64) -> Result<Vec<Reminder>>;

    /// Reminders still `scheduled` whose time is at or before `now`.
    async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>>;

    /// Apply a batch of status changes, atomically per write-limit chunk.
    /// Unknown IDs are skipped.
    async fn update_reminder_statuses(&self, updates: &[(String, ReminderStatus)]) -> Result<()>;
}

/// A backend implementing every store.
pub trait Storage: UserStore + CredentialStore + ContentStore + ReminderStore + 'static {}

impl<T> Storage for T where T: UserStore + CredentialStore + ContentStore + ReminderStore + 'static {}
