// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod content;
pub mod platform;
pub mod reminder;
pub mod user;

pub use content::{NormalizedItem, SavedContent};
pub use platform::{ContentType, Platform, UnknownPlatform};
pub use reminder::{Reminder, ReminderStatus};
pub use user::{PlatformAccount, User};
