// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod adapter;
pub mod dispatch;
pub mod fleet;
pub mod mock_adapter;
pub mod normalize;
pub mod notifier;
pub mod oauth;
pub mod reminders;
pub mod remote_adapter;
pub mod sync;

pub use accounts::{AccountService, EmailForm};
pub use adapter::{AdapterRegistry, FetchCause, FetchError, PlatformAdapter};
pub use dispatch::{ProcessReport, ReminderMessage, ReminderProcessor};
pub use fleet::{FleetReport, FleetScheduler, PairFailure, SyncPair};
pub use mock_adapter::MockAdapter;
pub use notifier::{LogNotifier, Notifier, SendError};
pub use oauth::{MockTokenExchange, OAuthError, TokenExchange, TokenGrant};
pub use reminders::{ReminderError, ReminderService, ReminderView};
pub use remote_adapter::RemoteAdapter;
pub use sync::{SyncError, SyncOutcome, SyncPipeline};
