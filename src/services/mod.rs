// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod catalog;
pub mod notifier;
pub mod password;
pub mod registration;
pub mod tokens;

pub use account::{AccountService, NewAccount};
pub use catalog::{EventCatalog, Requester};
pub use notifier::{NotificationKind, Notifier};
pub use registration::{RegistrationService, RegistrationState};
pub use tokens::TokenManager;
