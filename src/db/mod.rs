// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`DocumentStore`] is the seam between the workflows and persistence.
//! Production uses Firestore; local development and tests use the
//! in-memory store.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{
    Event, EventFields, ExpiringToken, Registration, TokenEffect, TokenPurpose, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const EVENTS: &str = "events";
    pub const REGISTRATIONS: &str = "registrations";
}

/// Document store operations used by the workflows.
///
/// Individual document writes are atomic; nothing spans documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    /// Overwrite (or clear) the token pair for `purpose` on an existing user.
    /// Fails with `NotFound` if the user is gone.
    async fn set_user_token(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
        token: Option<&ExpiringToken>,
    ) -> Result<(), AppError>;

    /// Find the user whose `purpose` token equals `token` and expires after
    /// `now`, apply `effect` and clear the pair in one write.
    ///
    /// Returns the updated user, or `None` when nothing matched.
    async fn consume_user_token(
        &self,
        purpose: TokenPurpose,
        token: &str,
        now: DateTime<Utc>,
        effect: &TokenEffect,
    ) -> Result<Option<User>, AppError>;

    // ─── Events ──────────────────────────────────────────────────

    async fn insert_event(&self, event: &Event) -> Result<(), AppError>;

    async fn list_events(&self) -> Result<Vec<Event>, AppError>;

    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, AppError>;

    /// Merge `changes` into the event. Returns `None` if it doesn't exist.
    async fn update_event(
        &self,
        event_id: &str,
        changes: &EventFields,
    ) -> Result<Option<Event>, AppError>;

    /// Returns whether a document was deleted.
    async fn delete_event(&self, event_id: &str) -> Result<bool, AppError>;

    // ─── Registrations ───────────────────────────────────────────

    async fn find_registration(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Registration>, AppError>;

    /// Create-only insert. Fails with `Conflict` if the pair already exists.
    async fn insert_registration(&self, registration: &Registration) -> Result<(), AppError>;

    /// Delete the registration for the pair, returning it if it existed.
    async fn delete_registration(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Registration>, AppError>;

    async fn registrations_for_user(&self, user_id: &str) -> Result<Vec<Registration>, AppError>;

    async fn registrations_for_event(&self, event_id: &str)
        -> Result<Vec<Registration>, AppError>;
}

/// Conflict error used by both stores for duplicate registrations.
pub(crate) fn already_registered() -> AppError {
    AppError::Conflict("Already registered for this event".to_string())
}
