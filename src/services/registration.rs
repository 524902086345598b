// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event registration workflow.
//!
//! Each (user, event) pair is either unregistered or registered, with at
//! most one registration document per pair. Confirmation and cancellation
//! emails are best-effort: once the store write succeeds, nothing about
//! notification can fail or undo the operation.

use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::mail::{templates, OutgoingEmail};
use crate::models::{Event, Registration, User};
use crate::services::notifier::{NotificationKind, Notifier};
use crate::time_utils::format_utc_rfc3339;
use futures_util::{stream, StreamExt};
use std::sync::Arc;

const MAX_CONCURRENT_LOOKUPS: usize = 16;

/// Registration state of a (user, event) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    Registered,
}

/// Public part of a user shown in an event's attendee list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<User> for Attendee {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// A user's registration with its event resolved (`None` if dangling).
#[derive(Debug, Clone)]
pub struct RegistrationWithEvent {
    pub registration: Registration,
    pub event: Option<Event>,
}

/// An event's registration with its user resolved (`None` if dangling).
#[derive(Debug, Clone)]
pub struct RegistrationWithUser {
    pub registration: Registration,
    pub user: Option<Attendee>,
}

#[derive(Clone)]
pub struct RegistrationService {
    db: Arc<dyn DocumentStore>,
    notifier: Notifier,
}

impl RegistrationService {
    pub fn new(db: Arc<dyn DocumentStore>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    pub async fn state(&self, user_id: &str, event_id: &str) -> Result<RegistrationState> {
        Ok(match self.db.find_registration(user_id, event_id).await? {
            Some(_) => RegistrationState::Registered,
            None => RegistrationState::Unregistered,
        })
    }

    /// Register the user for the event.
    ///
    /// Fails with `Conflict` if the pair is already registered. Neither the
    /// user nor the event has to exist; if either is missing the
    /// confirmation email is skipped.
    pub async fn register(&self, user_id: &str, event_id: &str) -> Result<Registration> {
        if self.state(user_id, event_id).await? == RegistrationState::Registered {
            return Err(crate::db::already_registered());
        }

        // The check above gives the clean error; the create-only insert is
        // what actually keeps concurrent registrations from duplicating.
        let registration =
            Registration::new(user_id, event_id, format_utc_rfc3339(chrono::Utc::now()));
        self.db.insert_registration(&registration).await?;

        tracing::info!(user_id, event_id, "User registered for event");

        self.notify(
            NotificationKind::RegistrationConfirmed,
            user_id,
            event_id,
            templates::registration_confirmed,
        );

        Ok(registration)
    }

    /// Cancel the user's registration. Fails with `NotFound` if there was none.
    pub async fn unregister(&self, user_id: &str, event_id: &str) -> Result<Registration> {
        let registration = self
            .db
            .delete_registration(user_id, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))?;

        tracing::info!(user_id, event_id, "User unregistered from event");

        self.notify(
            NotificationKind::RegistrationCancelled,
            user_id,
            event_id,
            templates::registration_cancelled,
        );

        Ok(registration)
    }

    /// All registrations of a user, each with its event.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<RegistrationWithEvent>> {
        let registrations = self.db.registrations_for_user(user_id).await?;
        let db = &self.db;

        Ok(stream::iter(registrations)
            .map(|registration| async move {
                let event = db
                    .find_event(&registration.event_id)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(
                            event_id = %registration.event_id,
                            error = %e,
                            "Failed to resolve event for registration"
                        );
                        None
                    });
                RegistrationWithEvent {
                    registration,
                    event,
                }
            })
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await)
    }

    /// All registrations for an event, each with the attendee's name and email.
    pub async fn list_for_event(&self, event_id: &str) -> Result<Vec<RegistrationWithUser>> {
        let registrations = self.db.registrations_for_event(event_id).await?;
        let db = &self.db;

        Ok(stream::iter(registrations)
            .map(|registration| async move {
                let user = db
                    .find_user(&registration.user_id)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(
                            user_id = %registration.user_id,
                            error = %e,
                            "Failed to resolve user for registration"
                        );
                        None
                    });
                RegistrationWithUser {
                    registration,
                    user: user.map(Attendee::from),
                }
            })
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await)
    }

    /// Dispatch a notification for the pair. User and event are resolved in
    /// the background task, so this returns immediately and never fails.
    fn notify(
        &self,
        kind: NotificationKind,
        user_id: &str,
        event_id: &str,
        render: fn(&str, &Event) -> OutgoingEmail,
    ) {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        let event_id = event_id.to_string();

        self.notifier.dispatch_with(kind, async move {
            let user = db.find_user(&user_id).await?;
            let event = db.find_event(&event_id).await?;

            match user.zip(event) {
                Some((user, event)) => Ok(Some(render(&user.email, &event))),
                None => {
                    tracing::debug!(
                        %user_id,
                        %event_id,
                        kind = kind.as_str(),
                        "User or event missing, skipping notification"
                    );
                    Ok(None)
                }
            }
        });
    }
}
