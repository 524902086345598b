// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event catalog: plain CRUD plus search.
//!
//! Only delete is authorized (owner or admin). Update has no ownership
//! check, matching the existing client contract.

use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::{Event, EventFields, Role};
use crate::time_utils::format_utc_rfc3339;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// Upper bound on compiled search pattern size.
const SEARCH_PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Who is asking to delete an event.
#[derive(Debug, Clone)]
pub struct Requester {
    pub user_id: Option<String>,
    pub role: Role,
}

impl Requester {
    /// Admins may delete anything; others only events they created.
    pub fn may_delete(&self, event: &Event) -> bool {
        self.role == Role::Admin
            || matches!(
                (&self.user_id, &event.user_id),
                (Some(requester), Some(owner)) if requester == owner
            )
    }
}

#[derive(Clone)]
pub struct EventCatalog {
    db: Arc<dyn DocumentStore>,
}

impl EventCatalog {
    pub fn new(db: Arc<dyn DocumentStore>) -> Self {
        Self { db }
    }

    pub async fn create(&self, fields: EventFields) -> Result<Event> {
        let event = Event::new(
            crate::random::new_id()?,
            fields,
            format_utc_rfc3339(chrono::Utc::now()),
        );
        self.db.insert_event(&event).await?;

        tracing::info!(event_id = %event.id, owner = ?event.user_id, "Event created");
        Ok(event)
    }

    pub async fn list(&self) -> Result<Vec<Event>> {
        self.db.list_events().await
    }

    pub async fn get(&self, event_id: &str) -> Result<Event> {
        self.db
            .find_event(event_id)
            .await?
            .ok_or_else(|| event_not_found(event_id))
    }

    pub async fn update(&self, event_id: &str, changes: EventFields) -> Result<Event> {
        let event = self
            .db
            .update_event(event_id, &changes)
            .await?
            .ok_or_else(|| event_not_found(event_id))?;

        tracing::info!(event_id, "Event updated");
        Ok(event)
    }

    pub async fn delete(&self, event_id: &str, requester: &Requester) -> Result<()> {
        let event = self.get(event_id).await?;

        if !requester.may_delete(&event) {
            tracing::warn!(
                event_id,
                requester = ?requester.user_id,
                "Rejected event deletion by non-owner"
            );
            return Err(AppError::Forbidden(
                "Unauthorized to delete this event".to_string(),
            ));
        }

        if !self.db.delete_event(event_id).await? {
            // Deleted concurrently between the read and the delete.
            return Err(event_not_found(event_id));
        }

        tracing::info!(event_id, role = ?requester.role, "Event deleted");
        Ok(())
    }

    /// Events whose name, club, venue, category or date matches `key`.
    pub async fn search(&self, key: &str) -> Result<Vec<Event>> {
        let pattern = search_pattern(key)?;
        let events = self.db.list_events().await?;

        Ok(events
            .into_iter()
            .filter(|event| {
                event
                    .searchable_fields()
                    .iter()
                    .flatten()
                    .any(|value| pattern.is_match(value))
            })
            .collect())
    }
}

fn event_not_found(event_id: &str) -> AppError {
    AppError::NotFound(format!("Event {} not found", event_id))
}

/// Compile `key` as a regular expression, falling back to a literal match
/// when it isn't a valid pattern.
fn search_pattern(key: &str) -> Result<Regex> {
    let build = |pattern: &str| {
        RegexBuilder::new(pattern)
            .size_limit(SEARCH_PATTERN_SIZE_LIMIT)
            .build()
    };

    build(key)
        .or_else(|_| build(&regex::escape(key)))
        .map_err(|_| AppError::BadRequest("Search key is too complex".to_string()))
}
