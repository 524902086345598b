// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event model for storage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Event stored in the `events` collection.
///
/// The named fields are the ones the catalog searches and the mail templates
/// read. Anything else the client sends is kept verbatim in `details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Document ID
    pub id: String,
    /// Creator; compared against the requester on delete
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub club: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,
    pub created_at: String,
}

/// Field values for creating an event or partially updating one.
/// `None` leaves a field untouched on update.
#[derive(Debug, Clone, Default)]
pub struct EventFields {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub club: Option<String>,
    pub venue: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub details: BTreeMap<String, serde_json::Value>,
}

impl Event {
    pub fn new(id: String, fields: EventFields, created_at: String) -> Self {
        Self {
            id,
            user_id: fields.user_id,
            name: fields.name,
            club: fields.club,
            venue: fields.venue,
            category: fields.category,
            date: fields.date,
            time: fields.time,
            details: fields.details,
            created_at,
        }
    }

    /// Merge `changes` into this event, like a `$set` of the given keys.
    /// Returns whether anything changed.
    pub fn apply(&mut self, changes: &EventFields) -> bool {
        let mut changed = false;
        let mut set = |slot: &mut Option<String>, value: &Option<String>| {
            if value.is_some() && slot != value {
                *slot = value.clone();
                changed = true;
            }
        };
        set(&mut self.user_id, &changes.user_id);
        set(&mut self.name, &changes.name);
        set(&mut self.club, &changes.club);
        set(&mut self.venue, &changes.venue);
        set(&mut self.category, &changes.category);
        set(&mut self.date, &changes.date);
        set(&mut self.time, &changes.time);

        for (key, value) in &changes.details {
            if self.details.get(key) != Some(value) {
                self.details.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    /// Fields covered by catalog search, in search order.
    pub fn searchable_fields(&self) -> [Option<&str>; 5] {
        [
            self.name.as_deref(),
            self.club.as_deref(),
            self.venue.as_deref(),
            self.category.as_deref(),
            self.date.as_deref(),
        ]
    }

    /// Display name for notifications.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("your event")
    }
}
