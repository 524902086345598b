// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store for local development and tests.
//!
//! Every operation works on a single `DashMap` entry while holding its shard
//! lock, so token consumption and registration inserts are atomic here.

use super::{already_registered, DocumentStore};
use crate::error::AppError;
use crate::models::{
    Event, EventFields, ExpiringToken, Registration, TokenEffect, TokenPurpose, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory store. Cheap to clone; clones share data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
    events: Arc<DashMap<String, Event>>,
    registrations: Arc<DashMap<String, Registration>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDb {
    // ─── Users ───────────────────────────────────────────────────

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone()))
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("User already exists".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    async fn set_user_token(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
        token: Option<&ExpiringToken>,
    ) -> Result<(), AppError> {
        let mut user = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.set_token(purpose, token);
        Ok(())
    }

    async fn consume_user_token(
        &self,
        purpose: TokenPurpose,
        token: &str,
        now: DateTime<Utc>,
        effect: &TokenEffect,
    ) -> Result<Option<User>, AppError> {
        for mut user in self.users.iter_mut() {
            if user.has_live_token(purpose, token, now) {
                user.consume_token(purpose, effect);
                return Ok(Some(user.value().clone()));
            }
        }
        Ok(None)
    }

    // ─── Events ──────────────────────────────────────────────────

    async fn insert_event(&self, event: &Event) -> Result<(), AppError> {
        self.events.insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let mut events: Vec<Event> = self.events.iter().map(|e| e.value().clone()).collect();
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        Ok(self.events.get(event_id).map(|e| e.value().clone()))
    }

    async fn update_event(
        &self,
        event_id: &str,
        changes: &EventFields,
    ) -> Result<Option<Event>, AppError> {
        Ok(self.events.get_mut(event_id).map(|mut event| {
            event.apply(changes);
            event.value().clone()
        }))
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool, AppError> {
        Ok(self.events.remove(event_id).is_some())
    }

    // ─── Registrations ───────────────────────────────────────────

    async fn find_registration(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Registration>, AppError> {
        Ok(self
            .registrations
            .get(&Registration::doc_id(user_id, event_id))
            .map(|r| r.value().clone()))
    }

    async fn insert_registration(&self, registration: &Registration) -> Result<(), AppError> {
        match self.registrations.entry(registration.id.clone()) {
            Entry::Occupied(_) => Err(already_registered()),
            Entry::Vacant(slot) => {
                slot.insert(registration.clone());
                Ok(())
            }
        }
    }

    async fn delete_registration(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Registration>, AppError> {
        Ok(self
            .registrations
            .remove(&Registration::doc_id(user_id, event_id))
            .map(|(_, r)| r))
    }

    async fn registrations_for_user(&self, user_id: &str) -> Result<Vec<Registration>, AppError> {
        Ok(sorted(
            self.registrations
                .iter()
                .filter(|r| r.user_id == user_id)
                .map(|r| r.value().clone())
                .collect(),
        ))
    }

    async fn registrations_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<Registration>, AppError> {
        Ok(sorted(
            self.registrations
                .iter()
                .filter(|r| r.event_id == event_id)
                .map(|r| r.value().clone())
                .collect(),
        ))
    }
}

fn sorted(mut registrations: Vec<Registration>) -> Vec<Registration> {
    registrations.sort_by(|a, b| {
        a.registered_at
            .cmp(&b.registered_at)
            .then(a.id.cmp(&b.id))
    });
    registrations
}
