// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile, password hash, email tokens)
//! - Events (catalog)
//! - Registrations (join collection keyed by the user/event pair)

use super::{already_registered, collections, DocumentStore};
use crate::error::AppError;
use crate::models::{
    Event, EventFields, ExpiringToken, Registration, TokenEffect, TokenPurpose, User,
};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // The emulator accepts any bearer token; an unsigned JWT avoids a
        // custom TokenSource implementation.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    async fn write_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn write_event(&self, event: &Event) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::EVENTS)
            .document_id(&event.id)
            .object(event)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn registrations_where(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<Vec<Registration>, AppError> {
        let value = value.to_string();
        let mut registrations: Vec<Registration> = self
            .client
            .fluent()
            .select()
            .from(collections::REGISTRATIONS)
            .filter(move |q| q.field(field).eq(value.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted here rather than in the query to avoid a composite index.
        registrations.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(registrations)
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataConflictError(_) => {
                    AppError::Conflict("User already exists".to_string())
                }
                other => AppError::Database(other.to_string()),
            })?;
        Ok(())
    }

    async fn set_user_token(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
        token: Option<&ExpiringToken>,
    ) -> Result<(), AppError> {
        // Fetch-modify-write to preserve the other fields.
        let mut user = self
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.set_token(purpose, token);
        self.write_user(&user).await
    }

    async fn consume_user_token(
        &self,
        purpose: TokenPurpose,
        token: &str,
        now: DateTime<Utc>,
        effect: &TokenEffect,
    ) -> Result<Option<User>, AppError> {
        let token_value = token.to_string();
        let now_str = format_utc_rfc3339(now);

        let candidates: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| {
                q.for_all([
                    q.field(purpose.token_field()).eq(token_value.clone()),
                    q.field(purpose.expires_field())
                        .greater_than(now_str.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(mut user) = candidates.into_iter().next() else {
            return Ok(None);
        };

        // NOTE: query and write are separate calls, so two concurrent
        // consumers of the same token can both get here before either write
        // lands. MemoryDb closes this window; Firestore would need an
        // update-time precondition on the write.
        if !user.has_live_token(purpose, token, now) {
            return Ok(None);
        }
        user.consume_token(purpose, effect);
        self.write_user(&user).await?;

        Ok(Some(user))
    }

    // ─── Event Operations ────────────────────────────────────────

    async fn insert_event(&self, event: &Event) -> Result<(), AppError> {
        self.write_event(event).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::EVENTS)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::EVENTS)
            .obj()
            .one(event_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_event(
        &self,
        event_id: &str,
        changes: &EventFields,
    ) -> Result<Option<Event>, AppError> {
        let Some(mut event) = self.find_event(event_id).await? else {
            return Ok(None);
        };
        if event.apply(changes) {
            self.write_event(&event).await?;
        }
        Ok(Some(event))
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool, AppError> {
        if self.find_event(event_id).await?.is_none() {
            return Ok(false);
        }
        self.client
            .fluent()
            .delete()
            .from(collections::EVENTS)
            .document_id(event_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    // ─── Registration Operations ─────────────────────────────────

    async fn find_registration(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Registration>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::REGISTRATIONS)
            .obj()
            .one(&Registration::doc_id(user_id, event_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_registration(&self, registration: &Registration) -> Result<(), AppError> {
        // Create-only: Firestore rejects the write if the pair's document exists.
        let _: () = self
            .client
            .fluent()
            .insert()
            .into(collections::REGISTRATIONS)
            .document_id(&registration.id)
            .object(registration)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataConflictError(_) => already_registered(),
                other => AppError::Database(other.to_string()),
            })?;
        Ok(())
    }

    async fn delete_registration(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Registration>, AppError> {
        let Some(registration) = self.find_registration(user_id, event_id).await? else {
            return Ok(None);
        };
        self.client
            .fluent()
            .delete()
            .from(collections::REGISTRATIONS)
            .document_id(&registration.id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(Some(registration))
    }

    async fn registrations_for_user(&self, user_id: &str) -> Result<Vec<Registration>, AppError> {
        self.registrations_where("user_id", user_id).await
    }

    async fn registrations_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<Registration>, AppError> {
        self.registrations_where("event_id", event_id).await
    }
}
