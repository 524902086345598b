// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event registration routes.

use super::events::EventResponse;
use super::{MessageResponse, ValidatedJson};
use crate::error::Result;
use crate::models::Registration;
use crate::services::registration::{Attendee, RegistrationWithEvent, RegistrationWithUser};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register-event", post(register_event))
        .route("/unregister-event", post(unregister_event))
        .route("/my-registrations/{user_id}", get(my_registrations))
        .route("/event-registrations/{event_id}", get(event_registrations))
}

// ─── Request / Response Types ────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    user_id: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    event_id: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub registered_at: String,
}

impl From<Registration> for RegistrationResponse {
    fn from(registration: Registration) -> Self {
        Self {
            id: registration.id,
            user_id: registration.user_id,
            event_id: registration.event_id,
            registered_at: registration.registered_at,
        }
    }
}

#[derive(Serialize)]
pub struct RegisterEventResponse {
    pub message: String,
    pub result: RegistrationResponse,
}

/// A user's registration; `eventId` holds the event itself, or null if it
/// no longer exists.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistrationResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub event_id: Option<EventResponse>,
    pub registered_at: String,
}

impl From<RegistrationWithEvent> for UserRegistrationResponse {
    fn from(item: RegistrationWithEvent) -> Self {
        Self {
            id: item.registration.id,
            user_id: item.registration.user_id,
            event_id: item.event.map(EventResponse::from),
            registered_at: item.registration.registered_at,
        }
    }
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AttendeeResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<Attendee> for AttendeeResponse {
    fn from(attendee: Attendee) -> Self {
        Self {
            id: attendee.id,
            name: attendee.name,
            email: attendee.email,
        }
    }
}

/// An event's registration; `userId` holds the attendee, or null if the
/// account no longer exists.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistrationResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: Option<AttendeeResponse>,
    pub event_id: String,
    pub registered_at: String,
}

impl From<RegistrationWithUser> for EventRegistrationResponse {
    fn from(item: RegistrationWithUser) -> Self {
        Self {
            id: item.registration.id,
            user_id: item.user.map(AttendeeResponse::from),
            event_id: item.registration.event_id,
            registered_at: item.registration.registered_at,
        }
    }
}

// ─── Handlers ────────────────────────────────────────────────

async fn register_event(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegistrationRequest>,
) -> Result<Json<RegisterEventResponse>> {
    let registration = state
        .registrations
        .register(&req.user_id, &req.event_id)
        .await?;

    Ok(Json(RegisterEventResponse {
        message: "Registered successfully".to_string(),
        result: registration.into(),
    }))
}

async fn unregister_event(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegistrationRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .registrations
        .unregister(&req.user_id, &req.event_id)
        .await?;
    Ok(MessageResponse::new("Unregistered successfully"))
}

async fn my_registrations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<UserRegistrationResponse>>> {
    let items = state.registrations.list_for_user(&user_id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

async fn event_registrations(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<EventRegistrationResponse>>> {
    let items = state.registrations.list_for_event(&event_id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration::new("u1", "e1", "2026-03-01T10:00:00Z".to_string())
    }

    #[test]
    fn test_dangling_event_serializes_as_null() {
        let body = serde_json::to_value(UserRegistrationResponse::from(RegistrationWithEvent {
            registration: registration(),
            event: None,
        }))
        .unwrap();

        assert_eq!(body["userId"], "u1");
        assert!(body["eventId"].is_null());
        assert_eq!(body["registeredAt"], "2026-03-01T10:00:00Z");
    }

    #[test]
    fn test_attendee_omits_everything_but_name_and_email() {
        let body = serde_json::to_value(EventRegistrationResponse::from(RegistrationWithUser {
            registration: registration(),
            user: Some(Attendee {
                id: "u1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            }),
        }))
        .unwrap();

        assert_eq!(
            body["userId"],
            serde_json::json!({"_id": "u1", "name": "Ada", "email": "ada@example.com"})
        );
        assert_eq!(body["eventId"], "e1");
    }
}
