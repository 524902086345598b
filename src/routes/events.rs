// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event catalog routes.

use super::ValidatedJson;
use crate::error::{AppError, Result};
use crate::models::{Event, EventFields, Role};
use crate::services::Requester;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

/// Keys managed by the server; ignored if a client echoes them back.
const RESERVED_KEYS: &[&str] = &["_id", "id", "createdAt", "__v"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/add-event", post(add_event))
        .route("/events", get(list_events))
        .route(
            "/event/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/search/{key}", get(search_events))
}

// ─── Request / Response Types ────────────────────────────────

/// Event body for create and update. Unknown keys are kept as details.
#[derive(Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    user_id: Option<String>,
    name: Option<String>,
    club: Option<String>,
    venue: Option<String>,
    category: Option<String>,
    date: Option<String>,
    time: Option<String>,
    #[serde(flatten)]
    details: BTreeMap<String, serde_json::Value>,
}

impl From<EventRequest> for EventFields {
    fn from(req: EventRequest) -> Self {
        let mut details = req.details;
        details.retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));
        Self {
            user_id: req.user_id,
            name: req.name,
            club: req.club,
            venue: req.venue,
            category: req.category,
            date: req.date,
            time: req.time,
            details,
        }
    }
}

/// Optional delete body. Fields of the wrong type are treated as absent.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventRequest {
    #[serde(default)]
    user_id: Option<serde_json::Value>,
    #[serde(default)]
    user_role: Option<serde_json::Value>,
}

impl DeleteEventRequest {
    /// Parse a possibly empty body. Only malformed JSON is rejected.
    fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Failed to parse the request body: {}", e)))
    }

    /// Anything other than `"admin"` is an ordinary user.
    fn into_requester(self) -> Requester {
        let role = match self.user_role.as_ref().and_then(|r| r.as_str()) {
            Some("admin") => Role::Admin,
            _ => Role::User,
        };
        Requester {
            user_id: self
                .user_id
                .and_then(|id| id.as_str().map(str::to_string)),
            role,
        }
    }
}

/// Event as returned to clients, with extra fields inlined.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub created_at: String,
    #[serde(flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            name: event.name,
            club: event.club,
            venue: event.venue,
            category: event.category,
            date: event.date,
            time: event.time,
            created_at: event.created_at,
            details: event.details,
        }
    }
}

#[derive(Serialize)]
pub struct AddEventResponse {
    pub message: String,
    pub data: EventResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventResponse {
    pub deleted_count: u32,
}

// ─── Handlers ────────────────────────────────────────────────

async fn add_event(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<EventRequest>,
) -> Result<Json<AddEventResponse>> {
    let event = state.catalog.create(req.into()).await?;
    Ok(Json(AddEventResponse {
        message: "Event added successfully".to_string(),
        data: event.into(),
    }))
}

async fn list_events(State(state): State<Arc<AppState>>) -> Result<Json<Vec<EventResponse>>> {
    let events = state.catalog.list().await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>> {
    Ok(Json(state.catalog.get(&id).await?.into()))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<EventRequest>,
) -> Result<Json<EventResponse>> {
    Ok(Json(state.catalog.update(&id, req.into()).await?.into()))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<DeleteEventResponse>> {
    let requester = DeleteEventRequest::from_body(&body)?.into_requester();
    state.catalog.delete(&id, &requester).await?;
    Ok(Json(DeleteEventResponse { deleted_count: 1 }))
}

async fn search_events(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Vec<EventResponse>>> {
    let events = state.catalog.search(&key).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}
