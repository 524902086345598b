// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: sign-up, login, email verification, password reset.

use super::{MessageResponse, ValidatedJson};
use crate::error::Result;
use crate::models::{Role, User};
use crate::services::NewAccount;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
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
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify/{token}", get(verify_email))
        .route("/resend-verification", post(resend_verification))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/{token}", post(reset_password))
}

// ─── Request / Response Types ────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    name: String,
    #[serde(default)]
    #[validate(email)]
    email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    password: String,
    #[serde(default)]
    role: Option<Role>,
}

/// Login fields are optional here so a missing one gets the service's
/// "Enter all credentials" error rather than a parse error.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct EmailRequest {
    #[serde(default)]
    #[validate(email)]
    email: String,
}

#[derive(Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    password: String,
}

/// User as returned to clients. Never includes the password hash or tokens.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

// ─── Handlers ────────────────────────────────────────────────

/// Create an account and send the verification email.
async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    state
        .accounts
        .register(NewAccount {
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role.unwrap_or_default(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        MessageResponse::new("User created successfully. Please verify your email."),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let user = state
        .accounts
        .login(req.email.as_deref(), req.password.as_deref())
        .await?;
    Ok(Json(user.into()))
}

async fn verify_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.accounts.verify_email(&token).await?;
    Ok(MessageResponse::new("Email verified successfully"))
}

async fn resend_verification(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<EmailRequest>,
) -> Result<Json<MessageResponse>> {
    state.accounts.resend_verification(&req.email).await?;
    Ok(MessageResponse::new("Verification email sent"))
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<EmailRequest>,
) -> Result<Json<MessageResponse>> {
    state.accounts.forgot_password(&req.email).await?;
    Ok(MessageResponse::new("Password reset link sent to your email"))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    state.accounts.reset_password(&token, &req.password).await?;
    Ok(MessageResponse::new("Password reset successfully"))
}
