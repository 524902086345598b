// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token manager for email verification and password reset.
//!
//! Tokens are 256-bit random hex strings stored in the purpose-specific
//! field pair of a user record. Issuing a new token overwrites the old one;
//! consuming a token applies its effect and clears the pair in one write.

use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::{ExpiringToken, TokenEffect, TokenPurpose, User};
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct TokenManager {
    db: Arc<dyn DocumentStore>,
}

impl TokenManager {
    pub fn new(db: Arc<dyn DocumentStore>) -> Self {
        Self { db }
    }

    /// Generate a token for `purpose` without storing it, for records that
    /// are written with their first token already in place.
    pub fn mint(purpose: TokenPurpose) -> Result<ExpiringToken> {
        Ok(ExpiringToken {
            token: crate::random::new_token()?,
            expires_at: Utc::now() + purpose.ttl(),
        })
    }

    /// Issue a fresh token for `purpose` on the user, invalidating any
    /// previous unconsumed one.
    ///
    /// The caller embeds the token in an email link; it must not be logged
    /// or returned in an HTTP response.
    pub async fn issue(&self, user_id: &str, purpose: TokenPurpose) -> Result<ExpiringToken> {
        let token = Self::mint(purpose)?;

        self.db
            .set_user_token(user_id, purpose, Some(&token))
            .await?;

        tracing::debug!(
            user_id,
            purpose = purpose.as_str(),
            expires_at = %token.expires_at,
            "Token issued"
        );

        Ok(token)
    }

    /// Consume a token: apply `effect` to the matching user and clear the
    /// token.
    ///
    /// Fails with [`AppError::InvalidToken`] whether the token is unknown,
    /// expired, or already used.
    pub async fn consume(
        &self,
        purpose: TokenPurpose,
        token: &str,
        effect: TokenEffect,
    ) -> Result<User> {
        if token.trim().is_empty() {
            return Err(AppError::InvalidToken);
        }

        let user = self
            .db
            .consume_user_token(purpose, token, Utc::now(), &effect)
            .await?
            .ok_or(AppError::InvalidToken)?;

        tracing::info!(
            user_id = %user.id,
            purpose = purpose.as_str(),
            "Token consumed"
        );

        Ok(user)
    }
}
