// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account workflow: sign-up, login, email verification and password reset.

use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::mail::templates;
use crate::models::{Role, TokenEffect, TokenPurpose, User};
use crate::services::notifier::{NotificationKind, Notifier};
use crate::services::password::{hash_password, verify_password};
use crate::services::tokens::TokenManager;
use crate::time_utils::format_utc_rfc3339;
use std::sync::Arc;

/// Input for creating an account.
#[derive(Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<dyn DocumentStore>,
    tokens: TokenManager,
    notifier: Notifier,
    frontend_url: String,
}

impl AccountService {
    pub fn new(
        db: Arc<dyn DocumentStore>,
        tokens: TokenManager,
        notifier: Notifier,
        frontend_url: String,
    ) -> Self {
        Self {
            db,
            tokens,
            notifier,
            frontend_url,
        }
    }

    /// Create an unverified account and send the verification email.
    ///
    /// Succeeds even if the email can't be delivered.
    pub async fn register(&self, account: NewAccount) -> Result<User> {
        let email = account.email.trim().to_string();

        if self.db.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let verification = TokenManager::mint(TokenPurpose::EmailVerification)?;
        let mut user = User {
            id: crate::random::new_id()?,
            name: account.name.trim().to_string(),
            email,
            password_hash: hash_password(&account.password).await?,
            role: account.role,
            is_verified: false,
            verification_token: None,
            verification_token_expires: None,
            reset_password_token: None,
            reset_password_expires: None,
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };
        user.set_token(TokenPurpose::EmailVerification, Some(&verification));

        self.db.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, role = ?user.role, "User registered");

        self.notifier.dispatch(
            NotificationKind::Verification,
            templates::verification(&user.email, &self.frontend_url, &verification.token),
        );

        Ok(user)
    }

    /// Check credentials. Unverified accounts are refused before the
    /// password is checked.
    pub async fn login(&self, email: Option<&str>, password: Option<&str>) -> Result<User> {
        let (Some(email), Some(password)) = (
            email.map(str::trim).filter(|e| !e.is_empty()),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::BadRequest("Enter all credentials".to_string()));
        };

        let user = self
            .db
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("No user found".to_string()))?;

        if !user.is_verified {
            return Err(AppError::Forbidden(
                "Email not verified. Please check your inbox.".to_string(),
            ));
        }

        if !verify_password(password, &user.password_hash).await? {
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::Unauthorized);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    pub async fn verify_email(&self, token: &str) -> Result<()> {
        self.tokens
            .consume(
                TokenPurpose::EmailVerification,
                token,
                TokenEffect::MarkVerified,
            )
            .await?;
        Ok(())
    }

    /// Issue a new verification token and email it.
    pub async fn resend_verification(&self, email: &str) -> Result<()> {
        let user = self.find_by_email(email).await?;

        if user.is_verified {
            return Err(AppError::BadRequest("Email already verified".to_string()));
        }

        let token = self
            .tokens
            .issue(&user.id, TokenPurpose::EmailVerification)
            .await?;

        self.notifier.dispatch(
            NotificationKind::ResendVerification,
            templates::resend_verification(&user.email, &self.frontend_url, &token.token),
        );
        Ok(())
    }

    /// Issue a password reset token and email it.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let user = self.find_by_email(email).await?;

        let token = self
            .tokens
            .issue(&user.id, TokenPurpose::PasswordReset)
            .await?;

        self.notifier.dispatch(
            NotificationKind::PasswordReset,
            templates::password_reset(&user.email, &self.frontend_url, &token.token),
        );
        Ok(())
    }

    /// Set a new password using a reset token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(AppError::BadRequest("Password is required".to_string()));
        }

        // Hashed up front so the token is consumed and the hash stored in
        // the same write.
        let password_hash = hash_password(new_password).await?;

        self.tokens
            .consume(
                TokenPurpose::PasswordReset,
                token,
                TokenEffect::SetPasswordHash(password_hash),
            )
            .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<User> {
        self.db
            .find_user_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
