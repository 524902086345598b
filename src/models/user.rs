// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage.

use super::token::{ExpiringToken, TokenEffect, TokenPurpose};
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User record stored in the `users` collection.
///
/// Each token field is paired with its expiry; both are set or both are
/// `None`. Mutate them only through [`User::set_token`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verification_token: Option<String>,
    #[serde(default)]
    pub verification_token_expires: Option<String>,
    #[serde(default)]
    pub reset_password_token: Option<String>,
    #[serde(default)]
    pub reset_password_expires: Option<String>,
    pub created_at: String,
}

impl User {
    /// Current token for `purpose`, if both halves of the pair are present.
    pub fn token(&self, purpose: TokenPurpose) -> Option<ExpiringToken> {
        let (token, expires) = match purpose {
            TokenPurpose::EmailVerification => {
                (&self.verification_token, &self.verification_token_expires)
            }
            TokenPurpose::PasswordReset => (&self.reset_password_token, &self.reset_password_expires),
        };
        Some(ExpiringToken {
            token: token.clone()?,
            expires_at: parse_utc_rfc3339(expires.as_deref()?)?,
        })
    }

    /// Replace (or clear with `None`) the token pair for `purpose`.
    pub fn set_token(&mut self, purpose: TokenPurpose, token: Option<&ExpiringToken>) {
        let value = token.map(|t| t.token.clone());
        let expires = token.map(|t| format_utc_rfc3339(t.expires_at));
        match purpose {
            TokenPurpose::EmailVerification => {
                self.verification_token = value;
                self.verification_token_expires = expires;
            }
            TokenPurpose::PasswordReset => {
                self.reset_password_token = value;
                self.reset_password_expires = expires;
            }
        }
    }

    /// True when `token` is the live token for `purpose` at `now`.
    pub fn has_live_token(&self, purpose: TokenPurpose, token: &str, now: DateTime<Utc>) -> bool {
        self.token(purpose)
            .is_some_and(|t| t.token == token && t.is_live(now))
    }

    /// Apply the consume effect and clear the token pair.
    pub fn consume_token(&mut self, purpose: TokenPurpose, effect: &TokenEffect) {
        match effect {
            TokenEffect::MarkVerified => self.is_verified = true,
            TokenEffect::SetPasswordHash(hash) => self.password_hash = hash.clone(),
        }
        self.set_token(purpose, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            is_verified: false,
            verification_token: None,
            verification_token_expires: None,
            reset_password_token: None,
            reset_password_expires: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_token_pairs_are_independent() {
        let mut user = user();
        let now = Utc::now();
        let token = ExpiringToken {
            token: "abc".to_string(),
            expires_at: now + Duration::hours(1),
        };
        user.set_token(TokenPurpose::PasswordReset, Some(&token));

        assert!(user.has_live_token(TokenPurpose::PasswordReset, "abc", now));
        assert!(!user.has_live_token(TokenPurpose::EmailVerification, "abc", now));
        assert!(user.token(TokenPurpose::EmailVerification).is_none());
    }

    #[test]
    fn test_consume_clears_both_fields() {
        let mut user = user();
        let now = Utc::now();
        let token = ExpiringToken {
            token: "abc".to_string(),
            expires_at: now + Duration::hours(24),
        };
        user.set_token(TokenPurpose::EmailVerification, Some(&token));
        user.consume_token(TokenPurpose::EmailVerification, &TokenEffect::MarkVerified);

        assert!(user.is_verified);
        assert!(user.verification_token.is_none());
        assert!(user.verification_token_expires.is_none());
    }

    #[test]
    fn test_expired_token_is_not_live() {
        let mut user = user();
        let now = Utc::now();
        let token = ExpiringToken {
            token: "abc".to_string(),
            expires_at: now - Duration::seconds(5),
        };
        user.set_token(TokenPurpose::PasswordReset, Some(&token));
        assert!(!user.has_live_token(TokenPurpose::PasswordReset, "abc", now));
    }
}
