// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-use email tokens embedded in user records.

use chrono::{DateTime, Duration, Utc};

/// What a token proves possession of. The two purposes never share fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl TokenPurpose {
    /// How long an issued token stays valid.
    pub fn ttl(self) -> Duration {
        match self {
            TokenPurpose::EmailVerification => Duration::hours(24),
            TokenPurpose::PasswordReset => Duration::hours(1),
        }
    }

    /// Stored field holding the token value.
    pub fn token_field(self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "verification_token",
            TokenPurpose::PasswordReset => "reset_password_token",
        }
    }

    /// Stored field holding the token expiry.
    pub fn expires_field(self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "verification_token_expires",
            TokenPurpose::PasswordReset => "reset_password_expires",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "email_verification",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

/// A token value together with its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct ExpiringToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ExpiringToken {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

// Keep token values out of logs.
impl std::fmt::Debug for ExpiringToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Change applied to the user in the same write that clears a consumed token.
#[derive(Clone)]
pub enum TokenEffect {
    MarkVerified,
    SetPasswordHash(String),
}

impl std::fmt::Debug for TokenEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenEffect::MarkVerified => f.write_str("MarkVerified"),
            TokenEffect::SetPasswordHash(_) => f.write_str("SetPasswordHash(<redacted>)"),
        }
    }
}
