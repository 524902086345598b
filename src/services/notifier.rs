// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-effort notification dispatch.
//!
//! Each notification runs as a detached tokio task. The request path never
//! awaits it. Failures are logged and dropped; there is no retry.

use crate::error::AppError;
use crate::mail::{Mailer, OutgoingEmail};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Which lifecycle step a notification belongs to (for logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Verification,
    ResendVerification,
    PasswordReset,
    RegistrationConfirmed,
    RegistrationCancelled,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Verification => "verification",
            NotificationKind::ResendVerification => "resend_verification",
            NotificationKind::PasswordReset => "password_reset",
            NotificationKind::RegistrationConfirmed => "registration_confirmed",
            NotificationKind::RegistrationCancelled => "registration_cancelled",
        }
    }
}

/// Fire-and-forget email dispatcher sharing one mail transport.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Send `email` in the background.
    ///
    /// The returned handle may be dropped; it exists so tests can wait for
    /// delivery. The task itself never panics on mail failure.
    pub fn dispatch(&self, kind: NotificationKind, email: OutgoingEmail) -> JoinHandle<()> {
        self.dispatch_with(kind, async move { Ok(Some(email)) })
    }

    /// Build the email inside the background task, then send it.
    ///
    /// `prepare` runs off the request path, so any lookups it does are not
    /// awaited by the caller. `Ok(None)` means there is nothing to send.
    pub fn dispatch_with<F>(&self, kind: NotificationKind, prepare: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<Option<OutgoingEmail>, AppError>> + Send + 'static,
    {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            let email = match prepare.await {
                Ok(Some(email)) => email,
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(
                        kind = kind.as_str(),
                        error = %e,
                        "Failed to prepare notification, skipping"
                    );
                    return;
                }
            };

            match mailer.send(email).await {
                Ok(()) => tracing::debug!(kind = kind.as_str(), "Notification sent"),
                Err(e) => tracing::warn!(
                    kind = kind.as_str(),
                    error = %e,
                    "Notification failed, continuing anyway"
                ),
            }
        })
    }
}
