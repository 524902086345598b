// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory mailer used when no SMTP relay is configured, and in tests.

use super::{MailError, Mailer, OutgoingEmail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Records every message instead of delivering it.
#[derive(Clone, Default)]
pub struct OutboxMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    fail: Arc<AtomicBool>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail (for exercising best-effort paths).
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the messages accepted so far.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Messages addressed to `to`.
    pub fn sent_to(&self, to: &str) -> Vec<OutgoingEmail> {
        self.sent().into_iter().filter(|m| m.to == to).collect()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Transport("outbox set to fail".to_string()));
        }
        tracing::debug!(to = %email.to, subject = %email.subject, "Email stored in outbox");
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("outbox lock poisoned".to_string()))?
            .push(email);
        Ok(())
    }
}
