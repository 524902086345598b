// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Club Events: accounts, an event catalog and event registrations for a
//! club portal.
//!
//! This crate provides the backend API. Accounts are verified by email;
//! registering for or leaving an event sends a best-effort notification.

pub mod config;
pub mod db;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod random;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use mail::Mailer;
use middleware::RateLimiter;
use services::{AccountService, EventCatalog, Notifier, RegistrationService, TokenManager};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn DocumentStore>,
    pub accounts: AccountService,
    pub registrations: RegistrationService,
    pub catalog: EventCatalog,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Wire up the services over one store and one mail transport.
    pub fn new(config: Config, db: Arc<dyn DocumentStore>, mailer: Arc<dyn Mailer>) -> Self {
        let notifier = Notifier::new(mailer);
        let tokens = TokenManager::new(db.clone());

        Self {
            accounts: AccountService::new(
                db.clone(),
                tokens,
                notifier.clone(),
                config.frontend_url.clone(),
            ),
            registrations: RegistrationService::new(db.clone(), notifier),
            catalog: EventCatalog::new(db.clone()),
            rate_limiter: RateLimiter::new(config.rate_limit_max, config.rate_limit_window)
                .trust_proxy(config.trust_proxy),
            config,
            db,
        }
    }
}
