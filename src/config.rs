// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything here describes external collaborators (document store, mail
//! relay, frontend links). It is read once at startup.

use std::env;
use std::time::Duration;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 465;
const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;

/// SMTP relay settings. Present only when credentials are configured.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender address for outgoing mail
    pub from: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend base URL used in links embedded in emails
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// GCP project ID; `None` selects the in-memory store
    pub gcp_project_id: Option<String>,
    /// Mail relay; `None` selects the in-memory outbox
    pub smtp: Option<SmtpConfig>,
    /// Requests allowed per client within one window
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    /// Key rate limits on the first `X-Forwarded-For` hop instead of the
    /// peer address. Only safe behind a proxy that overwrites the header.
    pub trust_proxy: bool,
}

impl Config {
    /// Config for tests: in-memory store, no SMTP, generous rate limit.
    pub fn test_default() -> Self {
        Self {
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            port: 8080,
            gcp_project_id: None,
            smtp: None,
            rate_limit_max: 10_000,
            rate_limit_window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            trust_proxy: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = parse_var("PORT", DEFAULT_PORT)?;
        let rate_limit_max = parse_var("RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX)?;
        let rate_limit_window_secs =
            parse_var("RATE_LIMIT_WINDOW_SECS", DEFAULT_RATE_LIMIT_WINDOW_SECS)?;
        let trust_proxy = parse_var("TRUST_PROXY", false)?;

        let smtp = match (non_empty_var("EMAIL_USER"), non_empty_var("EMAIL_PASS")) {
            (Some(username), Some(password)) => Some(SmtpConfig {
                host: non_empty_var("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port: parse_var("SMTP_PORT", DEFAULT_SMTP_PORT)?,
                from: non_empty_var("EMAIL_FROM").unwrap_or_else(|| username.clone()),
                username,
                password: password.trim().to_string(),
            }),
            (None, None) => None,
            (None, Some(_)) => return Err(ConfigError::Missing("EMAIL_USER")),
            (Some(_), None) => return Err(ConfigError::Missing("EMAIL_PASS")),
        };

        Ok(Self {
            frontend_url: non_empty_var("FRONTEND_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            port,
            gcp_project_id: non_empty_var("GCP_PROJECT_ID"),
            smtp,
            rate_limit_max,
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
            trust_proxy,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
