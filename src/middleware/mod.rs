// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (rate limiting, security headers).

pub mod rate_limit;
pub mod security;

pub use rate_limit::{rate_limit, RateLimiter};
