// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod event;
pub mod registration;
pub mod token;
pub mod user;

pub use event::{Event, EventFields};
pub use registration::Registration;
pub use token::{ExpiringToken, TokenEffect, TokenPurpose};
pub use user::{Role, User};
