// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTML bodies for the lifecycle notifications.

use super::OutgoingEmail;
use crate::models::Event;
use html_escape::{encode_double_quoted_attribute, encode_text};

fn link(url: &str) -> String {
    format!(
        r#"<a href="{}">{}</a>"#,
        encode_double_quoted_attribute(url),
        encode_text(url)
    )
}

/// Link target for email verification.
pub fn verification_url(frontend_url: &str, token: &str) -> String {
    format!("{}/verify/{}", frontend_url, token)
}

/// Link target for password reset.
pub fn reset_url(frontend_url: &str, token: &str) -> String {
    format!("{}/reset-password/{}", frontend_url, token)
}

pub fn verification(to: &str, frontend_url: &str, token: &str) -> OutgoingEmail {
    let url = verification_url(frontend_url, token);
    OutgoingEmail {
        to: to.to_string(),
        subject: "Verify your email".to_string(),
        html_body: format!(
            "<h3>Email Verification</h3>\n\
             <p>Click the link below to verify your email:</p>\n\
             {}\n\
             <p>This link expires in 24 hours.</p>",
            link(&url)
        ),
    }
}

pub fn resend_verification(to: &str, frontend_url: &str, token: &str) -> OutgoingEmail {
    let url = verification_url(frontend_url, token);
    OutgoingEmail {
        to: to.to_string(),
        subject: "Resend: Verify your email".to_string(),
        html_body: format!("<h3>Email Verification</h3>\n{}", link(&url)),
    }
}

pub fn password_reset(to: &str, frontend_url: &str, token: &str) -> OutgoingEmail {
    let url = reset_url(frontend_url, token);
    OutgoingEmail {
        to: to.to_string(),
        subject: "Password Reset Request".to_string(),
        html_body: format!(
            "<h3>Password Reset</h3>\n\
             {}\n\
             <p>This link expires in 1 hour.</p>",
            link(&url)
        ),
    }
}

pub fn registration_confirmed(to: &str, event: &Event) -> OutgoingEmail {
    let name = event.display_name();
    let field = |value: &Option<String>| encode_text(value.as_deref().unwrap_or("TBA")).into_owned();
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("Registration Confirmed: {}", name),
        html_body: format!(
            "<h3>You have successfully registered for {}</h3>\n\
             <p><strong>Date:</strong> {}</p>\n\
             <p><strong>Time:</strong> {}</p>\n\
             <p><strong>Venue:</strong> {}</p>\n\
             <p>We look forward to seeing you there!</p>",
            encode_text(name),
            field(&event.date),
            field(&event.time),
            field(&event.venue),
        ),
    }
}

pub fn registration_cancelled(to: &str, event: &Event) -> OutgoingEmail {
    let name = event.display_name();
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("Registration Cancelled: {}", name),
        html_body: format!(
            "<h3>You have successfully unregistered from {}</h3>\n\
             <p>If this was a mistake, you can register again at any time.</p>",
            encode_text(name)
        ),
    }
}
