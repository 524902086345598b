// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account lifecycle tests through the HTTP API.
//!
//! These tests verify that:
//! 1. New accounts must verify their email before logging in
//! 2. Verification and reset tokens are single-use and expire
//! 3. Issuing a new token invalidates the previous one

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use club_events::db::DocumentStore;
use club_events::models::{ExpiringToken, TokenPurpose};
use serde_json::json;

mod common;
use common::{create_test_app, get, post, token_from_email, verified_user, wait_for_email};

#[tokio::test]
async fn test_register_verify_login() {
    let app = create_test_app();

    let (status, body) = post(
        &app.router,
        "/register",
        json!({"name": "Ada", "email": "ada@example.com", "password": "hunter22"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["message"],
        "User created successfully. Please verify your email."
    );

    // Unverified accounts can't log in, even with the right password
    let (status, body) = post(
        &app.router,
        "/login",
        json!({"email": "ada@example.com", "password": "hunter22"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let mail = wait_for_email(&app.outbox, "ada@example.com", "Verify your email").await;
    let token = token_from_email(&mail, "verify");
    assert_eq!(token.len(), 64);

    let (status, body) = get(&app.router, &format!("/verify/{}", token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email verified successfully");

    let (status, body) = post(
        &app.router,
        "/login",
        json!({"email": "ada@example.com", "password": "hunter22"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["role"], "user");
    assert_eq!(body["isVerified"], true);
    assert!(body.get("password_hash").is_none());
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("verificationToken").is_none());
}

#[tokio::test]
async fn test_verification_token_is_single_use() {
    let app = create_test_app();
    post(
        &app.router,
        "/register",
        json!({"name": "Bo", "email": "bo@example.com", "password": "pw"}),
    )
    .await;

    let mail = wait_for_email(&app.outbox, "bo@example.com", "Verify your email").await;
    let token = token_from_email(&mail, "verify");

    let (status, _) = get(&app.router, &format!("/verify/{}", token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app.router, &format!("/verify/{}", token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_token");
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_unknown_verification_token_rejected() {
    let app = create_test_app();

    let (status, body) = get(&app.router, "/verify/deadbeef").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let app = create_test_app();
    let body = json!({"name": "Cy", "email": "cy@example.com", "password": "pw"});

    let (status, _) = post(&app.router, "/register", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(&app.router, "/register", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn test_login_errors() {
    let app = create_test_app();
    verified_user(&app, "Di", "di@example.com", "correct").await;

    let (status, body) = post(&app.router, "/login", json!({"email": "di@example.com"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Enter all credentials");

    let (status, body) = post(
        &app.router,
        "/login",
        json!({"email": "nobody@example.com", "password": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No user found");

    let (status, body) = post(
        &app.router,
        "/login",
        json!({"email": "di@example.com", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_resend_verification_replaces_token() {
    let app = create_test_app();
    post(
        &app.router,
        "/register",
        json!({"name": "Ed", "email": "ed@example.com", "password": "pw"}),
    )
    .await;
    let first = token_from_email(
        &wait_for_email(&app.outbox, "ed@example.com", "Verify your email").await,
        "verify",
    );

    let (status, body) = post(
        &app.router,
        "/resend-verification",
        json!({"email": "ed@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Verification email sent");

    let second = token_from_email(
        &wait_for_email(&app.outbox, "ed@example.com", "Resend: Verify").await,
        "verify",
    );
    assert_ne!(first, second);

    let (status, _) = get(&app.router, &format!("/verify/{}", first)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app.router, &format!("/verify/{}", second)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &app.router,
        "/resend-verification",
        json!({"email": "ed@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already verified");
}

#[tokio::test]
async fn test_resend_verification_unknown_email() {
    let app = create_test_app();

    let (status, body) = post(
        &app.router,
        "/resend-verification",
        json!({"email": "ghost@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let app = create_test_app();
    verified_user(&app, "Flo", "flo@example.com", "old-password").await;

    let (status, body) = post(
        &app.router,
        "/forgot-password",
        json!({"email": "flo@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password reset link sent to your email");

    let mail = wait_for_email(&app.outbox, "flo@example.com", "Password Reset").await;
    let token = token_from_email(&mail, "reset-password");

    let (status, body) = post(
        &app.router,
        &format!("/reset-password/{}", token),
        json!({"password": "new-password"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password reset successfully");

    let (status, _) = post(
        &app.router,
        "/login",
        json!({"email": "flo@example.com", "password": "old-password"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(
        &app.router,
        "/login",
        json!({"email": "flo@example.com", "password": "new-password"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Token was consumed
    let (status, _) = post(
        &app.router,
        &format!("/reset-password/{}", token),
        json!({"password": "third-password"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let app = create_test_app();

    let (status, _) = post(
        &app.router,
        "/forgot-password",
        json!({"email": "ghost@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.outbox.sent().is_empty());
}

#[tokio::test]
async fn test_expired_reset_token_rejected() {
    let app = create_test_app();
    verified_user(&app, "Gus", "gus@example.com", "pw").await;

    let user = app
        .db
        .find_user_by_email("gus@example.com")
        .await
        .unwrap()
        .unwrap();
    let expired = ExpiringToken {
        token: "ab".repeat(32),
        expires_at: Utc::now() - Duration::minutes(1),
    };
    app.db
        .set_user_token(&user.id, TokenPurpose::PasswordReset, Some(&expired))
        .await
        .unwrap();

    let (status, body) = post(
        &app.router,
        &format!("/reset-password/{}", expired.token),
        json!({"password": "new"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_token");

    // Old password still works
    let (status, _) = post(
        &app.router,
        "/login",
        json!({"email": "gus@example.com", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_token_cannot_verify_email() {
    let app = create_test_app();
    post(
        &app.router,
        "/register",
        json!({"name": "Hal", "email": "hal@example.com", "password": "pw"}),
    )
    .await;
    wait_for_email(&app.outbox, "hal@example.com", "Verify your email").await;

    post(
        &app.router,
        "/forgot-password",
        json!({"email": "hal@example.com"}),
    )
    .await;
    let reset = token_from_email(
        &wait_for_email(&app.outbox, "hal@example.com", "Password Reset").await,
        "reset-password",
    );

    let (status, _) = get(&app.router, &format!("/verify/{}", reset)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registration_survives_mail_failure() {
    let app = create_test_app();
    app.outbox.set_failing(true);

    let (status, _) = post(
        &app.router,
        "/register",
        json!({"name": "Ivy", "email": "ivy@example.com", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let user = app
        .db
        .find_user_by_email("ivy@example.com")
        .await
        .unwrap()
        .expect("user stored even though mail failed");
    assert!(!user.is_verified);
    assert!(user.verification_token.is_some());
}

#[tokio::test]
async fn test_admin_role_is_kept() {
    let app = create_test_app();
    post(
        &app.router,
        "/register",
        json!({"name": "Jo", "email": "jo@example.com", "password": "pw", "role": "admin"}),
    )
    .await;

    let user = app
        .db
        .find_user_by_email("jo@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.role, club_events::models::Role::Admin);
}
