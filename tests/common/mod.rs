// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use club_events::config::Config;
use club_events::db::{FirestoreDb, MemoryDb};
use club_events::mail::{OutboxMailer, OutgoingEmail};
use club_events::routes::create_router;
use club_events::AppState;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Handles a test needs besides the router.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: MemoryDb,
    pub outbox: OutboxMailer,
}

/// Create a test app backed by the in-memory store and outbox.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let db = MemoryDb::new();
    let outbox = OutboxMailer::new();
    let state = Arc::new(AppState::new(
        config,
        Arc::new(db.clone()),
        Arc::new(outbox.clone()),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        outbox,
    }
}

/// Send one request and return status plus parsed JSON body (Null if empty).
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    into_json(response).await
}

#[allow(dead_code)]
pub async fn into_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[allow(dead_code)]
pub async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

#[allow(dead_code)]
pub async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

/// Wait for a background notification whose subject starts with `subject`.
#[allow(dead_code)]
pub async fn wait_for_email(outbox: &OutboxMailer, to: &str, subject: &str) -> OutgoingEmail {
    for _ in 0..200 {
        if let Some(email) = outbox
            .sent_to(to)
            .into_iter()
            .rev()
            .find(|m| m.subject.starts_with(subject))
        {
            return email;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("no '{}' email to {}", subject, to);
}

/// Pull the token out of the first `/{route}/<token>` link in an email.
#[allow(dead_code)]
pub fn token_from_email(email: &OutgoingEmail, route: &str) -> String {
    let marker = format!("/{}/", route);
    let start = email
        .html_body
        .find(&marker)
        .map(|i| i + marker.len())
        .expect("email has no token link");
    email.html_body[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect()
}

/// Register, verify and return the new user's id.
#[allow(dead_code)]
pub async fn verified_user(app: &TestApp, name: &str, email: &str, password: &str) -> String {
    let (status, _) = post(
        &app.router,
        "/register",
        serde_json::json!({"name": name, "email": email, "password": password}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let mail = wait_for_email(&app.outbox, email, "Verify your email").await;
    let token = token_from_email(&mail, "verify");
    let (status, _) = get(&app.router, &format!("/verify/{}", token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &app.router,
        "/login",
        serde_json::json!({"email": email, "password": password}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["_id"].as_str().unwrap().to_string()
}

/// Create an event through the API and return its id.
#[allow(dead_code)]
pub async fn add_event(app: &axum::Router, body: Value) -> String {
    let (status, body) = post(app, "/add-event", body).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["_id"].as_str().unwrap().to_string()
}
