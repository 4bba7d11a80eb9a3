//! Integration tests for registration, login and session validation,
//! driven through the real router against in-memory adapters.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{authed, post_json, register_and_login, test_app, StubAnalyzer};
use docvault_core::domain::AuthSession;
use docvault_core::ports::{AuthStore, PortError};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn app() -> (axum::Router, api_lib::adapters::MemoryStore) {
    test_app(Arc::new(StubAnalyzer::new(&[], 0)))
}

#[tokio::test]
async fn register_then_login_yields_a_40_char_session() {
    let (app, _) = app();
    let (status, body) = post_json(
        &app,
        "/register",
        json!({"email": "alice@example.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Account created!");
    assert_eq!(body["success"], true);

    let (status, body) = post_json(
        &app,
        "/login",
        json!({"email": "alice@example.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let token = body["session"].as_str().unwrap();
    assert_eq!(token.len(), 40);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (app, _) = app();
    let payload = json!({"email": "alice@example.com", "password": "secret1"});
    let (status, _) = post_json(&app, "/register", payload.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(&app, "/register", payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn malformed_credentials_are_a_validation_error() {
    let (app, _) = app();
    let (status, _) = post_json(
        &app,
        "/register",
        json!({"email": "not-an-email", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/register",
        json!({"email": "bob@example.com", "password": "short"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_and_unknown_identity_stay_distinguishable() {
    let (app, _) = app();
    register_and_login(&app, "alice@example.com", "secret1").await;

    let (status, wrong_password) = post_json(
        &app,
        "/login",
        json!({"email": "alice@example.com", "password": "secret2"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["success"], false);
    assert_eq!(wrong_password["message"], "AUTH_INVALID_PASSWORD");

    let (status, unknown_identity) = post_json(
        &app,
        "/login",
        json!({"email": "nobody@example.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_identity["success"], false);
    assert_eq!(unknown_identity["message"], "AUTH_INVALID_KEY_ID");

    assert_ne!(wrong_password["message"], unknown_identity["message"]);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bogus_tokens() {
    let (app, _) = app();

    let req = axum::http::Request::builder()
        .method("GET")
        .uri("/getDocuments")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = common::send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = authed(&app, "GET", "/getDocuments", &"f".repeat(40)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_session_is_rejected_and_deleted() {
    let (app, store) = app();
    let now = Utc::now();
    let session = AuthSession {
        id: "e".repeat(40),
        user_id: Uuid::new_v4(),
        active_expires: now - Duration::days(20),
        idle_expires: now - Duration::days(6),
    };
    store.create_session(session.clone()).await.unwrap();

    let (status, _) = authed(&app, "GET", "/getDocuments", &session.id).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The dead session must be gone, not merely refused.
    assert!(matches!(
        store.get_session(&session.id).await,
        Err(PortError::InvalidSession)
    ));
}

#[tokio::test]
async fn idle_session_is_renewed_by_validation() {
    let (app, store) = app();
    let now = Utc::now();
    let session = AuthSession {
        id: "i".repeat(40),
        user_id: Uuid::new_v4(),
        active_expires: now - Duration::minutes(5),
        idle_expires: now + Duration::days(7),
    };
    store.create_session(session.clone()).await.unwrap();

    let (status, _) = authed(&app, "GET", "/getDocuments", &session.id).await;
    assert_eq!(status, StatusCode::OK);

    let renewed = store.get_session(&session.id).await.unwrap();
    assert!(renewed.active_expires > now);
    assert!(renewed.idle_expires > session.idle_expires);
}
