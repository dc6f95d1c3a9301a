// ABOUTME: Integration tests for registration, login, and the current-user endpoint
// ABOUTME: Covers validation failures, duplicates, and bad credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

mod helpers;

use helpers::axum_test::AxumTestRequest;
use helpers::test_utils::{register_user, test_app, TEST_PASSWORD};

#[tokio::test]
async fn register_returns_token_and_user() {
    let (_resources, app) = test_app().await;

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&serde_json::json!({
            "email": "alice@example.com",
            "username": "alice",
            "password": TEST_PASSWORD,
        }))
        .send(app.clone())
        .await;

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    // Password material must never be serialized
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_rejects_invalid_input() {
    let (_resources, app) = test_app().await;

    let bad_email = AxumTestRequest::post("/api/auth/register")
        .json(&serde_json::json!({
            "email": "not-an-email",
            "username": "bob",
            "password": TEST_PASSWORD,
        }))
        .send(app.clone())
        .await;
    assert_eq!(bad_email.status(), 400);

    let short_username = AxumTestRequest::post("/api/auth/register")
        .json(&serde_json::json!({
            "email": "bob@example.com",
            "username": "ab",
            "password": TEST_PASSWORD,
        }))
        .send(app.clone())
        .await;
    assert_eq!(short_username.status(), 400);

    let short_password = AxumTestRequest::post("/api/auth/register")
        .json(&serde_json::json!({
            "email": "bob@example.com",
            "username": "bob",
            "password": "short",
        }))
        .send(app.clone())
        .await;
    assert_eq!(short_password.status(), 400);
}

#[tokio::test]
async fn register_rejects_duplicate_email_and_username() {
    let (_resources, app) = test_app().await;
    register_user(&app, "carol").await;

    let duplicate_email = AxumTestRequest::post("/api/auth/register")
        .json(&serde_json::json!({
            "email": "carol@example.com",
            "username": "carol2",
            "password": TEST_PASSWORD,
        }))
        .send(app.clone())
        .await;
    assert_eq!(duplicate_email.status(), 409);

    let duplicate_username = AxumTestRequest::post("/api/auth/register")
        .json(&serde_json::json!({
            "email": "carol.other@example.com",
            "username": "carol",
            "password": TEST_PASSWORD,
        }))
        .send(app.clone())
        .await;
    assert_eq!(duplicate_username.status(), 409);
}

#[tokio::test]
async fn login_succeeds_with_correct_credentials() {
    let (_resources, app) = test_app().await;
    register_user(&app, "dave").await;

    let response = AxumTestRequest::post("/api/auth/login")
        .json(&serde_json::json!({
            "email": "dave@example.com",
            "password": TEST_PASSWORD,
        }))
        .send(app.clone())
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["username"], "dave");
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_email() {
    let (_resources, app) = test_app().await;
    register_user(&app, "erin").await;

    let wrong_password = AxumTestRequest::post("/api/auth/login")
        .json(&serde_json::json!({
            "email": "erin@example.com",
            "password": "definitely-wrong",
        }))
        .send(app.clone())
        .await;
    assert_eq!(wrong_password.status(), 401);

    let unknown_email = AxumTestRequest::post("/api/auth/login")
        .json(&serde_json::json!({
            "email": "nobody@example.com",
            "password": TEST_PASSWORD,
        }))
        .send(app.clone())
        .await;
    assert_eq!(unknown_email.status(), 401);
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let (_resources, app) = test_app().await;
    let (token, user_id) = register_user(&app, "frank").await;

    let unauthenticated = AxumTestRequest::get("/api/auth/me").send(app.clone()).await;
    assert_eq!(unauthenticated.status(), 401);

    let garbage = AxumTestRequest::get("/api/auth/me")
        .bearer("not-a-jwt")
        .send(app.clone())
        .await;
    assert_eq!(garbage.status(), 401);

    let response = AxumTestRequest::get("/api/auth/me")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["username"], "frank");
}
