// ABOUTME: Common setup for integration tests
// ABOUTME: In-memory database, server resources, and account registration helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use aqualog::config::{AuthConfig, DatabaseConfig, Environment, ServerConfig};
use aqualog::database::Database;
use aqualog::server::{build_router, ServerResources};

use super::axum_test::AxumTestRequest;

/// Password used by every test account
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build server resources backed by an in-memory database
pub async fn test_resources() -> Arc<ServerResources> {
    let database = Database::new("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    let config = ServerConfig {
        http_port: 0,
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
        },
        auth: AuthConfig {
            jwt_secret: "test-jwt-secret".into(),
            jwt_expiry_hours: 24,
        },
    };

    Arc::new(ServerResources::new(database, config))
}

/// Build resources plus the full application router
pub async fn test_app() -> (Arc<ServerResources>, Router) {
    let resources = test_resources().await;
    let app = build_router(resources.clone());
    (resources, app)
}

/// Register an account through the API, returning its token and user ID
pub async fn register_user(app: &Router, username: &str) -> (String, Uuid) {
    let response = AxumTestRequest::post("/api/auth/register")
        .json(&serde_json::json!({
            "email": format!("{username}@example.com"),
            "username": username,
            "password": TEST_PASSWORD,
        }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201, "registration should succeed");

    let body: serde_json::Value = response.json();
    let token = body["token"].as_str().expect("token in response").to_owned();
    let user_id = body["user"]["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("user id in response");

    (token, user_id)
}

/// Log a drink through the API, returning the creation response body
pub async fn log_drink(app: &Router, token: &str, volume_ml: f64) -> serde_json::Value {
    let response = AxumTestRequest::post("/api/hydration/logs")
        .bearer(token)
        .json(&serde_json::json!({ "volume_ml": volume_ml }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201, "log creation should succeed");
    response.json()
}

/// Make two users friends through the request/accept flow
pub async fn make_friends(app: &Router, token_a: &str, token_b: &str, username_b: &str) {
    let response = AxumTestRequest::post("/api/social/friends")
        .bearer(token_a)
        .json(&serde_json::json!({ "username": username_b }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201, "friend request should succeed");
    let request: serde_json::Value = response.json();
    let request_id = request["id"].as_str().expect("connection id");

    let response = AxumTestRequest::post(&format!("/api/social/friends/{request_id}/accept"))
        .bearer(token_b)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200, "accept should succeed");
}
