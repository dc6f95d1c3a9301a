// ABOUTME: Integration tests for coaching advice, integration stubs, and the health probe
// ABOUTME: Advice content is deterministic, so exact categories can be asserted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

mod helpers;

use helpers::axum_test::AxumTestRequest;
use helpers::test_utils::{log_drink, register_user, test_app};

#[tokio::test]
async fn health_probe_reports_database_state() {
    let (_resources, app) = test_app().await;

    let response = AxumTestRequest::get("/health").send(app.clone()).await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    assert_eq!(body["service"], "aqualog-server");
}

#[tokio::test]
async fn tips_reflect_goal_progress() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "alice").await;

    AxumTestRequest::put("/api/hydration/goal")
        .bearer(&token)
        .json(&serde_json::json!({ "daily_goal_ml": 1000.0 }))
        .send(app.clone())
        .await;
    log_drink(&app, &token, 1000.0).await;

    let response = AxumTestRequest::get("/api/coaching/tips")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let tips: serde_json::Value = response.json();
    let tips = tips.as_array().unwrap();
    let goal_tip = tips
        .iter()
        .find(|t| t["category"] == "goal")
        .expect("goal tip");
    assert!(goal_tip["message"]
        .as_str()
        .unwrap()
        .starts_with("Goal reached"));

    let streak_tip = tips
        .iter()
        .find(|t| t["category"] == "streak")
        .expect("streak tip");
    assert!(streak_tip["message"].as_str().unwrap().contains("1 days"));
}

#[tokio::test]
async fn insights_summarize_the_last_week() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "bob").await;

    log_drink(&app, &token, 1400.0).await;

    let response = AxumTestRequest::get("/api/coaching/insights")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["daily_goal_ml"], 2000.0);
    assert_eq!(body["average_last_7_days_ml"], 200.0);
    assert_eq!(body["goal_attainment_percent"], 10.0);
    assert_eq!(body["days_logged_last_7"], 1);
    assert!(body["summary"].is_string());
}

#[tokio::test]
async fn integration_providers_are_stubs() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "carol").await;

    let providers = AxumTestRequest::get("/api/integrations/providers")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(providers.status(), 200);
    let list: serde_json::Value = providers.json();
    assert_eq!(list.as_array().unwrap().len(), 3);

    let connect = AxumTestRequest::post("/api/integrations/fitbit/connect")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(connect.status(), 501);

    let sync = AxumTestRequest::post("/api/integrations/google_fit/sync")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(sync.status(), 501);

    let unknown = AxumTestRequest::post("/api/integrations/myspace/connect")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(unknown.status(), 404);
}
