// ABOUTME: Integration tests for the analytics endpoints
// ABOUTME: Heatmap totals, time series zero-filling, and user/global stats
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

mod helpers;

use chrono::{Duration, Utc};

use helpers::axum_test::AxumTestRequest;
use helpers::test_utils::{log_drink, register_user, test_app};

#[tokio::test]
async fn heatmap_preserves_daily_totals() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "alice").await;

    for _ in 0..3 {
        log_drink(&app, &token, 500.0).await;
    }

    let response = AxumTestRequest::get("/api/analytics/heatmap")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let entries: serde_json::Value = response.json();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["date"], Utc::now().date_naive().to_string());
    assert_eq!(entries[0]["total_ml"], 1500.0);
}

#[tokio::test]
async fn timeseries_zero_fills_missing_days() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "bob").await;

    log_drink(&app, &token, 750.0).await;

    let today = Utc::now().date_naive();
    let start = today - Duration::days(2);
    let response = AxumTestRequest::get(&format!(
        "/api/analytics/timeseries?start={start}&end={today}"
    ))
    .bearer(&token)
    .send(app.clone())
    .await;
    assert_eq!(response.status(), 200);

    let entries: serde_json::Value = response.json();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["total_ml"], 0.0);
    assert_eq!(entries[1]["total_ml"], 0.0);
    assert_eq!(entries[2]["date"], today.to_string());
    assert_eq!(entries[2]["total_ml"], 750.0);
}

#[tokio::test]
async fn timeseries_rejects_inverted_ranges() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "carol").await;

    let today = Utc::now().date_naive();
    let tomorrow = today + Duration::days(1);
    let response = AxumTestRequest::get(&format!(
        "/api/analytics/timeseries?start={tomorrow}&end={today}"
    ))
    .bearer(&token)
    .send(app.clone())
    .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn user_stats_reflect_logged_volume() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "dave").await;

    log_drink(&app, &token, 600.0).await;
    log_drink(&app, &token, 400.0).await;

    let response = AxumTestRequest::get("/api/analytics/stats")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_volume_ml"], 1000.0);
    assert_eq!(body["total_logs"], 2);
    assert_eq!(body["active_days"], 1);
    assert_eq!(body["average_per_active_day_ml"], 1000.0);
    assert_eq!(body["daily_goal_ml"], 2000.0);
    assert!(body["tracking_since"].is_string());
}

#[tokio::test]
async fn global_stats_aggregate_across_users() {
    let (_resources, app) = test_app().await;
    let (token_a, _) = register_user(&app, "erin").await;
    let (token_b, _) = register_user(&app, "frank").await;

    log_drink(&app, &token_a, 1000.0).await;
    log_drink(&app, &token_b, 500.0).await;

    let response = AxumTestRequest::get("/api/analytics/stats/global")
        .bearer(&token_a)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_users"], 2);
    assert_eq!(body["total_volume_ml"], 1500.0);
    assert_eq!(body["total_logs"], 2);
    assert_eq!(body["average_volume_per_user_ml"], 750.0);
    assert_eq!(body["active_users_last_7_days"], 2);
    // Everything logged today, so per-day average covers one day
    assert_eq!(body["average_daily_volume_ml"], 1500.0);
    assert!(body["most_popular_brand"].is_null());
}

#[tokio::test]
async fn brand_breakdown_groups_unknown_brands() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "grace").await;

    AxumTestRequest::post("/api/hydration/logs")
        .bearer(&token)
        .json(&serde_json::json!({ "volume_ml": 300.0, "brand": "Evian" }))
        .send(app.clone())
        .await;
    AxumTestRequest::post("/api/hydration/logs")
        .bearer(&token)
        .json(&serde_json::json!({ "volume_ml": 200.0, "brand": "Evian" }))
        .send(app.clone())
        .await;
    log_drink(&app, &token, 100.0).await;

    let response = AxumTestRequest::get("/api/analytics/brands")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let entries: serde_json::Value = response.json();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);

    let evian = entries
        .iter()
        .find(|e| e["brand"] == "Evian")
        .expect("Evian entry");
    assert_eq!(evian["total_ml"], 500.0);
    assert_eq!(evian["log_count"], 2);
    assert!(evian["first_logged_at"].is_string());
    assert!(evian["last_logged_at"].is_string());

    let unknown = entries
        .iter()
        .find(|e| e["brand"] == "Unknown")
        .expect("Unknown entry");
    assert_eq!(unknown["total_ml"], 100.0);
}

#[tokio::test]
async fn progress_returns_daily_averages() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "heidi").await;

    log_drink(&app, &token, 1200.0).await;

    let response = AxumTestRequest::get("/api/analytics/progress?granularity=daily")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let entries: serde_json::Value = response.json();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["average_ml"], 1200.0);
}

#[tokio::test]
async fn dashboard_persistence_is_not_implemented() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "ivan").await;

    let response = AxumTestRequest::post("/api/analytics/dashboard")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 501);
}
