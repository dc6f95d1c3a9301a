// ABOUTME: Integration tests for hydration log CRUD, daily rollups, and awards
// ABOUTME: Exercises the full create-log pipeline including goal and streak updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

mod helpers;

use helpers::axum_test::AxumTestRequest;
use helpers::test_utils::{log_drink, register_user, test_app};

#[tokio::test]
async fn three_drinks_roll_up_into_one_day() {
    let (_resources, app) = test_app().await;
    let (token, _user_id) = register_user(&app, "alice").await;

    let set_goal = AxumTestRequest::put("/api/hydration/goal")
        .bearer(&token)
        .json(&serde_json::json!({ "daily_goal_ml": 1500.0 }))
        .send(app.clone())
        .await;
    assert_eq!(set_goal.status(), 200);

    let first = log_drink(&app, &token, 500.0).await;
    assert_eq!(first["daily_total_ml"], 500.0);
    assert_eq!(first["goal_met"], false);
    assert_eq!(first["xp_awarded"], 10);
    assert_eq!(first["points_awarded"], 5);

    let second = log_drink(&app, &token, 500.0).await;
    assert_eq!(second["daily_total_ml"], 1000.0);
    assert_eq!(second["goal_met"], false);

    // The third drink crosses the goal: 10 XP for the drink + 50 for the goal
    let third = log_drink(&app, &token, 500.0).await;
    assert_eq!(third["daily_total_ml"], 1500.0);
    assert_eq!(third["goal_met"], true);
    assert_eq!(third["current_streak"], 1);
    assert_eq!(third["xp_awarded"], 60);
}

#[tokio::test]
async fn create_log_rejects_out_of_range_volumes() {
    let (_resources, app) = test_app().await;
    let (token, _user_id) = register_user(&app, "bob").await;

    for volume in [0.0, -100.0, 10_001.0] {
        let response = AxumTestRequest::post("/api/hydration/logs")
            .bearer(&token)
            .json(&serde_json::json!({ "volume_ml": volume }))
            .send(app.clone())
            .await;
        assert_eq!(response.status(), 400, "volume {volume} should be rejected");
    }
}

#[tokio::test]
async fn log_crud_respects_ownership() {
    let (_resources, app) = test_app().await;
    let (owner, _) = register_user(&app, "carol").await;
    let (intruder, _) = register_user(&app, "mallory").await;

    let created = log_drink(&app, &owner, 300.0).await;
    let log_id = created["log"]["id"].as_str().unwrap().to_owned();

    let fetched = AxumTestRequest::get(&format!("/api/hydration/logs/{log_id}"))
        .bearer(&owner)
        .send(app.clone())
        .await;
    assert_eq!(fetched.status(), 200);
    let body: serde_json::Value = fetched.json();
    assert_eq!(body["volume_ml"], 300.0);

    // Another user sees 404, not 403, so log IDs are not probeable
    let foreign = AxumTestRequest::get(&format!("/api/hydration/logs/{log_id}"))
        .bearer(&intruder)
        .send(app.clone())
        .await;
    assert_eq!(foreign.status(), 404);

    let updated = AxumTestRequest::put(&format!("/api/hydration/logs/{log_id}"))
        .bearer(&owner)
        .json(&serde_json::json!({ "volume_ml": 450.0, "brand": "Evian" }))
        .send(app.clone())
        .await;
    assert_eq!(updated.status(), 200);
    let body: serde_json::Value = updated.json();
    assert_eq!(body["volume_ml"], 450.0);
    assert_eq!(body["brand"], "Evian");

    let deleted = AxumTestRequest::delete(&format!("/api/hydration/logs/{log_id}"))
        .bearer(&owner)
        .send(app.clone())
        .await;
    assert_eq!(deleted.status(), 204);

    let gone = AxumTestRequest::get(&format!("/api/hydration/logs/{log_id}"))
        .bearer(&owner)
        .send(app.clone())
        .await;
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn deleting_a_log_recomputes_the_day() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "dave").await;

    AxumTestRequest::put("/api/hydration/goal")
        .bearer(&token)
        .json(&serde_json::json!({ "daily_goal_ml": 800.0 }))
        .send(app.clone())
        .await;

    let first = log_drink(&app, &token, 500.0).await;
    let second = log_drink(&app, &token, 500.0).await;
    assert_eq!(second["goal_met"], true);

    let log_id = first["log"]["id"].as_str().unwrap();
    let deleted = AxumTestRequest::delete(&format!("/api/hydration/logs/{log_id}"))
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(deleted.status(), 204);

    let today = AxumTestRequest::get("/api/hydration/today")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(today.status(), 200);
    let body: serde_json::Value = today.json();
    assert_eq!(body["total_ml"], 500.0);
    assert_eq!(body["goal_met"], false);
    assert_eq!(body["percent_of_goal"], 62.5);
}

#[tokio::test]
async fn list_logs_paginates_newest_first() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "erin").await;

    for volume in [100.0, 200.0, 300.0] {
        log_drink(&app, &token, volume).await;
    }

    let page = AxumTestRequest::get("/api/hydration/logs?limit=2")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(page.status(), 200);
    let body: serde_json::Value = page.json();
    assert_eq!(body.as_array().unwrap().len(), 2);

    let rest = AxumTestRequest::get("/api/hydration/logs?limit=2&offset=2")
        .bearer(&token)
        .send(app.clone())
        .await;
    let body: serde_json::Value = rest.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn goal_update_rejects_non_positive_values() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "frank").await;

    for goal in [0.0, -1.0] {
        let response = AxumTestRequest::put("/api/hydration/goal")
            .bearer(&token)
            .json(&serde_json::json!({ "daily_goal_ml": goal }))
            .send(app.clone())
            .await;
        assert_eq!(response.status(), 400);
    }
}
