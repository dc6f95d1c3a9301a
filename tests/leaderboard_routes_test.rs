// ABOUTME: Integration tests for leaderboard ranking, badges, and the stats overview
// ABOUTME: Rankings come from real logged data in an in-memory database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

mod helpers;

use helpers::axum_test::AxumTestRequest;
use helpers::test_utils::{log_drink, register_user, test_app};

#[tokio::test]
async fn consumption_leaderboard_sorts_descending_with_badges() {
    let (_resources, app) = test_app().await;
    let (token_a, _) = register_user(&app, "alice").await;
    let (token_b, _) = register_user(&app, "bob").await;
    let (token_c, _) = register_user(&app, "carol").await;

    log_drink(&app, &token_a, 3000.0).await;
    log_drink(&app, &token_b, 2000.0).await;
    log_drink(&app, &token_c, 1000.0).await;

    let response = AxumTestRequest::get("/api/leaderboards?metric=consumption&period=all_time")
        .bearer(&token_a)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let board: serde_json::Value = response.json();
    assert_eq!(board["metric"], "consumption");
    assert_eq!(board["period"], "all_time");
    assert_eq!(board["total_participants"], 3);

    let entries = board["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["username"], "alice");
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["value"], 3000.0);
    assert_eq!(entries[0]["formatted_value"], "3.0 L");
    assert_eq!(entries[0]["badge"], "\u{1f947} Champion");
    assert_eq!(entries[0]["is_current_user"], true);

    assert_eq!(entries[1]["username"], "bob");
    assert_eq!(entries[1]["rank"], 2);
    assert_eq!(entries[1]["badge"], "\u{1f948} Runner-up");
    assert_eq!(entries[1]["is_current_user"], false);

    assert_eq!(entries[2]["username"], "carol");
    assert_eq!(entries[2]["rank"], 3);
    assert_eq!(entries[2]["badge"], "\u{1f949} Third Place");
    assert_eq!(entries[2]["formatted_value"], "1.0 L");
}

#[tokio::test]
async fn user_rank_is_reported_when_outside_the_page() {
    let (_resources, app) = test_app().await;
    let (token_a, _) = register_user(&app, "alice").await;
    let (token_b, _) = register_user(&app, "bob").await;
    let (token_c, _) = register_user(&app, "carol").await;

    log_drink(&app, &token_a, 3000.0).await;
    log_drink(&app, &token_b, 2000.0).await;
    log_drink(&app, &token_c, 1000.0).await;

    let response = AxumTestRequest::get("/api/leaderboards?metric=consumption&limit=1")
        .bearer(&token_c)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let board: serde_json::Value = response.json();
    assert_eq!(board["entries"].as_array().unwrap().len(), 1);
    assert_eq!(board["user_rank"]["rank"], 3);
    assert_eq!(board["user_rank"]["value"], 1000.0);
}

#[tokio::test]
async fn points_leaderboard_ranks_profile_balances() {
    let (resources, app) = test_app().await;
    let (token_a, user_a) = register_user(&app, "alice").await;
    let (_token_b, user_b) = register_user(&app, "bob").await;

    let mut profile = resources.database.get_profile(user_a).await.unwrap();
    profile.points = 150;
    resources.database.update_profile(&profile).await.unwrap();

    let mut profile = resources.database.get_profile(user_b).await.unwrap();
    profile.points = 400;
    resources.database.update_profile(&profile).await.unwrap();

    let response = AxumTestRequest::get("/api/leaderboards?metric=points")
        .bearer(&token_a)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let board: serde_json::Value = response.json();
    let entries = board["entries"].as_array().unwrap();
    assert_eq!(entries[0]["username"], "bob");
    assert_eq!(entries[0]["formatted_value"], "400 pts");
    assert_eq!(entries[1]["username"], "alice");
    assert_eq!(entries[1]["formatted_value"], "150 pts");
}

#[tokio::test]
async fn unknown_metric_or_period_is_rejected() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "alice").await;

    let bad_metric = AxumTestRequest::get("/api/leaderboards?metric=nonsense")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(bad_metric.status(), 400);

    let bad_period = AxumTestRequest::get("/api/leaderboards?period=fortnight")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(bad_period.status(), 400);
}

#[tokio::test]
async fn stats_lists_a_champion_per_metric() {
    let (_resources, app) = test_app().await;
    let (token_a, _) = register_user(&app, "alice").await;
    let (token_b, _) = register_user(&app, "bob").await;

    log_drink(&app, &token_a, 2500.0).await;
    log_drink(&app, &token_b, 500.0).await;

    let response = AxumTestRequest::get("/api/leaderboards/stats")
        .bearer(&token_a)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_users"], 2);
    assert_eq!(body["active_today"], 2);
    assert_eq!(body["active_this_week"], 2);
    // 3000 ml over the trailing week
    assert_eq!(body["average_daily_volume_last_7_days_ml"], 428.57);

    let champions = body["champions"].as_array().unwrap();
    let consumption = champions
        .iter()
        .find(|c| c["metric"] == "consumption")
        .expect("consumption champion");
    assert_eq!(consumption["username"], "alice");
    assert_eq!(consumption["formatted_value"], "2.5 L");
}
