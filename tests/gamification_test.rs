// ABOUTME: Integration tests for XP awards, level-ups, prestige, transfers, and the store
// ABOUTME: Exercises the service layer directly against an in-memory database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

mod helpers;

use chrono::{Duration, Utc};
use uuid::Uuid;

use aqualog::errors::ErrorCode;
use aqualog::gamification::{levels, points};
use aqualog::models::{LevelMilestone, LevelReward, PointMilestone, PointReward, SeasonalBoost};

use helpers::axum_test::AxumTestRequest;
use helpers::test_utils::{register_user, test_app};

#[tokio::test]
async fn xp_award_applies_source_multiplier() {
    let (resources, app) = test_app().await;
    let (_token, user_id) = register_user(&app, "alice").await;
    let database = &resources.database;

    let mut source = database.get_or_create_xp_source("challenge").await.unwrap();
    source.multiplier = 2.0;
    database.update_xp_source(&source).await.unwrap();

    let award = levels::award_xp(database, user_id, "challenge", 10, None)
        .await
        .unwrap();
    assert_eq!(award.xp_awarded, 20);

    let profile = database.get_profile(user_id).await.unwrap();
    assert_eq!(profile.total_xp, 20);
}

#[tokio::test]
async fn xp_daily_cap_clips_then_denies() {
    let (resources, app) = test_app().await;
    let (_token, user_id) = register_user(&app, "bob").await;
    let database = &resources.database;

    let mut source = database.get_or_create_xp_source("capped").await.unwrap();
    source.daily_limit = Some(25);
    database.update_xp_source(&source).await.unwrap();

    let first = levels::award_xp(database, user_id, "capped", 20, None)
        .await
        .unwrap();
    assert_eq!(first.xp_awarded, 20);

    // Only 5 XP of headroom remains, so the award is clipped
    let second = levels::award_xp(database, user_id, "capped", 20, None)
        .await
        .unwrap();
    assert_eq!(second.xp_awarded, 5);

    // Headroom exhausted: the award is denied outright
    let third = levels::award_xp(database, user_id, "capped", 20, None).await;
    assert_eq!(third.unwrap_err().code, ErrorCode::LimitExceeded);
}

#[tokio::test]
async fn seasonal_boost_multiplies_active_awards() {
    let (resources, app) = test_app().await;
    let (_token, user_id) = register_user(&app, "carol").await;
    let database = &resources.database;

    let now = Utc::now();
    database
        .create_seasonal_boost(&SeasonalBoost {
            id: Uuid::new_v4(),
            name: "Summer Splash".into(),
            multiplier: 2.0,
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            is_active: true,
        })
        .await
        .unwrap();

    let award = levels::award_xp(database, user_id, "drink_logged", 10, None)
        .await
        .unwrap();
    assert_eq!(award.xp_awarded, 20);
}

#[tokio::test]
async fn expired_boosts_are_ignored() {
    let (resources, app) = test_app().await;
    let (_token, user_id) = register_user(&app, "dave").await;
    let database = &resources.database;

    let now = Utc::now();
    database
        .create_seasonal_boost(&SeasonalBoost {
            id: Uuid::new_v4(),
            name: "Last Year".into(),
            multiplier: 3.0,
            starts_at: now - Duration::days(30),
            ends_at: now - Duration::days(20),
            is_active: true,
        })
        .await
        .unwrap();

    let award = levels::award_xp(database, user_id, "drink_logged", 10, None)
        .await
        .unwrap();
    assert_eq!(award.xp_awarded, 10);
}

#[tokio::test]
async fn leveling_up_grants_level_rewards() {
    let (resources, app) = test_app().await;
    let (_token, user_id) = register_user(&app, "erin").await;
    let database = &resources.database;

    database
        .create_level_reward(&LevelReward {
            id: Uuid::new_v4(),
            level: 2,
            reward_type: "points".into(),
            reward_value: "50".into(),
            description: Some("Welcome to level 2".into()),
        })
        .await
        .unwrap();

    // 100 XP is exactly the level 1 -> 2 threshold
    let award = levels::award_xp(database, user_id, "drink_logged", 100, None)
        .await
        .unwrap();
    assert!(award.leveled_up);
    assert_eq!(award.old_level, 1);
    assert_eq!(award.new_level, 2);
    assert_eq!(award.rewards_granted.len(), 1);

    let profile = database.get_profile(user_id).await.unwrap();
    assert_eq!(profile.level, 2);
    assert_eq!(profile.points, 50);
}

#[tokio::test]
async fn prestige_requires_level_one_hundred() {
    let (resources, app) = test_app().await;
    let (token, user_id) = register_user(&app, "frank").await;
    let database = &resources.database;

    let response = AxumTestRequest::post("/api/gamification/prestige")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 400);

    let mut profile = database.get_profile(user_id).await.unwrap();
    profile.level = 100;
    database.update_profile(&profile).await.unwrap();

    let outcome = levels::prestige_reset(database, user_id).await.unwrap();
    assert_eq!(outcome.prestige_level, 1);
    assert_eq!(outcome.prestige_points_gained, 500);

    let profile = database.get_profile(user_id).await.unwrap();
    assert_eq!(profile.level, 1);
    assert_eq!(profile.total_xp, 0);
    assert_eq!(profile.prestige_points, 500);
}

#[tokio::test]
async fn transfer_debits_amount_plus_fee_from_the_sender() {
    let (resources, app) = test_app().await;
    let (token_a, user_a) = register_user(&app, "grace").await;
    let (_token_b, user_b) = register_user(&app, "heidi").await;
    let database = &resources.database;

    let mut profile = database.get_profile(user_a).await.unwrap();
    profile.points = 1000;
    database.update_profile(&profile).await.unwrap();

    let response = AxumTestRequest::post("/api/gamification/points/transfer")
        .bearer(&token_a)
        .json(&serde_json::json!({
            "recipient_username": "heidi",
            "amount": 100,
            "description": "thanks!",
        }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    // The sender covers the amount plus the destroyed 5% fee, the
    // recipient receives the full amount
    let outcome: serde_json::Value = response.json();
    assert_eq!(outcome["amount_sent"], 100);
    assert_eq!(outcome["fee"], 5);
    assert_eq!(outcome["total_cost"], 105);
    assert_eq!(outcome["amount_received"], 100);
    assert_eq!(outcome["sender_balance"], 895);
    assert_eq!(outcome["recipient_balance"], 100);

    let sender = database.get_profile(user_a).await.unwrap();
    let recipient = database.get_profile(user_b).await.unwrap();
    assert_eq!(sender.points, 895);
    assert_eq!(recipient.points, 100);
}

#[tokio::test]
async fn insufficient_transfer_changes_nothing() {
    let (resources, app) = test_app().await;
    let (_token_a, user_a) = register_user(&app, "ivan").await;
    let (_token_b, user_b) = register_user(&app, "judy").await;
    let database = &resources.database;

    let mut profile = database.get_profile(user_a).await.unwrap();
    profile.points = 50;
    database.update_profile(&profile).await.unwrap();

    let result = points::transfer_points(database, user_a, user_b, 100, None).await;
    assert_eq!(result.unwrap_err().code, ErrorCode::InsufficientBalance);

    let sender = database.get_profile(user_a).await.unwrap();
    let recipient = database.get_profile(user_b).await.unwrap();
    assert_eq!(sender.points, 50);
    assert_eq!(recipient.points, 0);

    let ledger = database
        .list_point_transactions(user_a, 10, 0)
        .await
        .unwrap();
    assert!(ledger.is_empty(), "failed transfers write no ledger rows");

    // Covering the amount alone is not enough, the fee must be covered too
    let mut profile = database.get_profile(user_a).await.unwrap();
    profile.points = 104;
    database.update_profile(&profile).await.unwrap();

    let result = points::transfer_points(database, user_a, user_b, 100, None).await;
    assert_eq!(result.unwrap_err().code, ErrorCode::InsufficientBalance);
    let sender = database.get_profile(user_a).await.unwrap();
    assert_eq!(sender.points, 104);

    let mut profile = database.get_profile(user_a).await.unwrap();
    profile.points = 105;
    database.update_profile(&profile).await.unwrap();

    let outcome = points::transfer_points(database, user_a, user_b, 100, None)
        .await
        .unwrap();
    assert_eq!(outcome.sender_balance, 0);
    assert_eq!(outcome.recipient_balance, 100);
}

#[tokio::test]
async fn transfer_enforces_bounds_and_self_check() {
    let (resources, app) = test_app().await;
    let (_token_a, user_a) = register_user(&app, "kate").await;
    let (_token_b, user_b) = register_user(&app, "liam").await;
    let database = &resources.database;

    let mut profile = database.get_profile(user_a).await.unwrap();
    profile.points = 50_000;
    database.update_profile(&profile).await.unwrap();

    let too_small = points::transfer_points(database, user_a, user_b, 9, None).await;
    assert_eq!(too_small.unwrap_err().code, ErrorCode::InvalidInput);

    let too_large = points::transfer_points(database, user_a, user_b, 10_001, None).await;
    assert_eq!(too_large.unwrap_err().code, ErrorCode::InvalidInput);

    let to_self = points::transfer_points(database, user_a, user_a, 100, None).await;
    assert_eq!(to_self.unwrap_err().code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn purchase_consumes_stock_and_balance() {
    let (resources, app) = test_app().await;
    let (token, user_id) = register_user(&app, "mallory").await;
    let database = &resources.database;

    let mut profile = database.get_profile(user_id).await.unwrap();
    profile.points = 500;
    database.update_profile(&profile).await.unwrap();

    let reward = PointReward {
        id: Uuid::new_v4(),
        name: "Sticker Pack".into(),
        description: None,
        cost_points: 100,
        required_level: 1,
        purchase_limit_per_user: None,
        is_limited: true,
        stock_quantity: Some(1),
        is_available: true,
    };
    database.create_point_reward(&reward).await.unwrap();

    let response = AxumTestRequest::post(&format!(
        "/api/gamification/rewards/{}/purchase",
        reward.id
    ))
    .bearer(&token)
    .json(&serde_json::json!({}))
    .send(app.clone())
    .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json();
    assert_eq!(body["points_spent"], 100);
    assert_eq!(body["quantity"], 1);

    let profile = database.get_profile(user_id).await.unwrap();
    assert_eq!(profile.points, 400);

    // Stock is exhausted
    let sold_out = AxumTestRequest::post(&format!(
        "/api/gamification/rewards/{}/purchase",
        reward.id
    ))
    .bearer(&token)
    .json(&serde_json::json!({}))
    .send(app.clone())
    .await;
    assert_eq!(sold_out.status(), 422);

    let profile = database.get_profile(user_id).await.unwrap();
    assert_eq!(profile.points, 400, "a failed purchase must not charge");
}

#[tokio::test]
async fn purchase_enforces_level_and_per_user_limit() {
    let (resources, app) = test_app().await;
    let (_token, user_id) = register_user(&app, "nick").await;
    let database = &resources.database;

    let mut profile = database.get_profile(user_id).await.unwrap();
    profile.points = 10_000;
    database.update_profile(&profile).await.unwrap();

    let gated = PointReward {
        id: Uuid::new_v4(),
        name: "Elite Badge".into(),
        description: None,
        cost_points: 100,
        required_level: 10,
        purchase_limit_per_user: None,
        is_limited: false,
        stock_quantity: None,
        is_available: true,
    };
    database.create_point_reward(&gated).await.unwrap();

    let denied = points::purchase_reward(database, user_id, gated.id, 1).await;
    assert_eq!(denied.unwrap_err().code, ErrorCode::InvalidInput);

    let limited = PointReward {
        id: Uuid::new_v4(),
        name: "One Per Customer".into(),
        description: None,
        cost_points: 100,
        required_level: 1,
        purchase_limit_per_user: Some(1),
        is_limited: false,
        stock_quantity: None,
        is_available: true,
    };
    database.create_point_reward(&limited).await.unwrap();

    points::purchase_reward(database, user_id, limited.id, 1)
        .await
        .unwrap();
    let over_limit = points::purchase_reward(database, user_id, limited.id, 1).await;
    assert_eq!(over_limit.unwrap_err().code, ErrorCode::LimitExceeded);
}

#[tokio::test]
async fn point_awards_apply_the_active_bonus_multiplier() {
    let (resources, app) = test_app().await;
    let (_token, user_id) = register_user(&app, "paula").await;
    let database = &resources.database;

    let now = Utc::now();
    database
        .create_seasonal_boost(&SeasonalBoost {
            id: Uuid::new_v4(),
            name: "Double Points Weekend".into(),
            multiplier: 2.0,
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            is_active: true,
        })
        .await
        .unwrap();

    let awarded = points::award_points(database, user_id, "drink_logged", 100, None)
        .await
        .unwrap();
    assert_eq!(awarded, 200);

    let profile = database.get_profile(user_id).await.unwrap();
    assert_eq!(profile.points, 200);
}

#[tokio::test]
async fn points_summary_reports_balance_and_ledger_totals() {
    let (resources, app) = test_app().await;
    let (token, user_id) = register_user(&app, "olive").await;
    let database = &resources.database;

    points::award_points(database, user_id, "drink_logged", 40, None)
        .await
        .unwrap();
    points::spend_points(database, user_id, 15, Some("test spend"))
        .await
        .unwrap();

    let response = AxumTestRequest::get("/api/gamification/points")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 25);

    let totals = body["totals_by_type"].as_array().unwrap();
    let earned = totals
        .iter()
        .find(|t| t["transaction_type"] == "earned")
        .expect("earned total");
    assert_eq!(earned["total"], 40);
    let spent = totals
        .iter()
        .find(|t| t["transaction_type"] == "spent")
        .expect("spent total");
    assert_eq!(spent["total"], 15);
}

#[tokio::test]
async fn level_snapshot_includes_milestone_and_multiplier() {
    let (resources, app) = test_app().await;
    let (token, user_id) = register_user(&app, "nina").await;
    let database = &resources.database;

    let response = AxumTestRequest::get("/api/gamification/level")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["level"], 1);
    assert_eq!(body["xp_multiplier"], 1.0);
    assert!(body["current_milestone"].is_null());

    database
        .create_level_milestone(&LevelMilestone {
            level: 5,
            title: "Hydration Hero".into(),
            badge_emoji: Some("\u{1f4a7}".into()),
            description: None,
        })
        .await
        .unwrap();
    let mut profile = database.get_profile(user_id).await.unwrap();
    profile.level = 6;
    database.update_profile(&profile).await.unwrap();

    let response = AxumTestRequest::get("/api/gamification/level")
        .bearer(&token)
        .send(app.clone())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["current_milestone"]["title"], "Hydration Hero");
    assert_eq!(body["current_milestone"]["level"], 5);
}

#[tokio::test]
async fn level_stats_summarize_the_population() {
    let (resources, app) = test_app().await;
    let (token, _) = register_user(&app, "olga").await;
    let (_token_b, user_b) = register_user(&app, "pete").await;
    let database = &resources.database;

    let mut profile = database.get_profile(user_b).await.unwrap();
    profile.level = 3;
    database.update_profile(&profile).await.unwrap();

    let response = AxumTestRequest::get("/api/gamification/levels/stats")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_users"], 2);
    assert_eq!(body["average_level"], 2.0);
    assert_eq!(body["max_level"], 3);
    let distribution = body["distribution"].as_array().unwrap();
    assert_eq!(distribution.len(), 2);
    assert_eq!(distribution[0]["level"], 1);
    assert_eq!(distribution[0]["user_count"], 1);
    assert_eq!(distribution[1]["level"], 3);
    assert_eq!(distribution[1]["user_count"], 1);
}

#[tokio::test]
async fn xp_breakdown_reports_sources_days_and_multipliers() {
    let (resources, app) = test_app().await;
    let (token, user_id) = register_user(&app, "quinn").await;
    let database = &resources.database;

    levels::award_xp(database, user_id, "drink_logged", 10, None)
        .await
        .unwrap();
    levels::award_xp(database, user_id, "daily_goal_met", 50, None)
        .await
        .unwrap();

    let response = AxumTestRequest::get("/api/gamification/xp/breakdown")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json();
    let by_source = body["by_source"].as_array().unwrap();
    assert_eq!(by_source.len(), 2);
    // Largest source first
    assert_eq!(by_source[0]["source"], "daily_goal_met");
    assert_eq!(by_source[0]["total_xp"], 50);

    let daily = body["daily"].as_array().unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0]["total_xp"], 60);

    assert_eq!(body["prestige_multiplier"], 1.0);
    assert_eq!(body["seasonal_multiplier"], 1.0);
}

#[tokio::test]
async fn point_milestones_are_achieved_once() {
    let (resources, app) = test_app().await;
    let (_token, user_id) = register_user(&app, "rita").await;
    let database = &resources.database;

    database
        .create_point_milestone(&PointMilestone {
            id: Uuid::new_v4(),
            points_threshold: 50,
            title: "Penny Saver".into(),
            badge_emoji: None,
            description: None,
            is_active: true,
        })
        .await
        .unwrap();

    points::award_points(database, user_id, "drink_logged", 60, None)
        .await
        .unwrap();

    let remaining = database
        .unachieved_point_milestones(user_id, i64::MAX)
        .await
        .unwrap();
    assert!(remaining.is_empty());

    let feed = database.feed_for_users(&[user_id], 10, 0).await.unwrap();
    let milestone_events = feed
        .iter()
        .filter(|e| e.payload["title"] == "Penny Saver")
        .count();
    assert_eq!(milestone_events, 1);

    // A second award does not re-achieve the milestone
    points::award_points(database, user_id, "drink_logged", 60, None)
        .await
        .unwrap();
    let feed = database.feed_for_users(&[user_id], 10, 0).await.unwrap();
    let milestone_events = feed
        .iter()
        .filter(|e| e.payload["title"] == "Penny Saver")
        .count();
    assert_eq!(milestone_events, 1);
}
