// ABOUTME: Integration tests for direct messaging between friends
// ABOUTME: Covers the friendship gate, message flow, and the 501 stub surfaces
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

mod helpers;

use helpers::axum_test::AxumTestRequest;
use helpers::test_utils::{make_friends, register_user, test_app};

#[tokio::test]
async fn conversations_require_an_accepted_friendship() {
    let (_resources, app) = test_app().await;
    let (token_a, _) = register_user(&app, "alice").await;
    register_user(&app, "bob").await;

    let response = AxumTestRequest::post("/api/messaging/conversations")
        .bearer(&token_a)
        .json(&serde_json::json!({ "username": "bob" }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn message_flow_between_friends() {
    let (_resources, app) = test_app().await;
    let (token_a, user_a) = register_user(&app, "carol").await;
    let (token_b, _) = register_user(&app, "dave").await;
    make_friends(&app, &token_a, &token_b, "dave").await;

    let created = AxumTestRequest::post("/api/messaging/conversations")
        .bearer(&token_a)
        .json(&serde_json::json!({ "username": "dave" }))
        .send(app.clone())
        .await;
    assert_eq!(created.status(), 201);
    let conversation: serde_json::Value = created.json();
    let conversation_id = conversation["id"].as_str().unwrap().to_owned();
    assert_eq!(conversation["other_username"], "dave");

    // Re-creating returns the same conversation
    let again = AxumTestRequest::post("/api/messaging/conversations")
        .bearer(&token_b)
        .json(&serde_json::json!({ "username": "carol" }))
        .send(app.clone())
        .await;
    assert_eq!(again.status(), 201);
    let same: serde_json::Value = again.json();
    assert_eq!(same["id"], conversation_id);

    let sent = AxumTestRequest::post(&format!(
        "/api/messaging/conversations/{conversation_id}/messages"
    ))
    .bearer(&token_a)
    .json(&serde_json::json!({ "body": "stay hydrated!" }))
    .send(app.clone())
    .await;
    assert_eq!(sent.status(), 201);
    let message: serde_json::Value = sent.json();
    assert_eq!(message["body"], "stay hydrated!");
    assert_eq!(message["sender_id"], user_a.to_string());

    let listed = AxumTestRequest::get(&format!(
        "/api/messaging/conversations/{conversation_id}/messages"
    ))
    .bearer(&token_b)
    .send(app.clone())
    .await;
    assert_eq!(listed.status(), 200);
    let messages: serde_json::Value = listed.json();
    assert_eq!(messages.as_array().unwrap().len(), 1);

    // The recipient's conversation list reflects the new message
    let conversations = AxumTestRequest::get("/api/messaging/conversations")
        .bearer(&token_b)
        .send(app.clone())
        .await;
    let conversations: serde_json::Value = conversations.json();
    let conversations = conversations.as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["other_username"], "carol");
    assert!(conversations[0]["last_message_at"].is_string());

    // And a notification was written
    let inbox = AxumTestRequest::get("/api/notifications?unread_only=true")
        .bearer(&token_b)
        .send(app.clone())
        .await;
    let inbox: serde_json::Value = inbox.json();
    assert!(inbox
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["kind"] == "new_message"));
}

#[tokio::test]
async fn empty_and_oversized_messages_are_rejected() {
    let (_resources, app) = test_app().await;
    let (token_a, _) = register_user(&app, "erin").await;
    let (token_b, _) = register_user(&app, "frank").await;
    make_friends(&app, &token_a, &token_b, "frank").await;

    let created = AxumTestRequest::post("/api/messaging/conversations")
        .bearer(&token_a)
        .json(&serde_json::json!({ "username": "frank" }))
        .send(app.clone())
        .await;
    let conversation: serde_json::Value = created.json();
    let conversation_id = conversation["id"].as_str().unwrap().to_owned();

    let empty = AxumTestRequest::post(&format!(
        "/api/messaging/conversations/{conversation_id}/messages"
    ))
    .bearer(&token_a)
    .json(&serde_json::json!({ "body": "   " }))
    .send(app.clone())
    .await;
    assert_eq!(empty.status(), 400);

    let oversized = AxumTestRequest::post(&format!(
        "/api/messaging/conversations/{conversation_id}/messages"
    ))
    .bearer(&token_a)
    .json(&serde_json::json!({ "body": "x".repeat(2001) }))
    .send(app.clone())
    .await;
    assert_eq!(oversized.status(), 400);
}

#[tokio::test]
async fn non_participants_cannot_see_a_conversation() {
    let (_resources, app) = test_app().await;
    let (token_a, _) = register_user(&app, "grace").await;
    let (token_b, _) = register_user(&app, "heidi").await;
    let (token_c, _) = register_user(&app, "ivan").await;
    make_friends(&app, &token_a, &token_b, "heidi").await;

    let created = AxumTestRequest::post("/api/messaging/conversations")
        .bearer(&token_a)
        .json(&serde_json::json!({ "username": "heidi" }))
        .send(app.clone())
        .await;
    let conversation: serde_json::Value = created.json();
    let conversation_id = conversation["id"].as_str().unwrap().to_owned();

    let snooping = AxumTestRequest::get(&format!(
        "/api/messaging/conversations/{conversation_id}/messages"
    ))
    .bearer(&token_c)
    .send(app.clone())
    .await;
    assert_eq!(snooping.status(), 404);
}

#[tokio::test]
async fn search_and_metadata_update_are_not_implemented() {
    let (_resources, app) = test_app().await;
    let (token, _) = register_user(&app, "judy").await;

    let search = AxumTestRequest::get("/api/messaging/search")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(search.status(), 501);

    let id = uuid::Uuid::new_v4();
    let patch = AxumTestRequest::patch(&format!("/api/messaging/conversations/{id}"))
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(patch.status(), 501);
}
