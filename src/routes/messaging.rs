// ABOUTME: Route handlers for direct messaging between friends
// ABOUTME: Search and conversation metadata endpoints deliberately return 501
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticate;
use crate::constants::limits::DEFAULT_PAGE_SIZE;
use crate::errors::AppError;
use crate::models::{Conversation, FriendStatus, Message, Notification};
use crate::server::ServerResources;

const MAX_MESSAGE_LENGTH: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct StartConversationRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: String,
    pub other_user_id: String,
    pub other_username: String,
    pub last_message_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub sender_id: String,
    pub body: String,
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id.to_string(),
            sender_id: message.sender_id.to_string(),
            body: message.body,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Messaging routes handler
pub struct MessagingRoutes;

impl MessagingRoutes {
    /// Create all messaging routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/messaging/conversations",
                get(Self::handle_list_conversations),
            )
            .route(
                "/api/messaging/conversations",
                post(Self::handle_start_conversation),
            )
            .route(
                "/api/messaging/conversations/:id/messages",
                get(Self::handle_list_messages),
            )
            .route(
                "/api/messaging/conversations/:id/messages",
                post(Self::handle_send_message),
            )
            .route(
                "/api/messaging/conversations/:id",
                patch(Self::handle_update_conversation),
            )
            .route("/api/messaging/search", get(Self::handle_search))
            .with_state(resources)
    }

    /// Handle GET /api/messaging/conversations
    async fn handle_list_conversations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let conversations = resources.database.list_conversations(user_id).await?;
        let mut response = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let other = if conversation.user_a == user_id {
                conversation.user_b
            } else {
                conversation.user_a
            };
            let other_username = resources
                .database
                .get_user(other)
                .await?
                .map_or_else(String::new, |u| u.username);
            response.push(ConversationResponse {
                id: conversation.id.to_string(),
                other_user_id: other.to_string(),
                other_username,
                last_message_at: conversation.last_message_at.map(|dt| dt.to_rfc3339()),
            });
        }

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/messaging/conversations
    ///
    /// Messaging is restricted to accepted friends.
    async fn handle_start_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<StartConversationRequest>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let other = resources
            .database
            .get_user_by_username(&body.username)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if other.id == user_id {
            return Err(AppError::invalid_input(
                "Cannot start a conversation with yourself",
            ));
        }

        require_friendship(&resources, user_id, other.id).await?;

        let conversation = resources
            .database
            .get_or_create_conversation(user_id, other.id)
            .await?;

        let response = ConversationResponse {
            id: conversation.id.to_string(),
            other_user_id: other.id.to_string(),
            other_username: other.username,
            last_message_at: conversation.last_message_at.map(|dt| dt.to_rfc3339()),
        };

        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/messaging/conversations/:id/messages
    async fn handle_list_messages(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Query(query): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        participant_conversation(&resources, id, user_id).await?;

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 200);
        let offset = query.offset.unwrap_or(0).max(0);

        let messages = resources.database.list_messages(id, limit, offset).await?;
        let response: Vec<MessageResponse> = messages.into_iter().map(Into::into).collect();

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/messaging/conversations/:id/messages
    async fn handle_send_message(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<SendMessageRequest>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        let conversation = participant_conversation(&resources, id, user_id).await?;

        let text = body.body.trim();
        if text.is_empty() {
            return Err(AppError::invalid_input("Message body must not be empty"));
        }
        if text.len() > MAX_MESSAGE_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Message body must not exceed {MAX_MESSAGE_LENGTH} characters"
            )));
        }

        let message = Message::new(id, user_id, text.to_owned());
        resources.database.insert_message(&message).await?;

        let sender = resources
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        let recipient = if conversation.user_a == user_id {
            conversation.user_b
        } else {
            conversation.user_a
        };
        let notification = Notification::new(
            recipient,
            "new_message",
            "New message".to_owned(),
            format!("{} sent you a message", sender.username),
        );
        resources.database.insert_notification(&notification).await?;

        let response: MessageResponse = message.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle PATCH /api/messaging/conversations/:id
    async fn handle_update_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources)?;
        Err(AppError::not_implemented("Conversation metadata update"))
    }

    /// Handle GET /api/messaging/search
    async fn handle_search(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources)?;
        Err(AppError::not_implemented("Message search"))
    }
}

/// Fetch a conversation and verify the user participates in it
async fn participant_conversation(
    resources: &Arc<ServerResources>,
    id: Uuid,
    user_id: Uuid,
) -> Result<Conversation, AppError> {
    let conversation = resources
        .database
        .get_conversation(id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation"))?;

    if !conversation.has_participant(user_id) {
        return Err(AppError::not_found("Conversation"));
    }
    Ok(conversation)
}

async fn require_friendship(
    resources: &Arc<ServerResources>,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<(), AppError> {
    let connection = resources
        .database
        .get_friend_connection_between(user_a, user_b)
        .await?;

    match connection {
        Some(c) if c.status == FriendStatus::Accepted => Ok(()),
        _ => Err(AppError::invalid_input(
            "You can only message accepted friends",
        )),
    }
}
