// ABOUTME: Route handlers for friend connections, user discovery, and the activity feed
// ABOUTME: Request/accept flow writes notifications for the other party
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticate;
use crate::constants::limits::DEFAULT_PAGE_SIZE;
use crate::errors::AppError;
use crate::models::{FeedEvent, FeedEventKind, FriendConnection, FriendStatus, Notification};
use crate::server::ServerResources;

#[derive(Debug, Deserialize)]
pub struct SendFriendRequestBody {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response for a friend connection
#[derive(Debug, Serialize)]
pub struct FriendConnectionResponse {
    pub id: String,
    pub initiator_id: String,
    pub receiver_id: String,
    pub status: String,
    pub created_at: String,
    pub accepted_at: Option<String>,
}

impl From<FriendConnection> for FriendConnectionResponse {
    fn from(conn: FriendConnection) -> Self {
        Self {
            id: conn.id.to_string(),
            initiator_id: conn.initiator_id.to_string(),
            receiver_id: conn.receiver_id.to_string(),
            status: conn.status.as_str().to_owned(),
            created_at: conn.created_at.to_rfc3339(),
            accepted_at: conn.accepted_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FriendEntry {
    pub user_id: String,
    pub username: String,
    pub friends_since: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct FeedEntry {
    pub user_id: String,
    pub username: String,
    pub kind: String,
    pub payload: serde_json::Value,
    pub created_at: String,
}

/// Social routes handler
pub struct SocialRoutes;

impl SocialRoutes {
    /// Create all social routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/social/friends", get(Self::handle_list_friends))
            .route("/api/social/friends", post(Self::handle_send_request))
            .route(
                "/api/social/friends/pending",
                get(Self::handle_pending_requests),
            )
            .route(
                "/api/social/friends/:id/accept",
                post(Self::handle_accept_request),
            )
            .route(
                "/api/social/friends/:id/decline",
                post(Self::handle_decline_request),
            )
            .route("/api/social/friends/:id", delete(Self::handle_unfriend))
            .route("/api/social/users/search", get(Self::handle_search_users))
            .route("/api/social/feed", get(Self::handle_feed))
            .with_state(resources)
    }

    /// Handle POST /api/social/friends
    async fn handle_send_request(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<SendFriendRequestBody>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let sender = resources
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        let receiver = resources
            .database
            .get_user_by_username(&body.username)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if receiver.id == user_id {
            return Err(AppError::invalid_input(
                "Cannot send a friend request to yourself",
            ));
        }

        let existing = resources
            .database
            .get_friend_connection_between(user_id, receiver.id)
            .await?;
        if existing.is_some() {
            return Err(AppError::invalid_input(
                "A connection already exists between these users",
            ));
        }

        let connection = FriendConnection::new(user_id, receiver.id);
        resources
            .database
            .create_friend_connection(&connection)
            .await?;

        let notification = Notification::new(
            receiver.id,
            "friend_request",
            "New friend request".to_owned(),
            format!("{} sent you a friend request", sender.username),
        );
        resources.database.insert_notification(&notification).await?;

        let response: FriendConnectionResponse = connection.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/social/friends
    async fn handle_list_friends(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let connections = resources.database.list_friends(user_id).await?;
        let mut friends = Vec::with_capacity(connections.len());
        for conn in &connections {
            let other = conn.other_user(user_id);
            if let Some(user) = resources.database.get_user(other).await? {
                friends.push(FriendEntry {
                    user_id: user.id.to_string(),
                    username: user.username,
                    friends_since: conn.accepted_at.map(|dt| dt.to_rfc3339()),
                });
            }
        }

        Ok((StatusCode::OK, Json(friends)).into_response())
    }

    /// Handle GET /api/social/friends/pending
    async fn handle_pending_requests(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let pending = resources.database.list_pending_requests(user_id).await?;
        let response: Vec<FriendConnectionResponse> =
            pending.into_iter().map(Into::into).collect();

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/social/friends/:id/accept
    async fn handle_accept_request(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        let connection = pending_request_for_receiver(&resources, id, user_id).await?;

        resources
            .database
            .update_friend_connection_status(id, FriendStatus::Accepted)
            .await?;

        let accepter = resources
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let notification = Notification::new(
            connection.initiator_id,
            "friend_accepted",
            "Friend request accepted".to_owned(),
            format!("{} accepted your friend request", accepter.username),
        );
        resources.database.insert_notification(&notification).await?;

        let event = FeedEvent::new(
            user_id,
            FeedEventKind::FriendAccepted,
            serde_json::json!({ "friend_id": connection.initiator_id }),
        );
        resources.database.insert_feed_event(&event).await?;

        Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "status": "accepted" })),
        )
            .into_response())
    }

    /// Handle POST /api/social/friends/:id/decline
    async fn handle_decline_request(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        pending_request_for_receiver(&resources, id, user_id).await?;

        resources
            .database
            .update_friend_connection_status(id, FriendStatus::Declined)
            .await?;

        Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "status": "declined" })),
        )
            .into_response())
    }

    /// Handle DELETE /api/social/friends/:id
    async fn handle_unfriend(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let connection = resources
            .database
            .get_friend_connection(id)
            .await?
            .ok_or_else(|| AppError::not_found("Friend connection"))?;

        if connection.initiator_id != user_id && connection.receiver_id != user_id {
            return Err(AppError::not_found("Friend connection"));
        }

        resources.database.delete_friend_connection(id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle GET /api/social/users/search
    async fn handle_search_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<SearchQuery>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        if query.q.trim().is_empty() {
            return Err(AppError::invalid_input("Search query must not be empty"));
        }

        let limit = query.limit.unwrap_or(20).clamp(1, 50);
        let users = resources
            .database
            .search_users(query.q.trim(), user_id, limit)
            .await?;

        let results: Vec<SearchResult> = users
            .into_iter()
            .map(|u| SearchResult {
                user_id: u.id.to_string(),
                username: u.username,
            })
            .collect();

        Ok((StatusCode::OK, Json(results)).into_response())
    }

    /// Handle GET /api/social/feed
    ///
    /// The user's own events interleaved with their friends', newest first.
    async fn handle_feed(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<FeedQuery>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 200);
        let offset = query.offset.unwrap_or(0).max(0);

        let mut audience = resources.database.friend_ids(user_id).await?;
        audience.push(user_id);

        let events = resources
            .database
            .feed_for_users(&audience, limit, offset)
            .await?;

        let mut entries = Vec::with_capacity(events.len());
        for event in events {
            let username = resources
                .database
                .get_user(event.user_id)
                .await?
                .map_or_else(String::new, |u| u.username);
            entries.push(FeedEntry {
                user_id: event.user_id.to_string(),
                username,
                kind: event.kind.as_str().to_owned(),
                payload: event.payload,
                created_at: event.created_at.to_rfc3339(),
            });
        }

        Ok((StatusCode::OK, Json(entries)).into_response())
    }
}

/// Fetch a pending request addressed to `user_id`
async fn pending_request_for_receiver(
    resources: &Arc<ServerResources>,
    id: Uuid,
    user_id: Uuid,
) -> Result<FriendConnection, AppError> {
    let connection = resources
        .database
        .get_friend_connection(id)
        .await?
        .ok_or_else(|| AppError::not_found("Friend request"))?;

    if connection.receiver_id != user_id {
        return Err(AppError::not_found("Friend request"));
    }
    if connection.status != FriendStatus::Pending {
        return Err(AppError::invalid_input("Request is no longer pending"));
    }

    Ok(connection)
}
