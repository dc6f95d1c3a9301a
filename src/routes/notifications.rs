// ABOUTME: Route handlers for the in-app notification inbox
// ABOUTME: List, unread count, mark read (single and bulk), and delete
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
use crate::models::Notification;
use crate::server::ServerResources;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id.to_string(),
            kind: notification.kind,
            title: notification.title,
            body: notification.body,
            is_read: notification.is_read,
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}

/// Notification routes handler
pub struct NotificationRoutes;

impl NotificationRoutes {
    /// Create all notification routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/notifications", get(Self::handle_list))
            .route(
                "/api/notifications/unread-count",
                get(Self::handle_unread_count),
            )
            .route("/api/notifications/:id/read", post(Self::handle_mark_read))
            .route("/api/notifications/read-all", post(Self::handle_read_all))
            .route("/api/notifications/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// Handle GET /api/notifications
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListQuery>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 200);
        let offset = query.offset.unwrap_or(0).max(0);

        let notifications = resources
            .database
            .list_notifications(user_id, query.unread_only.unwrap_or(false), limit, offset)
            .await?;
        let response: Vec<NotificationResponse> =
            notifications.into_iter().map(Into::into).collect();

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/notifications/unread-count
    async fn handle_unread_count(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let count = resources.database.unread_notification_count(user_id).await?;

        Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "unread": count })),
        )
            .into_response())
    }

    /// Handle POST /api/notifications/:id/read
    async fn handle_mark_read(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let updated = resources.database.mark_notification_read(id, user_id).await?;
        if !updated {
            return Err(AppError::not_found("Notification"));
        }

        Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "status": "read" })),
        )
            .into_response())
    }

    /// Handle POST /api/notifications/read-all
    async fn handle_read_all(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let updated = resources
            .database
            .mark_all_notifications_read(user_id)
            .await?;

        Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "marked_read": updated })),
        )
            .into_response())
    }

    /// Handle DELETE /api/notifications/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let deleted = resources.database.delete_notification(id, user_id).await?;
        if !deleted {
            return Err(AppError::not_found("Notification"));
        }

        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
