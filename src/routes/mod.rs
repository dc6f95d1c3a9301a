// ABOUTME: HTTP route handlers, one module per API surface
// ABOUTME: Every protected handler authenticates the bearer token before touching state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

mod analytics;
mod auth;
mod coaching;
mod gamification;
mod health;
mod hydration;
mod integrations;
mod leaderboards;
mod messaging;
mod notifications;
mod social;

pub use analytics::AnalyticsRoutes;
pub use auth::AuthRoutes;
pub use coaching::CoachingRoutes;
pub use gamification::GamificationRoutes;
pub use health::HealthRoutes;
pub use hydration::HydrationRoutes;
pub use integrations::IntegrationRoutes;
pub use leaderboards::LeaderboardRoutes;
pub use messaging::MessagingRoutes;
pub use notifications::NotificationRoutes;
pub use social::SocialRoutes;

use std::sync::Arc;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::server::ServerResources;

/// Extract and validate the bearer token, returning the authenticated user ID
pub(crate) fn authenticate(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> AppResult<Uuid> {
    let header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(AppError::auth_required)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::auth_invalid("Authorization header must use Bearer scheme"))?;

    let claims = resources.auth.validate_token(token)?;
    claims.user_id()
}
