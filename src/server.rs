// ABOUTME: Shared server resources and HTTP router assembly
// ABOUTME: All handlers receive the same Arc<ServerResources> through axum state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analytics::GlobalStats;
use crate::auth::AuthManager;
use crate::cache::TtlCache;
use crate::config::ServerConfig;
use crate::constants::cache::GLOBAL_STATS_TTL_SECS;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::routes::{
    AnalyticsRoutes, AuthRoutes, CoachingRoutes, GamificationRoutes, HealthRoutes,
    HydrationRoutes, IntegrationRoutes, LeaderboardRoutes, MessagingRoutes, NotificationRoutes,
    SocialRoutes,
};

/// Long-lived resources shared by every request handler
pub struct ServerResources {
    pub database: Database,
    pub auth: AuthManager,
    pub config: ServerConfig,
    pub global_stats: TtlCache<GlobalStats>,
}

impl ServerResources {
    /// Assemble resources from configuration and a connected database
    #[must_use]
    pub fn new(database: Database, config: ServerConfig) -> Self {
        let auth = AuthManager::new(&config.auth.jwt_secret, config.auth.jwt_expiry_hours);
        Self {
            database,
            auth,
            config,
            global_stats: TtlCache::new(GLOBAL_STATS_TTL_SECS),
        }
    }
}

/// Build the full application router
#[must_use]
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(HydrationRoutes::routes(resources.clone()))
        .merge(AnalyticsRoutes::routes(resources.clone()))
        .merge(LeaderboardRoutes::routes(resources.clone()))
        .merge(GamificationRoutes::routes(resources.clone()))
        .merge(SocialRoutes::routes(resources.clone()))
        .merge(MessagingRoutes::routes(resources.clone()))
        .merge(NotificationRoutes::routes(resources.clone()))
        .merge(CoachingRoutes::routes(resources.clone()))
        .merge(IntegrationRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
}

/// Bind the configured port and serve requests until shutdown
///
/// # Errors
///
/// Returns an error if binding or serving fails
pub async fn serve(resources: Arc<ServerResources>) -> AppResult<()> {
    let port = resources.config.http_port;
    let router = build_router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind port {port}: {e}")))?;

    info!(port, "HTTP server listening");

    axum::serve(listener, router)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}
