// ABOUTME: Liveness endpoint with a database ping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;

use crate::server::ServerResources;

/// Health check routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(resources)
    }

    async fn handle_health(
        State(resources): State<Arc<ServerResources>>,
    ) -> Json<serde_json::Value> {
        let database = match sqlx::query("SELECT 1")
            .fetch_one(resources.database.pool())
            .await
        {
            Ok(_) => "ok",
            Err(_) => "unreachable",
        };

        Json(json!({
            "status": if database == "ok" { "ok" } else { "degraded" },
            "database": database,
            "service": crate::constants::service::NAME,
        }))
    }
}
