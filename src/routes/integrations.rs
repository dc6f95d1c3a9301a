// ABOUTME: Route handlers for health-platform integration stubs
// ABOUTME: Providers are listed statically; connect and sync return mock payloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::authenticate;
use crate::errors::AppError;
use crate::server::ServerResources;

const PROVIDERS: &[(&str, &str)] = &[
    ("apple_health", "Apple Health"),
    ("google_fit", "Google Fit"),
    ("fitbit", "Fitbit"),
];

#[derive(Debug, Serialize)]
pub struct ProviderEntry {
    pub id: String,
    pub name: String,
    pub connected: bool,
}

/// Integration routes handler
pub struct IntegrationRoutes;

impl IntegrationRoutes {
    /// Create all integration routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/integrations/providers",
                get(Self::handle_list_providers),
            )
            .route(
                "/api/integrations/:provider/connect",
                post(Self::handle_connect),
            )
            .route("/api/integrations/:provider/sync", post(Self::handle_sync))
            .with_state(resources)
    }

    /// Handle GET /api/integrations/providers
    async fn handle_list_providers(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources)?;

        let providers: Vec<ProviderEntry> = PROVIDERS
            .iter()
            .map(|(id, name)| ProviderEntry {
                id: (*id).to_owned(),
                name: (*name).to_owned(),
                connected: false,
            })
            .collect();

        Ok((StatusCode::OK, Json(providers)).into_response())
    }

    /// Handle POST /api/integrations/:provider/connect
    async fn handle_connect(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(provider): Path<String>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources)?;
        known_provider(&provider)?;

        Err(AppError::not_implemented(format!(
            "Connecting to {provider}"
        )))
    }

    /// Handle POST /api/integrations/:provider/sync
    async fn handle_sync(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(provider): Path<String>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources)?;
        known_provider(&provider)?;

        Err(AppError::not_implemented(format!(
            "Syncing from {provider}"
        )))
    }
}

fn known_provider(provider: &str) -> Result<(), AppError> {
    if PROVIDERS.iter().any(|(id, _)| *id == provider) {
        Ok(())
    } else {
        Err(AppError::not_found("Integration provider"))
    }
}
