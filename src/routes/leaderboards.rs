// ABOUTME: Route handlers for leaderboard pages and the champions overview
// ABOUTME: Metric and period come from query parameters with sane defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use super::authenticate;
use super::hydration::round2;
use crate::constants::limits::{DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT};
use crate::errors::AppError;
use crate::gamification::start_of_utc_day;
use crate::leaderboard::{self, format_value, Metric, Period};
use crate::server::ServerResources;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub metric: Option<String>,
    pub period: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChampionEntry {
    pub metric: Metric,
    pub username: String,
    pub formatted_value: String,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardStatsResponse {
    pub total_users: i64,
    pub active_today: i64,
    pub active_this_week: i64,
    /// Platform volume over the trailing week divided by 7
    pub average_daily_volume_last_7_days_ml: f64,
    pub champions: Vec<ChampionEntry>,
}

/// Leaderboard routes handler
pub struct LeaderboardRoutes;

impl LeaderboardRoutes {
    /// Create all leaderboard routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/leaderboards", get(Self::handle_leaderboard))
            .route("/api/leaderboards/stats", get(Self::handle_stats))
            .with_state(resources)
    }

    /// Handle GET /api/leaderboards
    async fn handle_leaderboard(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<LeaderboardQuery>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let metric: Metric = query.metric.as_deref().unwrap_or("consumption").parse()?;
        let period: Period = query.period.as_deref().unwrap_or("all_time").parse()?;
        let limit = usize::try_from(
            query
                .limit
                .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
                .clamp(1, MAX_LEADERBOARD_LIMIT),
        )
        .unwrap_or(20);

        let board = leaderboard::build(&resources.database, metric, period, limit, user_id).await?;

        Ok((StatusCode::OK, Json(board)).into_response())
    }

    /// Handle GET /api/leaderboards/stats
    ///
    /// Current champion per all-time metric plus the participant count.
    async fn handle_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let mut champions = Vec::new();
        for metric in [Metric::Consumption, Metric::Streak, Metric::Points, Metric::Xp] {
            let board =
                leaderboard::build(&resources.database, metric, Period::AllTime, 1, user_id)
                    .await?;
            if let Some(top) = board.entries.first() {
                champions.push(ChampionEntry {
                    metric,
                    username: top.username.clone(),
                    formatted_value: format_value(metric, top.value),
                });
            }
        }

        let now = Utc::now();
        let week_ago = now - Duration::days(7);
        let active_today = resources
            .database
            .active_users_between(start_of_utc_day(now), now)
            .await?;
        let active_this_week = resources.database.active_users_between(week_ago, now).await?;
        let weekly_volume = resources.database.global_volume_between(week_ago, now).await?;

        let response = LeaderboardStatsResponse {
            total_users: resources.database.count_users().await?,
            active_today,
            active_this_week,
            average_daily_volume_last_7_days_ml: round2(weekly_volume / 7.0),
            champions,
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
