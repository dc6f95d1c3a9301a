// ABOUTME: Route handlers for consumption analytics: heatmap, progress, time series, stats
// ABOUTME: Values are rounded to two decimals at the response boundary only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::authenticate;
use super::hydration::round2;
use crate::analytics::{
    heatmap, progress_over_time, timeseries, GlobalStats, Granularity,
};
use crate::constants::hydration::HEATMAP_LOOKBACK_DAYS;
use crate::errors::AppError;
use crate::server::ServerResources;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    #[serde(default)]
    pub granularity: Granularity,
}

#[derive(Debug, Deserialize)]
pub struct TimeseriesQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub granularity: Granularity,
}

#[derive(Debug, Serialize)]
pub struct HeatmapEntry {
    pub date: NaiveDate,
    pub total_ml: f64,
}

#[derive(Debug, Serialize)]
pub struct ProgressEntry {
    pub period: String,
    pub average_ml: f64,
}

#[derive(Debug, Serialize)]
pub struct TimeseriesEntry {
    pub date: NaiveDate,
    pub total_ml: f64,
}

#[derive(Debug, Serialize)]
pub struct UserStatsResponse {
    pub total_volume_ml: f64,
    pub total_logs: i64,
    pub active_days: i64,
    pub average_per_active_day_ml: f64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub daily_goal_ml: f64,
    /// Timestamp of the first log, absent until something is logged
    pub tracking_since: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BrandEntry {
    pub brand: String,
    pub total_ml: f64,
    pub log_count: i64,
    pub first_logged_at: String,
    pub last_logged_at: String,
}

/// Analytics routes handler
pub struct AnalyticsRoutes;

impl AnalyticsRoutes {
    /// Create all analytics routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/analytics/heatmap", get(Self::handle_heatmap))
            .route("/api/analytics/progress", get(Self::handle_progress))
            .route("/api/analytics/timeseries", get(Self::handle_timeseries))
            .route("/api/analytics/stats", get(Self::handle_user_stats))
            .route("/api/analytics/stats/global", get(Self::handle_global_stats))
            .route("/api/analytics/brands", get(Self::handle_brands))
            .route("/api/analytics/dashboard", post(Self::handle_save_dashboard))
            .with_state(resources)
    }

    /// Handle GET /api/analytics/heatmap
    ///
    /// One entry per day with at least one log over the trailing year.
    async fn handle_heatmap(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let now = Utc::now();
        let daily = resources
            .database
            .daily_totals(user_id, now - Duration::days(HEATMAP_LOOKBACK_DAYS), now)
            .await?;

        let entries: Vec<HeatmapEntry> = heatmap(&daily)
            .into_iter()
            .map(|d| HeatmapEntry {
                date: d.date,
                total_ml: round2(d.total_ml),
            })
            .collect();

        Ok((StatusCode::OK, Json(entries)).into_response())
    }

    /// Handle GET /api/analytics/progress
    async fn handle_progress(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ProgressQuery>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let now = Utc::now();
        let daily = resources
            .database
            .daily_totals(user_id, now - Duration::days(HEATMAP_LOOKBACK_DAYS), now)
            .await?;

        let entries: Vec<ProgressEntry> = progress_over_time(&daily, query.granularity)
            .into_iter()
            .map(|p| ProgressEntry {
                period: p.period,
                average_ml: round2(p.average_ml),
            })
            .collect();

        Ok((StatusCode::OK, Json(entries)).into_response())
    }

    /// Handle GET /api/analytics/timeseries
    async fn handle_timeseries(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<TimeseriesQuery>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let end = query.end.unwrap_or_else(|| Utc::now().date_naive());
        let start = query.start.unwrap_or(end - Duration::days(30));

        if start > end {
            return Err(AppError::invalid_input("start must not be after end"));
        }
        if (end - start).num_days() > 2 * HEATMAP_LOOKBACK_DAYS {
            return Err(AppError::invalid_input("Requested range is too large"));
        }

        let range_start = Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0).unwrap_or_default());
        let range_end = Utc.from_utc_datetime(
            &(end + Duration::days(1))
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default(),
        );
        let daily: BTreeMap<NaiveDate, f64> = resources
            .database
            .daily_totals(user_id, range_start, range_end)
            .await?
            .into_iter()
            .collect();

        let entries: Vec<TimeseriesEntry> = timeseries(&daily, start, end, query.granularity)
            .into_iter()
            .map(|p| TimeseriesEntry {
                date: p.date,
                total_ml: round2(p.total_ml),
            })
            .collect();

        Ok((StatusCode::OK, Json(entries)).into_response())
    }

    /// Handle GET /api/analytics/stats
    async fn handle_user_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let now = Utc::now();
        let epoch = Utc.timestamp_opt(0, 0).single().unwrap_or(now);
        let summary = resources
            .database
            .consumption_summary(user_id, epoch, now)
            .await?;
        let profile = resources.database.get_profile(user_id).await?;

        #[allow(clippy::cast_precision_loss)]
        let average = if summary.active_days > 0 {
            summary.total_volume_ml / summary.active_days as f64
        } else {
            0.0
        };

        let response = UserStatsResponse {
            total_volume_ml: round2(summary.total_volume_ml),
            total_logs: summary.log_count,
            active_days: summary.active_days,
            average_per_active_day_ml: round2(average),
            current_streak: profile.current_streak,
            longest_streak: profile.longest_streak,
            daily_goal_ml: profile.daily_goal_ml,
            tracking_since: summary.first_logged_at.map(|dt| dt.to_rfc3339()),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/analytics/stats/global
    ///
    /// Scans the whole log table, so results are cached for an hour.
    async fn handle_global_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources)?;

        if let Some(stats) = resources.global_stats.get().await {
            return Ok((StatusCode::OK, Json(stats)).into_response());
        }

        let now = Utc::now();
        let total_users = resources.database.count_users().await?;
        let (total_volume_ml, total_logs, logged_days) =
            resources.database.global_consumption_totals().await?;
        let active_users_last_7_days = resources
            .database
            .active_users_between(now - Duration::days(7), now)
            .await?;
        let most_popular_brand = resources.database.most_popular_brand().await?;

        #[allow(clippy::cast_precision_loss)]
        let average_volume_per_user_ml = if total_users > 0 {
            round2(total_volume_ml / total_users as f64)
        } else {
            0.0
        };
        #[allow(clippy::cast_precision_loss)]
        let average_daily_volume_ml = if logged_days > 0 {
            round2(total_volume_ml / logged_days as f64)
        } else {
            0.0
        };

        let stats = GlobalStats {
            total_users,
            total_volume_ml: round2(total_volume_ml),
            total_logs,
            average_volume_per_user_ml,
            average_daily_volume_ml,
            active_users_last_7_days,
            most_popular_brand,
        };
        resources.global_stats.put(stats.clone()).await;

        Ok((StatusCode::OK, Json(stats)).into_response())
    }

    /// Handle GET /api/analytics/brands
    async fn handle_brands(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let breakdown = resources.database.brand_breakdown(user_id).await?;
        let entries: Vec<BrandEntry> = breakdown
            .into_iter()
            .map(|b| BrandEntry {
                brand: b.brand,
                total_ml: round2(b.total_volume_ml),
                log_count: b.log_count,
                first_logged_at: b.first_logged_at.to_rfc3339(),
                last_logged_at: b.last_logged_at.to_rfc3339(),
            })
            .collect();

        Ok((StatusCode::OK, Json(entries)).into_response())
    }

    /// Handle POST /api/analytics/dashboard
    ///
    /// Saved dashboards are a known-incomplete surface.
    async fn handle_save_dashboard(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources)?;

        Err(AppError::not_implemented("Dashboard persistence"))
    }
}
