// ABOUTME: Route handlers for hydration log CRUD and daily goal progress
// ABOUTME: Logging a drink rolls up the day, updates streaks, and pays XP and points
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticate;
use crate::analytics::compute_streaks;
use crate::constants::{awards, hydration, limits};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::gamification::{levels, points};
use crate::models::{DailyGoal, FeedEvent, FeedEventKind, HydrationLog};
use crate::server::ServerResources;

#[derive(Debug, Deserialize)]
pub struct CreateLogRequest {
    pub volume_ml: f64,
    pub brand: Option<String>,
    /// Defaults to now when omitted
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLogRequest {
    pub volume_ml: f64,
    pub brand: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListLogsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub daily_goal_ml: f64,
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub id: String,
    pub volume_ml: f64,
    pub brand: Option<String>,
    pub logged_at: String,
}

impl From<HydrationLog> for LogResponse {
    fn from(log: HydrationLog) -> Self {
        Self {
            id: log.id.to_string(),
            volume_ml: log.volume_ml,
            brand: log.brand,
            logged_at: log.logged_at.to_rfc3339(),
        }
    }
}

/// Created log plus everything the log triggered
#[derive(Debug, Serialize)]
pub struct CreateLogResponse {
    pub log: LogResponse,
    pub xp_awarded: i64,
    pub points_awarded: i64,
    pub leveled_up: bool,
    pub new_level: i32,
    pub daily_total_ml: f64,
    pub goal_met: bool,
    pub current_streak: i32,
}

#[derive(Debug, Serialize)]
pub struct DailyProgressResponse {
    pub date: NaiveDate,
    pub total_ml: f64,
    pub goal_ml: f64,
    pub goal_met: bool,
    pub percent_of_goal: f64,
}

/// Hydration routes handler
pub struct HydrationRoutes;

impl HydrationRoutes {
    /// Create all hydration routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/hydration/logs", post(Self::handle_create_log))
            .route("/api/hydration/logs", get(Self::handle_list_logs))
            .route("/api/hydration/logs/:id", get(Self::handle_get_log))
            .route("/api/hydration/logs/:id", put(Self::handle_update_log))
            .route(
                "/api/hydration/logs/:id",
                axum::routing::delete(Self::handle_delete_log),
            )
            .route("/api/hydration/today", get(Self::handle_today))
            .route("/api/hydration/goal", put(Self::handle_update_goal))
            .with_state(resources)
    }

    /// Handle POST /api/hydration/logs
    async fn handle_create_log(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateLogRequest>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        validate_volume(body.volume_ml)?;

        let mut log = HydrationLog::new(user_id, body.volume_ml, body.brand);
        if let Some(logged_at) = body.logged_at {
            log.logged_at = logged_at;
        }
        resources.database.insert_hydration_log(&log).await?;

        let rollup = refresh_day(&resources, user_id, log.logged_at.date_naive()).await?;

        let xp = award_or_capped(
            levels::award_xp(
                &resources.database,
                user_id,
                "drink_logged",
                awards::XP_DRINK_LOGGED,
                Some("Logged a drink"),
            )
            .await,
        )?;
        let points_awarded = match points::award_points(
            &resources.database,
            user_id,
            "drink_logged",
            awards::POINTS_DRINK_LOGGED,
            Some("Logged a drink"),
        )
        .await
        {
            Ok(n) => n,
            Err(e) if e.code == ErrorCode::LimitExceeded => 0,
            Err(e) => return Err(e),
        };

        let mut xp_awarded = xp.as_ref().map_or(0, |a| a.xp_awarded);
        let (mut leveled_up, mut new_level) = xp
            .as_ref()
            .map_or((false, rollup.level), |a| (a.leveled_up, a.new_level));

        if rollup.goal_newly_met {
            let event = FeedEvent::new(
                user_id,
                FeedEventKind::DailyGoalMet,
                serde_json::json!({ "date": rollup.date, "total_ml": rollup.total_ml }),
            );
            resources.database.insert_feed_event(&event).await?;

            if let Some(goal_award) = award_or_capped(
                levels::award_xp(
                    &resources.database,
                    user_id,
                    "daily_goal_met",
                    awards::XP_DAILY_GOAL_MET,
                    Some("Met the daily goal"),
                )
                .await,
            )? {
                xp_awarded += goal_award.xp_awarded;
                leveled_up = leveled_up || goal_award.leveled_up;
                new_level = new_level.max(goal_award.new_level);
            }
        }

        let event = FeedEvent::new(
            user_id,
            FeedEventKind::DrinkLogged,
            serde_json::json!({ "volume_ml": log.volume_ml, "brand": log.brand }),
        );
        resources.database.insert_feed_event(&event).await?;

        let response = CreateLogResponse {
            log: log.into(),
            xp_awarded,
            points_awarded,
            leveled_up,
            new_level,
            daily_total_ml: rollup.total_ml,
            goal_met: rollup.goal_met,
            current_streak: rollup.current_streak,
        };

        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/hydration/logs
    async fn handle_list_logs(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListLogsQuery>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let limit = query.limit.unwrap_or(limits::DEFAULT_PAGE_SIZE).clamp(1, 500);
        let offset = query.offset.unwrap_or(0).max(0);

        let logs = resources
            .database
            .list_hydration_logs(user_id, limit, offset)
            .await?;

        let response: Vec<LogResponse> = logs.into_iter().map(Into::into).collect();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/hydration/logs/:id
    async fn handle_get_log(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        let log = owned_log(&resources, id, user_id).await?;

        let response: LogResponse = log.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/hydration/logs/:id
    async fn handle_update_log(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<UpdateLogRequest>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        validate_volume(body.volume_ml)?;

        let log = owned_log(&resources, id, user_id).await?;
        resources
            .database
            .update_hydration_log(id, body.volume_ml, body.brand.as_deref())
            .await?;

        refresh_day(&resources, user_id, log.logged_at.date_naive()).await?;

        let updated = HydrationLog {
            volume_ml: body.volume_ml,
            brand: body.brand,
            ..log
        };
        let response: LogResponse = updated.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /api/hydration/logs/:id
    async fn handle_delete_log(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let log = owned_log(&resources, id, user_id).await?;
        resources.database.delete_hydration_log(id).await?;
        refresh_day(&resources, user_id, log.logged_at.date_naive()).await?;

        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle GET /api/hydration/today
    async fn handle_today(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let today = Utc::now().date_naive();
        let profile = resources.database.get_profile(user_id).await?;
        let total_ml = resources
            .database
            .get_daily_goal(user_id, today)
            .await?
            .map_or(0.0, |g| g.total_volume_ml);

        let percent = if profile.daily_goal_ml > 0.0 {
            (total_ml / profile.daily_goal_ml) * 100.0
        } else {
            0.0
        };

        let response = DailyProgressResponse {
            date: today,
            total_ml,
            goal_ml: profile.daily_goal_ml,
            goal_met: total_ml >= profile.daily_goal_ml,
            percent_of_goal: round2(percent),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/hydration/goal
    async fn handle_update_goal(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<UpdateGoalRequest>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        if body.daily_goal_ml <= 0.0 || body.daily_goal_ml > hydration::MAX_LOG_VOLUME_ML * 10.0 {
            return Err(AppError::invalid_input("Daily goal is out of range"));
        }

        let mut profile = resources.database.get_profile(user_id).await?;
        profile.daily_goal_ml = body.daily_goal_ml;
        resources.database.update_profile(&profile).await?;

        // The new goal changes today's met/unmet state
        refresh_day(&resources, user_id, Utc::now().date_naive()).await?;

        Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "daily_goal_ml": body.daily_goal_ml })),
        )
            .into_response())
    }
}

struct DayRollup {
    date: NaiveDate,
    total_ml: f64,
    goal_met: bool,
    goal_newly_met: bool,
    current_streak: i32,
    level: i32,
}

/// Recompute the rollup row and streaks for one day.
///
/// Runs on every log mutation so corrections and deletions keep the day and
/// the streaks consistent.
async fn refresh_day(
    resources: &Arc<ServerResources>,
    user_id: Uuid,
    date: NaiveDate,
) -> AppResult<DayRollup> {
    let database = &resources.database;
    let mut profile = database.get_profile(user_id).await?;

    let day_start = chrono::TimeZone::from_utc_datetime(
        &Utc,
        &date.and_hms_opt(0, 0, 0).unwrap_or_default(),
    );
    let day_totals = database
        .daily_totals(user_id, day_start, day_start + Duration::days(1))
        .await?;
    let total_ml = day_totals.first().map_or(0.0, |&(_, total)| total);

    let was_met = database
        .get_daily_goal(user_id, date)
        .await?
        .is_some_and(|g| g.goal_met);
    let goal_met = total_ml >= profile.daily_goal_ml;

    database
        .upsert_daily_goal(&DailyGoal {
            user_id,
            date,
            total_volume_ml: total_ml,
            goal_met,
        })
        .await?;

    let today = Utc::now().date_naive();
    let window_start = today - Duration::days(hydration::HEATMAP_LOOKBACK_DAYS);
    let goal_dates = database.goal_met_dates(user_id, window_start, today).await?;
    let (current_streak, longest_in_window) = compute_streaks(&goal_dates, today);

    profile.current_streak = current_streak;
    profile.longest_streak = profile.longest_streak.max(longest_in_window);
    database.update_profile(&profile).await?;

    Ok(DayRollup {
        date,
        total_ml,
        goal_met,
        goal_newly_met: goal_met && !was_met,
        current_streak,
        level: profile.level,
    })
}

/// Fetch a log and verify ownership
async fn owned_log(
    resources: &Arc<ServerResources>,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<HydrationLog> {
    let log = resources
        .database
        .get_hydration_log(id)
        .await?
        .ok_or_else(|| AppError::not_found("Hydration log"))?;

    if log.user_id != user_id {
        return Err(AppError::not_found("Hydration log"));
    }
    Ok(log)
}

fn validate_volume(volume_ml: f64) -> AppResult<()> {
    if volume_ml <= 0.0 || volume_ml > hydration::MAX_LOG_VOLUME_ML {
        return Err(AppError::invalid_input(format!(
            "Volume must be between 0 and {} ml",
            hydration::MAX_LOG_VOLUME_ML
        )));
    }
    Ok(())
}

/// A capped-out award is not a logging failure; the drink still counts
fn award_or_capped(
    result: AppResult<levels::XpAward>,
) -> AppResult<Option<levels::XpAward>> {
    match result {
        Ok(award) => Ok(Some(award)),
        Err(e) if e.code == ErrorCode::LimitExceeded => Ok(None),
        Err(e) => Err(e),
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
