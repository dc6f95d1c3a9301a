// ABOUTME: Route handlers for deterministic hydration coaching tips and insights
// ABOUTME: Advice is derived from recent intake relative to the daily goal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::Serialize;

use super::authenticate;
use super::hydration::round2;
use crate::errors::AppError;
use crate::gamification::start_of_utc_day;
use crate::server::ServerResources;

#[derive(Debug, Serialize)]
pub struct Tip {
    pub category: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub daily_goal_ml: f64,
    pub average_last_7_days_ml: f64,
    pub goal_attainment_percent: f64,
    pub days_logged_last_7: usize,
    pub current_streak: i32,
    pub summary: String,
}

/// Coaching routes handler
pub struct CoachingRoutes;

impl CoachingRoutes {
    /// Create all coaching routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/coaching/tips", get(Self::handle_tips))
            .route("/api/coaching/insights", get(Self::handle_insights))
            .with_state(resources)
    }

    /// Handle GET /api/coaching/tips
    async fn handle_tips(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        let profile = resources.database.get_profile(user_id).await?;

        let now = Utc::now();
        let today_total: f64 = resources
            .database
            .daily_totals(user_id, start_of_utc_day(now), now)
            .await?
            .iter()
            .map(|(_, total)| total)
            .sum();

        let mut tips = Vec::new();

        if profile.daily_goal_ml > 0.0 {
            let fraction = today_total / profile.daily_goal_ml;
            if fraction >= 1.0 {
                tips.push(Tip {
                    category: "goal".to_owned(),
                    message: "Goal reached for today. Keep sipping steadily rather than stopping entirely.".to_owned(),
                });
            } else if fraction >= 0.5 {
                tips.push(Tip {
                    category: "goal".to_owned(),
                    message: format!(
                        "You are {}% of the way to today's goal. A glass every hour will close the gap.",
                        (fraction * 100.0).round() as i64
                    ),
                });
            } else {
                tips.push(Tip {
                    category: "goal".to_owned(),
                    message: "You are behind on today's goal. Start with a full glass now and set a reminder for the next one.".to_owned(),
                });
            }
        }

        if profile.current_streak == 0 {
            tips.push(Tip {
                category: "streak".to_owned(),
                message: "Meet your goal today to start a new streak.".to_owned(),
            });
        } else {
            tips.push(Tip {
                category: "streak".to_owned(),
                message: format!(
                    "Your streak is {} days. Hit today's goal to keep it alive.",
                    profile.current_streak
                ),
            });
        }

        tips.push(Tip {
            category: "habit".to_owned(),
            message: "Front-load your intake: drinking more before mid-afternoon improves consistency.".to_owned(),
        });

        Ok((StatusCode::OK, Json(tips)).into_response())
    }

    /// Handle GET /api/coaching/insights
    async fn handle_insights(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        let profile = resources.database.get_profile(user_id).await?;

        let now = Utc::now();
        let daily = resources
            .database
            .daily_totals(user_id, now - Duration::days(7), now)
            .await?;

        let days_logged = daily.len();
        let total: f64 = daily.iter().map(|(_, t)| t).sum();
        let average = total / 7.0;

        let attainment = if profile.daily_goal_ml > 0.0 {
            average / profile.daily_goal_ml * 100.0
        } else {
            0.0
        };

        let summary = if attainment >= 100.0 {
            "You are consistently meeting your goal. Consider raising it slightly."
        } else if attainment >= 75.0 {
            "Close to target most days. One extra glass per day would get you there."
        } else if days_logged == 0 {
            "No logs in the last week. Log your first drink to get tailored advice."
        } else {
            "Intake is well below your goal this week. Try pairing drinks with existing habits like meals."
        };

        let response = InsightsResponse {
            daily_goal_ml: profile.daily_goal_ml,
            average_last_7_days_ml: round2(average),
            goal_attainment_percent: round2(attainment),
            days_logged_last_7: days_logged,
            current_streak: profile.current_streak,
            summary: summary.to_owned(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
