// ABOUTME: Route handlers for levels, XP history, prestige, points, and the reward store
// ABOUTME: Thin HTTP shims over the gamification services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticate;
use crate::constants::limits::{DEFAULT_PAGE_SIZE, XP_BREAKDOWN_DAYS};
use crate::errors::AppError;
use crate::gamification::{levels, points};
use crate::models::{PointReward, PointTransaction};
use crate::server::ServerResources;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub recipient_username: String,
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct XpBreakdownEntry {
    pub source: String,
    pub total_xp: i64,
}

#[derive(Debug, Serialize)]
pub struct DailyXpEntry {
    pub date: String,
    pub total_xp: i64,
}

#[derive(Debug, Serialize)]
pub struct XpBreakdownResponse {
    /// Per-source lifetime totals, largest first
    pub by_source: Vec<XpBreakdownEntry>,
    /// Per-day totals over the trailing 30 days
    pub daily: Vec<DailyXpEntry>,
    pub prestige_multiplier: f64,
    pub seasonal_multiplier: f64,
}

#[derive(Debug, Serialize)]
pub struct MilestoneResponse {
    pub level: i32,
    pub title: String,
    pub badge_emoji: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LevelResponse {
    #[serde(flatten)]
    pub info: levels::LevelInfo,
    /// Highest milestone reached, if any are defined
    pub current_milestone: Option<MilestoneResponse>,
}

#[derive(Debug, Serialize)]
pub struct LevelBracket {
    pub level: i32,
    pub user_count: i64,
}

#[derive(Debug, Serialize)]
pub struct LevelStatsResponse {
    pub total_users: i64,
    pub average_level: f64,
    pub max_level: i32,
    pub distribution: Vec<LevelBracket>,
}

#[derive(Debug, Serialize)]
pub struct PointsResponse {
    pub balance: i64,
    pub prestige_points: i64,
    pub totals_by_type: Vec<TypeTotal>,
}

#[derive(Debug, Serialize)]
pub struct TypeTotal {
    pub transaction_type: String,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub transaction_type: String,
    pub amount: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub reference_type: Option<String>,
    pub created_at: String,
}

impl From<PointTransaction> for TransactionResponse {
    fn from(tx: PointTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            transaction_type: tx.transaction_type.as_str().to_owned(),
            amount: tx.amount,
            balance_after: tx.balance_after,
            description: tx.description,
            reference_type: tx.reference_type,
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RewardResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub cost_points: i64,
    pub required_level: i32,
    pub stock_quantity: Option<i64>,
}

impl From<PointReward> for RewardResponse {
    fn from(reward: PointReward) -> Self {
        Self {
            id: reward.id.to_string(),
            name: reward.name,
            description: reward.description,
            cost_points: reward.cost_points,
            required_level: reward.required_level,
            stock_quantity: if reward.is_limited {
                reward.stock_quantity
            } else {
                None
            },
        }
    }
}

/// Gamification routes handler
pub struct GamificationRoutes;

impl GamificationRoutes {
    /// Create all gamification routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/gamification/level", get(Self::handle_level))
            .route("/api/gamification/levels/stats", get(Self::handle_level_stats))
            .route("/api/gamification/xp/breakdown", get(Self::handle_xp_breakdown))
            .route("/api/gamification/xp/log", get(Self::handle_xp_log))
            .route("/api/gamification/prestige", post(Self::handle_prestige))
            .route("/api/gamification/points", get(Self::handle_points))
            .route(
                "/api/gamification/points/transactions",
                get(Self::handle_transactions),
            )
            .route(
                "/api/gamification/points/transfer",
                post(Self::handle_transfer),
            )
            .route("/api/gamification/rewards", get(Self::handle_list_rewards))
            .route(
                "/api/gamification/rewards/:id/purchase",
                post(Self::handle_purchase),
            )
            .with_state(resources)
    }

    /// Handle GET /api/gamification/level
    async fn handle_level(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        let profile = resources.database.get_profile(user_id).await?;

        // Highest milestone at or below the current level
        let current_milestone = resources
            .database
            .milestones_between(0, profile.level)
            .await?
            .pop()
            .map(|m| MilestoneResponse {
                level: m.level,
                title: m.title,
                badge_emoji: m.badge_emoji,
            });

        let response = LevelResponse {
            info: levels::LevelInfo::from_profile(&profile),
            current_milestone,
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/gamification/levels/stats
    ///
    /// Population-wide level distribution.
    async fn handle_level_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources)?;

        let distribution = resources.database.level_distribution().await?;
        let total_users: i64 = distribution.iter().map(|(_, n)| n).sum();
        let max_level = distribution.iter().map(|(level, _)| *level).max().unwrap_or(1);
        #[allow(clippy::cast_precision_loss)]
        let average_level = if total_users > 0 {
            distribution
                .iter()
                .map(|(level, n)| i64::from(*level) * n)
                .sum::<i64>() as f64
                / total_users as f64
        } else {
            0.0
        };

        let response = LevelStatsResponse {
            total_users,
            average_level,
            max_level,
            distribution: distribution
                .into_iter()
                .map(|(level, user_count)| LevelBracket { level, user_count })
                .collect(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/gamification/xp/breakdown
    async fn handle_xp_breakdown(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let now = Utc::now();
        let by_source: Vec<XpBreakdownEntry> = resources
            .database
            .xp_by_source(user_id)
            .await?
            .into_iter()
            .map(|(source, total_xp)| XpBreakdownEntry { source, total_xp })
            .collect();
        let daily: Vec<DailyXpEntry> = resources
            .database
            .daily_xp_totals(user_id, now - Duration::days(XP_BREAKDOWN_DAYS), now)
            .await?
            .into_iter()
            .map(|(date, total_xp)| DailyXpEntry { date, total_xp })
            .collect();

        let profile = resources.database.get_profile(user_id).await?;
        let response = XpBreakdownResponse {
            by_source,
            daily,
            prestige_multiplier: levels::prestige_multiplier(profile.prestige_level),
            seasonal_multiplier: resources.database.active_seasonal_multiplier(now).await?,
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/gamification/xp/log
    async fn handle_xp_log(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 200);

        let entries = resources.database.recent_xp_log(user_id, limit).await?;
        let response: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "xp_gained": e.xp_gained,
                    "description": e.description,
                    "created_at": e.created_at.to_rfc3339(),
                })
            })
            .collect();

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/gamification/prestige
    async fn handle_prestige(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let outcome = levels::prestige_reset(&resources.database, user_id).await?;
        tracing::info!(user_id = %user_id, prestige_level = outcome.prestige_level, "Prestige reset");

        Ok((StatusCode::OK, Json(outcome)).into_response())
    }

    /// Handle GET /api/gamification/points
    async fn handle_points(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let profile = resources.database.get_profile(user_id).await?;
        let totals = resources.database.point_totals_by_type(user_id).await?;

        let response = PointsResponse {
            balance: profile.points,
            prestige_points: profile.prestige_points,
            totals_by_type: totals
                .into_iter()
                .map(|(transaction_type, total)| TypeTotal {
                    transaction_type,
                    total,
                })
                .collect(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/gamification/points/transactions
    async fn handle_transactions(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 200);
        let offset = query.offset.unwrap_or(0).max(0);

        let transactions = resources
            .database
            .list_point_transactions(user_id, limit, offset)
            .await?;
        let response: Vec<TransactionResponse> =
            transactions.into_iter().map(Into::into).collect();

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/gamification/points/transfer
    async fn handle_transfer(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<TransferRequest>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let recipient = resources
            .database
            .get_user_by_username(&body.recipient_username)
            .await?
            .ok_or_else(|| AppError::not_found("Recipient"))?;

        let outcome = points::transfer_points(
            &resources.database,
            user_id,
            recipient.id,
            body.amount,
            body.description.as_deref(),
        )
        .await?;

        Ok((StatusCode::OK, Json(outcome)).into_response())
    }

    /// Handle GET /api/gamification/rewards
    async fn handle_list_rewards(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources)?;

        let rewards = resources.database.list_point_rewards(true).await?;
        let response: Vec<RewardResponse> = rewards.into_iter().map(Into::into).collect();

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/gamification/rewards/:id/purchase
    async fn handle_purchase(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(reward_id): Path<Uuid>,
        Json(body): Json<PurchaseRequest>,
    ) -> Result<Response, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let purchase = points::purchase_reward(
            &resources.database,
            user_id,
            reward_id,
            body.quantity.unwrap_or(1),
        )
        .await?;

        let response = serde_json::json!({
            "purchase_id": purchase.id.to_string(),
            "points_spent": purchase.points_spent,
            "quantity": purchase.quantity,
        });

        Ok((StatusCode::CREATED, Json(response)).into_response())
    }
}
