// ABOUTME: Gamification domain models: XP sources, point transactions, rewards, milestones
// ABOUTME: Config entities carry multipliers and per-period caps applied at award time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::AppError;

/// Named XP source with a multiplier and optional per-period caps.
///
/// Auto-created with defaults the first time a source name is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpSource {
    /// Unique identifier
    pub id: Uuid,
    /// Source name, e.g. `drink_logged`
    pub name: String,
    /// Multiplier applied to raw XP from this source
    pub multiplier: f64,
    /// Optional cap on XP earned from this source per day
    pub daily_limit: Option<i64>,
    /// Whether the source is active
    pub is_active: bool,
}

impl XpSource {
    /// Create a source with default multiplier and no cap
    #[must_use]
    pub fn with_defaults(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            multiplier: 1.0,
            daily_limit: None,
            is_active: true,
        }
    }
}

/// One row of the append-only XP log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpLogEntry {
    /// Unique identifier
    pub id: Uuid,
    /// User who earned the XP
    pub user_id: Uuid,
    /// Source the XP came from
    pub source_id: Uuid,
    /// Final XP amount after all multipliers
    pub xp_gained: i64,
    /// Optional free-form description
    pub description: Option<String>,
    /// When the XP was awarded
    pub created_at: DateTime<Utc>,
}

/// Named point source with a multiplier and optional per-period caps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSource {
    /// Unique identifier
    pub id: Uuid,
    /// Source name, e.g. `drink_logged`
    pub name: String,
    /// Multiplier applied to raw points from this source
    pub multiplier: f64,
    /// Optional cap on points earned from this source per day
    pub daily_limit: Option<i64>,
    /// Optional cap on points earned from this source per ISO week
    pub weekly_limit: Option<i64>,
    /// Whether the source is active
    pub is_active: bool,
}

impl PointSource {
    /// Create a source with default multiplier and no caps
    #[must_use]
    pub fn with_defaults(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            multiplier: 1.0,
            daily_limit: None,
            weekly_limit: None,
            is_active: true,
        }
    }
}

/// Kind of point transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Earned,
    Spent,
    Bonus,
    Transfer,
}

impl TransactionType {
    /// String form stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Earned => "earned",
            Self::Spent => "spent",
            Self::Bonus => "bonus",
            Self::Transfer => "transfer",
        }
    }

    /// Whether this transaction type increases the balance
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Earned | Self::Bonus)
    }
}

impl std::str::FromStr for TransactionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earned" => Ok(Self::Earned),
            "spent" => Ok(Self::Spent),
            "bonus" => Ok(Self::Bonus),
            "transfer" => Ok(Self::Transfer),
            other => Err(AppError::invalid_input(format!(
                "Unknown transaction type: {other}"
            ))),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the points audit trail.
///
/// `balance_after` snapshots the profile balance right after the mutation
/// that produced this row. An audit trail, not a tamper-evident ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointTransaction {
    /// Unique identifier
    pub id: Uuid,
    /// User whose balance changed
    pub user_id: Uuid,
    /// Source for `earned` transactions
    pub source_id: Option<Uuid>,
    /// Transaction kind
    pub transaction_type: TransactionType,
    /// Absolute amount moved (always positive)
    pub amount: i64,
    /// Balance immediately after this transaction
    pub balance_after: i64,
    /// Optional free-form description
    pub description: Option<String>,
    /// Kind of referenced entity, e.g. `transfer`, `purchase`
    pub reference_type: Option<String>,
    /// ID of the referenced entity
    pub reference_id: Option<String>,
    /// When the transaction happened
    pub created_at: DateTime<Utc>,
}

/// A reward purchasable with points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointReward {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Description shown in the store
    pub description: Option<String>,
    /// Cost per unit in points
    pub cost_points: i64,
    /// Minimum level required to purchase
    pub required_level: i32,
    /// Per-user lifetime purchase cap
    pub purchase_limit_per_user: Option<i64>,
    /// Whether stock is limited
    pub is_limited: bool,
    /// Remaining stock when limited
    pub stock_quantity: Option<i64>,
    /// Whether currently purchasable
    pub is_available: bool,
}

/// A record of a reward purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointPurchase {
    /// Unique identifier
    pub id: Uuid,
    /// Buyer
    pub user_id: Uuid,
    /// Purchased reward
    pub reward_id: Uuid,
    /// Total points spent
    pub points_spent: i64,
    /// Units purchased
    pub quantity: i64,
    /// When the purchase happened
    pub created_at: DateTime<Utc>,
}

/// A reward granted on reaching a level bracket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelReward {
    /// Unique identifier
    pub id: Uuid,
    /// Level at which this reward unlocks
    pub level: i32,
    /// Reward kind: `points`, `badge`, or `feature_unlock`
    pub reward_type: String,
    /// Kind-specific value (points amount, badge name, feature key)
    pub reward_value: String,
    /// Description shown to the user
    pub description: Option<String>,
}

/// A named milestone level with a title and badge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelMilestone {
    /// Milestone level
    pub level: i32,
    /// Title shown on the profile, e.g. "Hydration Hero"
    pub title: String,
    /// Badge emoji
    pub badge_emoji: Option<String>,
    /// Description
    pub description: Option<String>,
}

/// A point-balance milestone, achieved once per user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointMilestone {
    /// Unique identifier
    pub id: Uuid,
    /// Balance at which the milestone unlocks
    pub points_threshold: i64,
    /// Title shown on the profile
    pub title: String,
    /// Badge emoji
    pub badge_emoji: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Manual kill switch
    pub is_active: bool,
}

/// A time-bounded seasonal XP boost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalBoost {
    /// Unique identifier
    pub id: Uuid,
    /// Event name
    pub name: String,
    /// XP multiplier while active
    pub multiplier: f64,
    /// Boost window start
    pub starts_at: DateTime<Utc>,
    /// Boost window end
    pub ends_at: DateTime<Utc>,
    /// Manual kill switch
    pub is_active: bool,
}
