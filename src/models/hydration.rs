// ABOUTME: Hydration consumption record and daily goal rollup models
// ABOUTME: Append-only log entries plus the per-day aggregate row that drives streaks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One hydration event. Append-only; immutable once written except for
/// volume/brand correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationLog {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Volume consumed in milliliters
    pub volume_ml: f64,
    /// Optional water brand
    pub brand: Option<String>,
    /// When the drink was consumed
    pub logged_at: DateTime<Utc>,
}

impl HydrationLog {
    /// Create a new log entry timestamped now
    #[must_use]
    pub fn new(user_id: Uuid, volume_ml: f64, brand: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            volume_ml,
            brand,
            logged_at: Utc::now(),
        }
    }
}

/// Per-user per-day rollup maintained on every log write.
///
/// Drives streak updates and the weekly/monthly goal leaderboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyGoal {
    /// Owning user
    pub user_id: Uuid,
    /// Calendar date (UTC)
    pub date: NaiveDate,
    /// Total volume logged on this date
    pub total_volume_ml: f64,
    /// Whether the profile's daily goal was met
    pub goal_met: bool,
}
