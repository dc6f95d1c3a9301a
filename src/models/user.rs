// ABOUTME: User account and gamification profile models
// ABOUTME: Core identity plus the per-user mutable stats row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::hydration;

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Email address (unique)
    pub email: String,
    /// Display name (unique)
    pub username: String,
    /// bcrypt password hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh ID
    #[must_use]
    pub fn new(email: String, username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            username,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Per-user mutable gamification and goal state.
///
/// `level` is always derived from `total_xp` by the level curve; `current_xp`
/// is the remainder above the current level's threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Owning user
    pub user_id: Uuid,
    /// Spendable points balance
    pub points: i64,
    /// XP accumulated within the current level
    pub current_xp: i64,
    /// Lifetime XP since the last prestige reset
    pub total_xp: i64,
    /// Current level (>= 1)
    pub level: i32,
    /// Consecutive days with the daily goal met, ending today or yesterday
    pub current_streak: i32,
    /// Longest goal streak ever achieved
    pub longest_streak: i32,
    /// Daily intake goal in milliliters
    pub daily_goal_ml: f64,
    /// Number of prestige resets performed
    pub prestige_level: i32,
    /// Permanent prestige point currency
    pub prestige_points: i64,
    /// Timestamp of the most recent prestige reset
    pub last_prestige_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Create the default profile for a newly registered user
    #[must_use]
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            points: 0,
            current_xp: 0,
            total_xp: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            daily_goal_ml: hydration::DEFAULT_DAILY_GOAL_ML,
            prestige_level: 0,
            prestige_points: 0,
            last_prestige_at: None,
        }
    }
}
