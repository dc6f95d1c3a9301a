// ABOUTME: Application constants and tuning values organized by domain
// ABOUTME: Level curve parameters, points economy limits, cache TTLs, defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

//! Application constants grouped by domain. Values that tune domain behavior
//! live here rather than being scattered through service code.

/// Service identity for logging and JWT audience
pub mod service {
    /// Service name used in structured logs and token claims
    pub const NAME: &str = "aqualog-server";
    /// JWT audience claim
    pub const JWT_AUDIENCE: &str = "aqualog";
}

/// XP / level progression curve
pub mod levels {
    /// XP needed to go from level 1 to level 2
    pub const BASE_XP_PER_LEVEL: i64 = 100;
    /// Exponential growth factor of the per-level XP cost
    pub const SCALING_FACTOR: f64 = 1.15;
    /// Minimum level required before a prestige reset is allowed
    pub const PRESTIGE_LEVEL_REQUIREMENT: i32 = 100;
    /// Prestige points granted per level held at reset time
    pub const PRESTIGE_POINTS_PER_LEVEL: i64 = 5;
    /// Permanent XP multiplier gained per prestige tier
    pub const PRESTIGE_MULTIPLIER_PER_TIER: f64 = 0.05;
}

/// Points economy limits
pub mod points {
    /// Fee fraction taken from the sender on peer-to-peer transfers.
    /// The fee is destroyed, not credited anywhere.
    pub const TRANSFER_FEE_PERCENTAGE: f64 = 0.05;
    /// Smallest allowed peer-to-peer transfer
    pub const MIN_TRANSFER_AMOUNT: i64 = 10;
    /// Largest allowed peer-to-peer transfer
    pub const MAX_TRANSFER_AMOUNT: i64 = 10_000;
}

/// Hydration tracking defaults
pub mod hydration {
    /// Default daily intake goal in milliliters for new profiles
    pub const DEFAULT_DAILY_GOAL_ML: f64 = 2000.0;
    /// Lookback window for the consumption heatmap, in days
    pub const HEATMAP_LOOKBACK_DAYS: i64 = 365;
    /// Largest single log volume accepted, in milliliters
    pub const MAX_LOG_VOLUME_ML: f64 = 10_000.0;
}

/// Gamification award amounts for built-in actions
pub mod awards {
    /// XP granted for logging a drink
    pub const XP_DRINK_LOGGED: i64 = 10;
    /// Points granted for logging a drink
    pub const POINTS_DRINK_LOGGED: i64 = 5;
    /// XP granted when the daily goal is first met
    pub const XP_DAILY_GOAL_MET: i64 = 50;
}

/// Cache TTLs
pub mod cache {
    /// Staleness bound for the platform-wide analytics snapshot, in seconds
    pub const GLOBAL_STATS_TTL_SECS: u64 = 3600;
}

/// Pagination and query limits
pub mod limits {
    /// Default leaderboard size
    pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 20;
    /// Largest leaderboard page a client may request
    pub const MAX_LEADERBOARD_LIMIT: i64 = 100;
    /// Default page size for list endpoints
    pub const DEFAULT_PAGE_SIZE: i64 = 50;
    /// Consistency leaderboard window when no period bound exists, in days
    pub const CONSISTENCY_DEFAULT_WINDOW_DAYS: i64 = 30;
    /// Trailing window for the daily XP breakdown, in days
    pub const XP_BREAKDOWN_DAYS: i64 = 30;
}
