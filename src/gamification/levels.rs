// ABOUTME: Exponential XP/level curve and the XP award pipeline
// ABOUTME: Awards apply source, seasonal, and prestige multipliers with integer truncation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::start_of_utc_day;
use crate::constants::levels::{
    BASE_XP_PER_LEVEL, PRESTIGE_LEVEL_REQUIREMENT, PRESTIGE_MULTIPLIER_PER_TIER,
    PRESTIGE_POINTS_PER_LEVEL, SCALING_FACTOR,
};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{
    FeedEvent, FeedEventKind, LevelMilestone, LevelReward, PointTransaction, TransactionType,
    UserProfile, XpLogEntry,
};

/// XP required to advance from `level` to `level + 1`.
///
/// `floor(100 * 1.15^(level-1))`, so 100 at level 1, 115 at level 2, 132 at
/// level 3. The epsilon guards against the binary representation of 1.15
/// flooring one below the intended value.
#[must_use]
pub fn xp_for_next_level(level: i32) -> i64 {
    if level < 1 {
        return BASE_XP_PER_LEVEL;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let cost = (BASE_XP_PER_LEVEL as f64 * SCALING_FACTOR.powi(level - 1) + 1e-9).floor() as i64;
    cost
}

/// Cumulative XP required to reach `level` from level 1
#[must_use]
pub fn total_xp_for_level(level: i32) -> i64 {
    (1..level).map(xp_for_next_level).sum()
}

/// Level implied by a lifetime XP total. Inverse of [`total_xp_for_level`].
#[must_use]
pub fn level_for_total_xp(total_xp: i64) -> i32 {
    let mut level = 1;
    let mut remaining = total_xp;
    loop {
        let cost = xp_for_next_level(level);
        if remaining < cost {
            return level;
        }
        remaining -= cost;
        level += 1;
    }
}

/// XP accumulated above the current level's threshold
#[must_use]
pub fn current_xp_within_level(total_xp: i64) -> i64 {
    total_xp - total_xp_for_level(level_for_total_xp(total_xp))
}

/// Permanent XP multiplier from prestige tier
#[must_use]
pub fn prestige_multiplier(prestige_level: i32) -> f64 {
    PRESTIGE_MULTIPLIER_PER_TIER.mul_add(f64::from(prestige_level.max(0)), 1.0)
}

/// Outcome of one XP award
#[derive(Debug, Clone, Serialize)]
pub struct XpAward {
    /// Final XP credited after all multipliers and caps
    pub xp_awarded: i64,
    pub old_level: i32,
    pub new_level: i32,
    pub leveled_up: bool,
    /// Level rewards granted by this award's level-ups
    pub rewards_granted: Vec<LevelReward>,
    /// Milestones crossed by this award's level-ups
    pub milestones_reached: Vec<LevelMilestone>,
}

/// Snapshot of a user's progression
#[derive(Debug, Clone, Serialize)]
pub struct LevelInfo {
    pub level: i32,
    pub current_xp: i64,
    pub xp_for_next_level: i64,
    pub total_xp: i64,
    pub progress_percent: f64,
    pub prestige_level: i32,
    pub prestige_points: i64,
    /// Permanent XP multiplier currently applied to awards
    pub xp_multiplier: f64,
}

impl LevelInfo {
    /// Derive the progression snapshot from a profile
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        let next = xp_for_next_level(profile.level);
        #[allow(clippy::cast_precision_loss)]
        let progress_percent = if next > 0 {
            (profile.current_xp as f64 / next as f64) * 100.0
        } else {
            0.0
        };

        Self {
            level: profile.level,
            current_xp: profile.current_xp,
            xp_for_next_level: next,
            total_xp: profile.total_xp,
            progress_percent,
            prestige_level: profile.prestige_level,
            prestige_points: profile.prestige_points,
            xp_multiplier: prestige_multiplier(profile.prestige_level),
        }
    }
}

/// Outcome of a prestige reset
#[derive(Debug, Clone, Serialize)]
pub struct PrestigeOutcome {
    pub prestige_level: i32,
    pub prestige_points_gained: i64,
    pub total_prestige_points: i64,
}

/// Award XP to a user through the full pipeline.
///
/// Raw XP is multiplied by the source multiplier, the active seasonal boost,
/// and the prestige multiplier, truncating to whole XP at each step. A
/// per-source daily cap clips the award to the remaining headroom and denies
/// it entirely once exhausted. Level-ups grant all intermediate level
/// rewards and milestones.
///
/// # Errors
///
/// Returns an error if the source's daily cap is exhausted or a database
/// operation fails
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub async fn award_xp(
    database: &Database,
    user_id: Uuid,
    source_name: &str,
    raw_xp: i64,
    description: Option<&str>,
) -> AppResult<XpAward> {
    let source = database.get_or_create_xp_source(source_name).await?;
    let mut profile = database.get_profile(user_id).await?;
    let old_level = profile.level;

    if !source.is_active || raw_xp <= 0 {
        return Ok(XpAward {
            xp_awarded: 0,
            old_level,
            new_level: old_level,
            leveled_up: false,
            rewards_granted: Vec::new(),
            milestones_reached: Vec::new(),
        });
    }

    let now = Utc::now();
    let mut amount = (raw_xp as f64 * source.multiplier) as i64;
    let seasonal = database.active_seasonal_multiplier(now).await?;
    amount = (amount as f64 * seasonal) as i64;
    amount = (amount as f64 * prestige_multiplier(profile.prestige_level)) as i64;

    if let Some(limit) = source.daily_limit {
        let earned_today = database
            .xp_from_source_since(user_id, source.id, start_of_utc_day(now))
            .await?;
        let headroom = limit - earned_today;
        if headroom <= 0 {
            return Err(AppError::limit_exceeded(format!(
                "Daily XP limit reached for source '{source_name}'"
            )));
        }
        amount = amount.min(headroom);
    }

    let entry = XpLogEntry {
        id: Uuid::new_v4(),
        user_id,
        source_id: source.id,
        xp_gained: amount,
        description: description.map(ToOwned::to_owned),
        created_at: now,
    };
    database.insert_xp_log(&entry).await?;

    profile.total_xp += amount;
    profile.level = level_for_total_xp(profile.total_xp);
    profile.current_xp = profile.total_xp - total_xp_for_level(profile.level);
    let new_level = profile.level;

    let mut rewards_granted = Vec::new();
    let mut milestones_reached = Vec::new();

    if new_level > old_level {
        // A large award can jump several levels; every bracket pays out
        rewards_granted = database.level_rewards_between(old_level, new_level).await?;
        for reward in &rewards_granted {
            if reward.reward_type == "points" {
                if let Ok(points) = reward.reward_value.parse::<i64>() {
                    profile.points += points;
                    let tx = PointTransaction {
                        id: Uuid::new_v4(),
                        user_id,
                        source_id: None,
                        transaction_type: TransactionType::Bonus,
                        amount: points,
                        balance_after: profile.points,
                        description: Some(format!("Level {} reward", reward.level)),
                        reference_type: Some("level_reward".to_owned()),
                        reference_id: Some(reward.id.to_string()),
                        created_at: now,
                    };
                    database.insert_point_transaction(&tx).await?;
                }
            }
            database.claim_level_reward(user_id, reward.id).await?;
        }

        milestones_reached = database.milestones_between(old_level, new_level).await?;

        let event = FeedEvent::new(
            user_id,
            FeedEventKind::LevelUp,
            serde_json::json!({ "from_level": old_level, "to_level": new_level }),
        );
        database.insert_feed_event(&event).await?;

        for milestone in &milestones_reached {
            let event = FeedEvent::new(
                user_id,
                FeedEventKind::MilestoneReached,
                serde_json::json!({ "level": milestone.level, "title": milestone.title }),
            );
            database.insert_feed_event(&event).await?;
        }
    }

    database.update_profile(&profile).await?;

    Ok(XpAward {
        xp_awarded: amount,
        old_level,
        new_level,
        leveled_up: new_level > old_level,
        rewards_granted,
        milestones_reached,
    })
}

/// Reset a user's level for permanent prestige currency.
///
/// Requires the prestige level threshold. Grants `level * 5` prestige
/// points, advances the prestige tier, and resets level and XP.
///
/// # Errors
///
/// Returns an error if the user is below the required level or a database
/// operation fails
pub async fn prestige_reset(database: &Database, user_id: Uuid) -> AppResult<PrestigeOutcome> {
    let mut profile = database.get_profile(user_id).await?;

    if profile.level < PRESTIGE_LEVEL_REQUIREMENT {
        return Err(AppError::invalid_input(format!(
            "Prestige requires level {PRESTIGE_LEVEL_REQUIREMENT}, current level is {}",
            profile.level
        )));
    }

    let gained = i64::from(profile.level) * PRESTIGE_POINTS_PER_LEVEL;
    profile.prestige_points += gained;
    profile.prestige_level += 1;
    profile.level = 1;
    profile.total_xp = 0;
    profile.current_xp = 0;
    profile.last_prestige_at = Some(Utc::now());

    database.update_profile(&profile).await?;

    let event = FeedEvent::new(
        user_id,
        FeedEventKind::PrestigeReset,
        serde_json::json!({
            "prestige_level": profile.prestige_level,
            "prestige_points_gained": gained,
        }),
    );
    database.insert_feed_event(&event).await?;

    Ok(PrestigeOutcome {
        prestige_level: profile.prestige_level,
        prestige_points_gained: gained,
        total_prestige_points: profile.prestige_points,
    })
}
