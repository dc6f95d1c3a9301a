// ABOUTME: Points economy services: awards with caps, spending, transfers, the reward store
// ABOUTME: Caps deny outright rather than clipping; every mutation writes a ledger row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{start_of_iso_week, start_of_utc_day};
use crate::constants::points::{MAX_TRANSFER_AMOUNT, MIN_TRANSFER_AMOUNT, TRANSFER_FEE_PERCENTAGE};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{FeedEvent, FeedEventKind, PointPurchase, PointTransaction, TransactionType};

/// Outcome of a peer-to-peer transfer
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub amount_sent: i64,
    pub fee: i64,
    /// Total debited from the sender: the amount plus the destroyed fee
    pub total_cost: i64,
    pub amount_received: i64,
    pub sender_balance: i64,
    pub recipient_balance: i64,
}

/// Award points to a user from a named source.
///
/// The raw amount is multiplied by the source multiplier and the active
/// seasonal bonus, truncating at each step. Unlike XP, point caps deny the
/// award outright: if crediting the full amount would exceed the source's
/// daily or weekly cap, nothing is awarded.
///
/// # Errors
///
/// Returns an error if a cap would be exceeded or a database operation fails
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub async fn award_points(
    database: &Database,
    user_id: Uuid,
    source_name: &str,
    raw_points: i64,
    description: Option<&str>,
) -> AppResult<i64> {
    let source = database.get_or_create_point_source(source_name).await?;
    if !source.is_active || raw_points <= 0 {
        return Ok(0);
    }

    let now = Utc::now();
    let mut amount = (raw_points as f64 * source.multiplier) as i64;
    let bonus = database.active_seasonal_multiplier(now).await?;
    amount = (amount as f64 * bonus) as i64;

    if let Some(limit) = source.daily_limit {
        let earned = database
            .points_from_source_since(user_id, source.id, start_of_utc_day(now))
            .await?;
        if earned + amount > limit {
            return Err(AppError::limit_exceeded(format!(
                "Daily point limit reached for source '{source_name}'"
            )));
        }
    }
    if let Some(limit) = source.weekly_limit {
        let earned = database
            .points_from_source_since(user_id, source.id, start_of_iso_week(now))
            .await?;
        if earned + amount > limit {
            return Err(AppError::limit_exceeded(format!(
                "Weekly point limit reached for source '{source_name}'"
            )));
        }
    }

    let mut profile = database.get_profile(user_id).await?;
    profile.points += amount;
    database.update_profile(&profile).await?;

    let tx = PointTransaction {
        id: Uuid::new_v4(),
        user_id,
        source_id: Some(source.id),
        transaction_type: TransactionType::Earned,
        amount,
        balance_after: profile.points,
        description: description.map(ToOwned::to_owned),
        reference_type: None,
        reference_id: None,
        created_at: now,
    };
    database.insert_point_transaction(&tx).await?;

    // Balance milestones are achieved once and never revoked
    let reached = database
        .unachieved_point_milestones(user_id, profile.points)
        .await?;
    for milestone in &reached {
        database.claim_point_milestone(user_id, milestone.id).await?;
        let event = FeedEvent::new(
            user_id,
            FeedEventKind::MilestoneReached,
            serde_json::json!({
                "points_threshold": milestone.points_threshold,
                "title": milestone.title,
            }),
        );
        database.insert_feed_event(&event).await?;
    }

    Ok(amount)
}

/// Spend points from a user's balance.
///
/// # Errors
///
/// Returns an error if the amount is not positive, the balance is
/// insufficient, or a database operation fails
pub async fn spend_points(
    database: &Database,
    user_id: Uuid,
    amount: i64,
    description: Option<&str>,
) -> AppResult<i64> {
    if amount <= 0 {
        return Err(AppError::invalid_input("Spend amount must be positive"));
    }

    let mut profile = database.get_profile(user_id).await?;
    if profile.points < amount {
        return Err(AppError::insufficient_balance(format!(
            "Balance {} is less than {amount}",
            profile.points
        )));
    }

    profile.points -= amount;
    database.update_profile(&profile).await?;

    let tx = PointTransaction {
        id: Uuid::new_v4(),
        user_id,
        source_id: None,
        transaction_type: TransactionType::Spent,
        amount,
        balance_after: profile.points,
        description: description.map(ToOwned::to_owned),
        reference_type: None,
        reference_id: None,
        created_at: Utc::now(),
    };
    database.insert_point_transaction(&tx).await?;

    Ok(profile.points)
}

/// Fee charged on a transfer of `amount`, truncated to whole points
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn transfer_fee(amount: i64) -> i64 {
    (amount as f64 * TRANSFER_FEE_PERCENTAGE) as i64
}

/// Transfer points between users. The sender pays the amount plus the fee,
/// the recipient receives the full amount, and the fee is destroyed.
///
/// # Errors
///
/// Returns an error if the amount is out of bounds, sender and recipient are
/// the same user, the recipient does not exist, the sender's balance is
/// insufficient, or a database operation fails
pub async fn transfer_points(
    database: &Database,
    from: Uuid,
    to: Uuid,
    amount: i64,
    description: Option<&str>,
) -> AppResult<TransferOutcome> {
    if from == to {
        return Err(AppError::invalid_input("Cannot transfer points to yourself"));
    }
    if !(MIN_TRANSFER_AMOUNT..=MAX_TRANSFER_AMOUNT).contains(&amount) {
        return Err(AppError::invalid_input(format!(
            "Transfer amount must be between {MIN_TRANSFER_AMOUNT} and {MAX_TRANSFER_AMOUNT}"
        )));
    }
    if database.get_user(to).await?.is_none() {
        return Err(AppError::not_found("Recipient"));
    }

    let fee = transfer_fee(amount);
    let (sender_balance, recipient_balance) = database
        .transfer_points(from, to, amount, fee, description)
        .await?;

    Ok(TransferOutcome {
        amount_sent: amount,
        fee,
        total_cost: amount + fee,
        amount_received: amount,
        sender_balance,
        recipient_balance,
    })
}

/// Purchase units of a reward from the store.
///
/// Checks availability, the buyer's level requirement, and the per-user
/// purchase limit before handing the balance and stock checks to the atomic
/// database transaction.
///
/// # Errors
///
/// Returns an error if any requirement fails or a database operation fails
pub async fn purchase_reward(
    database: &Database,
    user_id: Uuid,
    reward_id: Uuid,
    quantity: i64,
) -> AppResult<PointPurchase> {
    if quantity <= 0 {
        return Err(AppError::invalid_input("Quantity must be positive"));
    }

    let reward = database
        .get_point_reward(reward_id)
        .await?
        .ok_or_else(|| AppError::not_found("Reward"))?;

    if !reward.is_available {
        return Err(AppError::invalid_input("Reward is not available"));
    }

    let profile = database.get_profile(user_id).await?;
    if profile.level < reward.required_level {
        return Err(AppError::invalid_input(format!(
            "Reward requires level {}",
            reward.required_level
        )));
    }

    if let Some(limit) = reward.purchase_limit_per_user {
        let already = database.count_user_purchases(user_id, reward_id).await?;
        if already + quantity > limit {
            return Err(AppError::limit_exceeded(format!(
                "Purchase limit of {limit} reached for this reward"
            )));
        }
    }

    let purchase = PointPurchase {
        id: Uuid::new_v4(),
        user_id,
        reward_id,
        points_spent: reward.cost_points * quantity,
        quantity,
        created_at: Utc::now(),
    };
    database.record_purchase(&purchase).await?;

    Ok(purchase)
}
