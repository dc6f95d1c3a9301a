// ABOUTME: Gamification database operations: XP log, point ledger, rewards, milestones
// ABOUTME: Transfer and purchase run in explicit transactions, all-or-nothing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    LevelMilestone, LevelReward, PointMilestone, PointPurchase, PointReward, PointSource,
    PointTransaction, SeasonalBoost, TransactionType, XpLogEntry, XpSource,
};

impl Database {
    #[allow(clippy::too_many_lines)]
    pub(super) async fn migrate_gamification(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS xp_sources (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                multiplier REAL NOT NULL DEFAULT 1.0,
                daily_limit INTEGER,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create xp_sources table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS point_sources (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                multiplier REAL NOT NULL DEFAULT 1.0,
                daily_limit INTEGER,
                weekly_limit INTEGER,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create point_sources table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS xp_log (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                source_id TEXT NOT NULL REFERENCES xp_sources(id),
                xp_gained INTEGER NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create xp_log table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS point_transactions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                source_id TEXT REFERENCES point_sources(id),
                transaction_type TEXT NOT NULL,
                amount INTEGER NOT NULL,
                balance_after INTEGER NOT NULL,
                description TEXT,
                reference_type TEXT,
                reference_id TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to create point_transactions table: {e}"))
        })?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS point_rewards (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                cost_points INTEGER NOT NULL,
                required_level INTEGER NOT NULL DEFAULT 1,
                purchase_limit_per_user INTEGER,
                is_limited INTEGER NOT NULL DEFAULT 0,
                stock_quantity INTEGER,
                is_available INTEGER NOT NULL DEFAULT 1
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create point_rewards table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS point_purchases (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                reward_id TEXT NOT NULL REFERENCES point_rewards(id),
                points_spent INTEGER NOT NULL,
                quantity INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create point_purchases table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS level_rewards (
                id TEXT PRIMARY KEY,
                level INTEGER NOT NULL,
                reward_type TEXT NOT NULL,
                reward_value TEXT NOT NULL,
                description TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create level_rewards table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_level_rewards (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                level_reward_id TEXT NOT NULL REFERENCES level_rewards(id),
                claimed_at TEXT NOT NULL,
                PRIMARY KEY (user_id, level_reward_id)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to create user_level_rewards table: {e}"))
        })?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS level_milestones (
                level INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                badge_emoji TEXT,
                description TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create level_milestones table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS point_milestones (
                id TEXT PRIMARY KEY,
                points_threshold INTEGER NOT NULL,
                title TEXT NOT NULL,
                badge_emoji TEXT,
                description TEXT,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create point_milestones table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_point_milestones (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                milestone_id TEXT NOT NULL REFERENCES point_milestones(id),
                achieved_at TEXT NOT NULL,
                PRIMARY KEY (user_id, milestone_id)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to create user_point_milestones table: {e}"))
        })?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS seasonal_boosts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                multiplier REAL NOT NULL,
                starts_at TEXT NOT NULL,
                ends_at TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create seasonal_boosts table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_xp_log_user_time ON xp_log(user_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_point_tx_user_time
             ON point_transactions(user_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;

        Ok(())
    }

    // ========================================================================
    // Sources
    // ========================================================================

    /// Get an XP source by name, creating it with defaults on first use
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_or_create_xp_source(&self, name: &str) -> AppResult<XpSource> {
        let row = sqlx::query(
            "SELECT id, name, multiplier, daily_limit, is_active FROM xp_sources WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get XP source: {e}")))?;

        if let Some(r) = row {
            return Self::row_to_xp_source(&r);
        }

        let source = XpSource::with_defaults(name);
        sqlx::query(
            r"
            INSERT INTO xp_sources (id, name, multiplier, daily_limit, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(source.id.to_string())
        .bind(&source.name)
        .bind(source.multiplier)
        .bind(source.daily_limit)
        .bind(source.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create XP source: {e}")))?;

        Ok(source)
    }

    /// Get a point source by name, creating it with defaults on first use
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_or_create_point_source(&self, name: &str) -> AppResult<PointSource> {
        let row = sqlx::query(
            r"
            SELECT id, name, multiplier, daily_limit, weekly_limit, is_active
            FROM point_sources
            WHERE name = $1
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get point source: {e}")))?;

        if let Some(r) = row {
            return Self::row_to_point_source(&r);
        }

        let source = PointSource::with_defaults(name);
        sqlx::query(
            r"
            INSERT INTO point_sources (id, name, multiplier, daily_limit, weekly_limit, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(source.id.to_string())
        .bind(&source.name)
        .bind(source.multiplier)
        .bind(source.daily_limit)
        .bind(source.weekly_limit)
        .bind(source.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create point source: {e}")))?;

        Ok(source)
    }

    /// Update an XP source's multiplier and cap
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn update_xp_source(&self, source: &XpSource) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE xp_sources
            SET multiplier = $1, daily_limit = $2, is_active = $3
            WHERE id = $4
            ",
        )
        .bind(source.multiplier)
        .bind(source.daily_limit)
        .bind(source.is_active)
        .bind(source.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update XP source: {e}")))?;

        Ok(())
    }

    // ========================================================================
    // XP log
    // ========================================================================

    /// Append an XP log entry
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn insert_xp_log(&self, entry: &XpLogEntry) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO xp_log (id, user_id, source_id, xp_gained, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(entry.id.to_string())
        .bind(entry.user_id.to_string())
        .bind(entry.source_id.to_string())
        .bind(entry.xp_gained)
        .bind(&entry.description)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert XP log entry: {e}")))?;

        Ok(())
    }

    /// Total XP a user earned from one source since `since`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn xp_from_source_since(
        &self,
        user_id: Uuid,
        source_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<i64> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(xp_gained), 0) AS total
            FROM xp_log
            WHERE user_id = $1 AND source_id = $2 AND created_at >= $3
            ",
        )
        .bind(user_id.to_string())
        .bind(source_id.to_string())
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to sum XP from source: {e}")))?;

        Ok(row.get("total"))
    }

    /// Per-source XP totals for a user, largest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn xp_by_source(&self, user_id: Uuid) -> AppResult<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r"
            SELECT s.name AS name, COALESCE(SUM(l.xp_gained), 0) AS total
            FROM xp_log l
            JOIN xp_sources s ON s.id = l.source_id
            WHERE l.user_id = $1
            GROUP BY s.name
            ORDER BY total DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute XP breakdown: {e}")))?;

        Ok(rows.iter().map(|r| (r.get("name"), r.get("total"))).collect())
    }

    /// Recent XP log entries for a user, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recent_xp_log(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<XpLogEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, source_id, xp_gained, description, created_at
            FROM xp_log
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list XP log: {e}")))?;

        rows.iter().map(Self::row_to_xp_log_entry).collect()
    }

    /// Per-day XP totals for a user within `[start, end)`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn daily_xp_totals(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r"
            SELECT date(created_at) AS day, COALESCE(SUM(xp_gained), 0) AS total
            FROM xp_log
            WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
            GROUP BY date(created_at)
            ORDER BY day ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute daily XP totals: {e}")))?;

        Ok(rows.iter().map(|r| (r.get("day"), r.get("total"))).collect())
    }

    /// Number of profiles at each level, ascending by level
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn level_distribution(&self) -> AppResult<Vec<(i32, i64)>> {
        let rows = sqlx::query(
            r"
            SELECT level, COUNT(*) AS n
            FROM user_profiles
            GROUP BY level
            ORDER BY level ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute level distribution: {e}")))?;

        Ok(rows.iter().map(|r| (r.get("level"), r.get("n"))).collect())
    }

    // ========================================================================
    // Point transactions
    // ========================================================================

    /// Append a point transaction row
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn insert_point_transaction(&self, tx: &PointTransaction) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO point_transactions
                (id, user_id, source_id, transaction_type, amount, balance_after,
                 description, reference_type, reference_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(tx.id.to_string())
        .bind(tx.user_id.to_string())
        .bind(tx.source_id.map(|id| id.to_string()))
        .bind(tx.transaction_type.as_str())
        .bind(tx.amount)
        .bind(tx.balance_after)
        .bind(&tx.description)
        .bind(&tx.reference_type)
        .bind(&tx.reference_id)
        .bind(tx.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert point transaction: {e}")))?;

        Ok(())
    }

    /// Points a user earned from one source since `since`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn points_from_source_since(
        &self,
        user_id: Uuid,
        source_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<i64> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(amount), 0) AS total
            FROM point_transactions
            WHERE user_id = $1 AND source_id = $2
              AND transaction_type = 'earned' AND created_at >= $3
            ",
        )
        .bind(user_id.to_string())
        .bind(source_id.to_string())
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to sum points from source: {e}")))?;

        Ok(row.get("total"))
    }

    /// List a user's point transactions, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_point_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<PointTransaction>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, source_id, transaction_type, amount, balance_after,
                   description, reference_type, reference_id, created_at
            FROM point_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list point transactions: {e}")))?;

        rows.iter().map(Self::row_to_point_transaction).collect()
    }

    /// Lifetime totals by transaction type for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn point_totals_by_type(&self, user_id: Uuid) -> AppResult<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r"
            SELECT transaction_type, COALESCE(SUM(amount), 0) AS total
            FROM point_transactions
            WHERE user_id = $1
            GROUP BY transaction_type
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute point totals: {e}")))?;

        Ok(rows
            .iter()
            .map(|r| (r.get("transaction_type"), r.get("total")))
            .collect())
    }

    /// Atomically move points between two users.
    ///
    /// Debits `amount + fee` from the sender, credits `amount` to the
    /// recipient, and writes both ledger rows. The fee is destroyed. Rolls
    /// back entirely if the sender cannot cover the amount plus the fee.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender has insufficient points or the
    /// transaction fails
    pub async fn transfer_points(
        &self,
        from: Uuid,
        to: Uuid,
        amount: i64,
        fee: i64,
        description: Option<&str>,
    ) -> AppResult<(i64, i64)> {
        // The sender covers the transferred amount plus the destroyed fee
        let total_cost = amount + fee;
        let transfer_ref = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        // Conditional debit enforces the balance check atomically
        let debited = sqlx::query(
            "UPDATE user_profiles SET points = points - $1 WHERE user_id = $2 AND points >= $1",
        )
        .bind(total_cost)
        .bind(from.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to debit sender: {e}")))?;

        if debited.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("Failed to roll back: {e}")))?;
            return Err(AppError::insufficient_balance(
                "Insufficient points including transfer fee",
            ));
        }

        sqlx::query("UPDATE user_profiles SET points = points + $1 WHERE user_id = $2")
            .bind(amount)
            .bind(to.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to credit recipient: {e}")))?;

        let from_balance: i64 =
            sqlx::query("SELECT points FROM user_profiles WHERE user_id = $1")
                .bind(from.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to read sender balance: {e}")))?
                .get("points");

        let to_balance: i64 = sqlx::query("SELECT points FROM user_profiles WHERE user_id = $1")
            .bind(to.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to read recipient balance: {e}")))?
            .get("points");

        for (user_id, tx_type, row_amount, balance) in [
            (from, TransactionType::Spent, total_cost, from_balance),
            (to, TransactionType::Transfer, amount, to_balance),
        ] {
            sqlx::query(
                r"
                INSERT INTO point_transactions
                    (id, user_id, source_id, transaction_type, amount, balance_after,
                     description, reference_type, reference_id, created_at)
                VALUES ($1, $2, NULL, $3, $4, $5, $6, 'transfer', $7, $8)
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id.to_string())
            .bind(tx_type.as_str())
            .bind(row_amount)
            .bind(balance)
            .bind(description)
            .bind(transfer_ref.to_string())
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to record transfer: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transfer: {e}")))?;

        Ok((from_balance, to_balance))
    }

    // ========================================================================
    // Reward store
    // ========================================================================

    /// Create a purchasable reward
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn create_point_reward(&self, reward: &PointReward) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO point_rewards
                (id, name, description, cost_points, required_level,
                 purchase_limit_per_user, is_limited, stock_quantity, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(reward.id.to_string())
        .bind(&reward.name)
        .bind(&reward.description)
        .bind(reward.cost_points)
        .bind(reward.required_level)
        .bind(reward.purchase_limit_per_user)
        .bind(reward.is_limited)
        .bind(reward.stock_quantity)
        .bind(reward.is_available)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create reward: {e}")))?;

        Ok(reward.id)
    }

    /// List rewards, optionally only available ones
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_point_rewards(&self, available_only: bool) -> AppResult<Vec<PointReward>> {
        let sql = if available_only {
            r"
            SELECT id, name, description, cost_points, required_level,
                   purchase_limit_per_user, is_limited, stock_quantity, is_available
            FROM point_rewards
            WHERE is_available = 1
            ORDER BY cost_points
            "
        } else {
            r"
            SELECT id, name, description, cost_points, required_level,
                   purchase_limit_per_user, is_limited, stock_quantity, is_available
            FROM point_rewards
            ORDER BY cost_points
            "
        };

        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list rewards: {e}")))?;

        rows.iter().map(Self::row_to_point_reward).collect()
    }

    /// Get a reward by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_point_reward(&self, id: Uuid) -> AppResult<Option<PointReward>> {
        let row = sqlx::query(
            r"
            SELECT id, name, description, cost_points, required_level,
                   purchase_limit_per_user, is_limited, stock_quantity, is_available
            FROM point_rewards
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get reward: {e}")))?;

        row.map(|r| Self::row_to_point_reward(&r)).transpose()
    }

    /// Units of a reward a user has already purchased
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_user_purchases(&self, user_id: Uuid, reward_id: Uuid) -> AppResult<i64> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(quantity), 0) AS n
            FROM point_purchases
            WHERE user_id = $1 AND reward_id = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(reward_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count purchases: {e}")))?;

        Ok(row.get("n"))
    }

    /// Atomically purchase reward units: deduct points, decrement stock,
    /// record the purchase and its ledger row. Rolls back entirely on
    /// insufficient points or stock.
    ///
    /// # Errors
    ///
    /// Returns an error if the balance or stock is insufficient, or the
    /// transaction fails
    pub async fn record_purchase(&self, purchase: &PointPurchase) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let debited = sqlx::query(
            "UPDATE user_profiles SET points = points - $1 WHERE user_id = $2 AND points >= $1",
        )
        .bind(purchase.points_spent)
        .bind(purchase.user_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to debit points: {e}")))?;

        if debited.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("Failed to roll back: {e}")))?;
            return Err(AppError::insufficient_balance(
                "Insufficient points for purchase",
            ));
        }

        // Conditional decrement enforces the stock check for limited rewards
        let stocked = sqlx::query(
            r"
            UPDATE point_rewards
            SET stock_quantity = CASE WHEN is_limited = 1
                                      THEN stock_quantity - $1
                                      ELSE stock_quantity END
            WHERE id = $2
              AND (is_limited = 0 OR stock_quantity >= $1)
            ",
        )
        .bind(purchase.quantity)
        .bind(purchase.reward_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to decrement stock: {e}")))?;

        if stocked.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("Failed to roll back: {e}")))?;
            return Err(AppError::limit_exceeded("Reward is out of stock"));
        }

        let balance: i64 = sqlx::query("SELECT points FROM user_profiles WHERE user_id = $1")
            .bind(purchase.user_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to read balance: {e}")))?
            .get("points");

        sqlx::query(
            r"
            INSERT INTO point_purchases (id, user_id, reward_id, points_spent, quantity, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(purchase.id.to_string())
        .bind(purchase.user_id.to_string())
        .bind(purchase.reward_id.to_string())
        .bind(purchase.points_spent)
        .bind(purchase.quantity)
        .bind(purchase.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to record purchase: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO point_transactions
                (id, user_id, source_id, transaction_type, amount, balance_after,
                 description, reference_type, reference_id, created_at)
            VALUES ($1, $2, NULL, 'spent', $3, $4, $5, 'purchase', $6, $7)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(purchase.user_id.to_string())
        .bind(purchase.points_spent)
        .bind(balance)
        .bind(format!("Purchased reward x{}", purchase.quantity))
        .bind(purchase.id.to_string())
        .bind(purchase.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to record purchase ledger row: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit purchase: {e}")))?;

        Ok(())
    }

    // ========================================================================
    // Level rewards and milestones
    // ========================================================================

    /// Create a level-bracket reward
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn create_level_reward(&self, reward: &LevelReward) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO level_rewards (id, level, reward_type, reward_value, description)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(reward.id.to_string())
        .bind(reward.level)
        .bind(&reward.reward_type)
        .bind(&reward.reward_value)
        .bind(&reward.description)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create level reward: {e}")))?;

        Ok(reward.id)
    }

    /// Level rewards for levels in `(from_level, to_level]`, ascending
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn level_rewards_between(
        &self,
        from_level: i32,
        to_level: i32,
    ) -> AppResult<Vec<LevelReward>> {
        let rows = sqlx::query(
            r"
            SELECT id, level, reward_type, reward_value, description
            FROM level_rewards
            WHERE level > $1 AND level <= $2
            ORDER BY level
            ",
        )
        .bind(from_level)
        .bind(to_level)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list level rewards: {e}")))?;

        rows.iter().map(Self::row_to_level_reward).collect()
    }

    /// Mark a level reward as claimed. Idempotent per user and reward.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn claim_level_reward(&self, user_id: Uuid, reward_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT OR IGNORE INTO user_level_rewards (user_id, level_reward_id, claimed_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id.to_string())
        .bind(reward_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to claim level reward: {e}")))?;

        Ok(())
    }

    /// Create a level milestone
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn create_level_milestone(&self, milestone: &LevelMilestone) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT OR REPLACE INTO level_milestones (level, title, badge_emoji, description)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(milestone.level)
        .bind(&milestone.title)
        .bind(&milestone.badge_emoji)
        .bind(&milestone.description)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create milestone: {e}")))?;

        Ok(())
    }

    /// Milestones for levels in `(from_level, to_level]`, ascending
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn milestones_between(
        &self,
        from_level: i32,
        to_level: i32,
    ) -> AppResult<Vec<LevelMilestone>> {
        let rows = sqlx::query(
            r"
            SELECT level, title, badge_emoji, description
            FROM level_milestones
            WHERE level > $1 AND level <= $2
            ORDER BY level
            ",
        )
        .bind(from_level)
        .bind(to_level)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list milestones: {e}")))?;

        Ok(rows
            .iter()
            .map(|r| LevelMilestone {
                level: r.get("level"),
                title: r.get("title"),
                badge_emoji: r.get("badge_emoji"),
                description: r.get("description"),
            })
            .collect())
    }

    /// Create a point milestone
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn create_point_milestone(&self, milestone: &PointMilestone) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO point_milestones
                (id, points_threshold, title, badge_emoji, description, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(milestone.id.to_string())
        .bind(milestone.points_threshold)
        .bind(&milestone.title)
        .bind(&milestone.badge_emoji)
        .bind(&milestone.description)
        .bind(milestone.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create point milestone: {e}")))?;

        Ok(())
    }

    /// Active point milestones at or below `balance` the user has not yet
    /// achieved, lowest threshold first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn unachieved_point_milestones(
        &self,
        user_id: Uuid,
        balance: i64,
    ) -> AppResult<Vec<PointMilestone>> {
        let rows = sqlx::query(
            r"
            SELECT id, points_threshold, title, badge_emoji, description, is_active
            FROM point_milestones
            WHERE points_threshold <= $1
              AND is_active = 1
              AND id NOT IN (
                  SELECT milestone_id FROM user_point_milestones WHERE user_id = $2
              )
            ORDER BY points_threshold ASC
            ",
        )
        .bind(balance)
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list point milestones: {e}")))?;

        rows.iter()
            .map(|r| {
                let id: String = r.get("id");
                Ok(PointMilestone {
                    id: parse_uuid(&id)?,
                    points_threshold: r.get("points_threshold"),
                    title: r.get("title"),
                    badge_emoji: r.get("badge_emoji"),
                    description: r.get("description"),
                    is_active: r.get("is_active"),
                })
            })
            .collect()
    }

    /// Record that a user reached a point milestone
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn claim_point_milestone(&self, user_id: Uuid, milestone_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT OR IGNORE INTO user_point_milestones (user_id, milestone_id, achieved_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id.to_string())
        .bind(milestone_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to claim point milestone: {e}")))?;

        Ok(())
    }

    // ========================================================================
    // Seasonal boosts
    // ========================================================================

    /// Create a seasonal boost window
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn create_seasonal_boost(&self, boost: &SeasonalBoost) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO seasonal_boosts (id, name, multiplier, starts_at, ends_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(boost.id.to_string())
        .bind(&boost.name)
        .bind(boost.multiplier)
        .bind(boost.starts_at.to_rfc3339())
        .bind(boost.ends_at.to_rfc3339())
        .bind(boost.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create seasonal boost: {e}")))?;

        Ok(boost.id)
    }

    /// Highest multiplier among boosts active at `now`, or 1.0 when none
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn active_seasonal_multiplier(&self, now: DateTime<Utc>) -> AppResult<f64> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(MAX(multiplier), 1.0) AS m
            FROM seasonal_boosts
            WHERE is_active = 1 AND starts_at <= $1 AND ends_at > $1
            ",
        )
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get seasonal multiplier: {e}")))?;

        Ok(row.get("m"))
    }

    // ========================================================================
    // Row mappers
    // ========================================================================

    fn row_to_xp_source(row: &SqliteRow) -> AppResult<XpSource> {
        let id: String = row.get("id");
        Ok(XpSource {
            id: parse_uuid(&id)?,
            name: row.get("name"),
            multiplier: row.get("multiplier"),
            daily_limit: row.get("daily_limit"),
            is_active: row.get("is_active"),
        })
    }

    fn row_to_point_source(row: &SqliteRow) -> AppResult<PointSource> {
        let id: String = row.get("id");
        Ok(PointSource {
            id: parse_uuid(&id)?,
            name: row.get("name"),
            multiplier: row.get("multiplier"),
            daily_limit: row.get("daily_limit"),
            weekly_limit: row.get("weekly_limit"),
            is_active: row.get("is_active"),
        })
    }

    fn row_to_xp_log_entry(row: &SqliteRow) -> AppResult<XpLogEntry> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let source_id: String = row.get("source_id");
        let created_at: String = row.get("created_at");

        Ok(XpLogEntry {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            source_id: parse_uuid(&source_id)?,
            xp_gained: row.get("xp_gained"),
            description: row.get("description"),
            created_at: parse_ts(&created_at)?,
        })
    }

    fn row_to_point_transaction(row: &SqliteRow) -> AppResult<PointTransaction> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let source_id: Option<String> = row.get("source_id");
        let tx_type: String = row.get("transaction_type");
        let created_at: String = row.get("created_at");

        Ok(PointTransaction {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            source_id: source_id.as_deref().map(parse_uuid).transpose()?,
            transaction_type: tx_type
                .parse()
                .map_err(|e: AppError| AppError::database(e.to_string()))?,
            amount: row.get("amount"),
            balance_after: row.get("balance_after"),
            description: row.get("description"),
            reference_type: row.get("reference_type"),
            reference_id: row.get("reference_id"),
            created_at: parse_ts(&created_at)?,
        })
    }

    fn row_to_point_reward(row: &SqliteRow) -> AppResult<PointReward> {
        let id: String = row.get("id");
        Ok(PointReward {
            id: parse_uuid(&id)?,
            name: row.get("name"),
            description: row.get("description"),
            cost_points: row.get("cost_points"),
            required_level: row.get("required_level"),
            purchase_limit_per_user: row.get("purchase_limit_per_user"),
            is_limited: row.get("is_limited"),
            stock_quantity: row.get("stock_quantity"),
            is_available: row.get("is_available"),
        })
    }

    fn row_to_level_reward(row: &SqliteRow) -> AppResult<LevelReward> {
        let id: String = row.get("id");
        Ok(LevelReward {
            id: parse_uuid(&id)?,
            level: row.get("level"),
            reward_type: row.get("reward_type"),
            reward_value: row.get("reward_value"),
            description: row.get("description"),
        })
    }
}
