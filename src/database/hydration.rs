// ABOUTME: Hydration log database operations and daily goal rollups
// ABOUTME: Append-heavy log table plus the per-day aggregate queries that feed analytics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_date, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{DailyGoal, HydrationLog};

/// Per-user consumption summary over a time range
#[derive(Debug, Clone)]
pub struct ConsumptionSummary {
    pub total_volume_ml: f64,
    pub log_count: i64,
    pub active_days: i64,
    /// Timestamp of the earliest log, if any
    pub first_logged_at: Option<DateTime<Utc>>,
}

/// Per-brand aggregate for one user
#[derive(Debug, Clone)]
pub struct BrandStats {
    pub brand: String,
    pub total_volume_ml: f64,
    pub log_count: i64,
    pub first_logged_at: DateTime<Utc>,
    pub last_logged_at: DateTime<Utc>,
}

impl Database {
    pub(super) async fn migrate_hydration(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS hydration_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                volume_ml REAL NOT NULL,
                brand TEXT,
                logged_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create hydration_logs table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS daily_goals (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                total_volume_ml REAL NOT NULL DEFAULT 0,
                goal_met INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, date)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create daily_goals table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_hydration_logs_user_time
             ON hydration_logs(user_id, logged_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_hydration_logs_time ON hydration_logs(logged_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;

        Ok(())
    }

    /// Insert a hydration log entry
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn insert_hydration_log(&self, log: &HydrationLog) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO hydration_logs (id, user_id, volume_ml, brand, logged_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(log.id.to_string())
        .bind(log.user_id.to_string())
        .bind(log.volume_ml)
        .bind(&log.brand)
        .bind(log.logged_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert hydration log: {e}")))?;

        Ok(log.id)
    }

    /// Get a hydration log by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_hydration_log(&self, id: Uuid) -> AppResult<Option<HydrationLog>> {
        let row = sqlx::query(
            "SELECT id, user_id, volume_ml, brand, logged_at FROM hydration_logs WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get hydration log: {e}")))?;

        row.map(|r| Self::row_to_hydration_log(&r)).transpose()
    }

    /// List a user's hydration logs, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_hydration_logs(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<HydrationLog>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, volume_ml, brand, logged_at
            FROM hydration_logs
            WHERE user_id = $1
            ORDER BY logged_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list hydration logs: {e}")))?;

        rows.iter().map(Self::row_to_hydration_log).collect()
    }

    /// Update a log's volume and brand
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn update_hydration_log(
        &self,
        id: Uuid,
        volume_ml: f64,
        brand: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE hydration_logs SET volume_ml = $1, brand = $2 WHERE id = $3")
            .bind(volume_ml)
            .bind(brand)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update hydration log: {e}")))?;

        Ok(())
    }

    /// Delete a hydration log
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn delete_hydration_log(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM hydration_logs WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete hydration log: {e}")))?;

        Ok(())
    }

    /// Per-day volume totals for a user within `[start, end)`.
    ///
    /// Days with no logs are absent from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn daily_totals(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<(NaiveDate, f64)>> {
        let rows = sqlx::query(
            r"
            SELECT date(logged_at) AS day, SUM(volume_ml) AS total
            FROM hydration_logs
            WHERE user_id = $1 AND logged_at >= $2 AND logged_at < $3
            GROUP BY date(logged_at)
            ORDER BY day
            ",
        )
        .bind(user_id.to_string())
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute daily totals: {e}")))?;

        rows.iter()
            .map(|r| {
                let day: String = r.get("day");
                Ok((parse_date(&day)?, r.get::<f64, _>("total")))
            })
            .collect()
    }

    /// Volume, log count, and distinct active days for a user within `[start, end)`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn consumption_summary(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<ConsumptionSummary> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(volume_ml), 0) AS total,
                   COUNT(*) AS n,
                   COUNT(DISTINCT date(logged_at)) AS days,
                   MIN(logged_at) AS first_logged_at
            FROM hydration_logs
            WHERE user_id = $1 AND logged_at >= $2 AND logged_at < $3
            ",
        )
        .bind(user_id.to_string())
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute consumption summary: {e}")))?;

        let first_logged_at: Option<String> = row.get("first_logged_at");

        Ok(ConsumptionSummary {
            total_volume_ml: row.get("total"),
            log_count: row.get("n"),
            active_days: row.get("days"),
            first_logged_at: super::parse_opt_ts(first_logged_at)?,
        })
    }

    /// Per-brand volume totals for a user, largest volume first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn brand_breakdown(&self, user_id: Uuid) -> AppResult<Vec<BrandStats>> {
        let rows = sqlx::query(
            r"
            SELECT COALESCE(brand, 'Unknown') AS brand,
                   SUM(volume_ml) AS total,
                   COUNT(*) AS n,
                   MIN(logged_at) AS first_logged_at,
                   MAX(logged_at) AS last_logged_at
            FROM hydration_logs
            WHERE user_id = $1
            GROUP BY COALESCE(brand, 'Unknown')
            ORDER BY total DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute brand breakdown: {e}")))?;

        rows.iter()
            .map(|r| {
                let first: String = r.get("first_logged_at");
                let last: String = r.get("last_logged_at");
                Ok(BrandStats {
                    brand: r.get("brand"),
                    total_volume_ml: r.get("total"),
                    log_count: r.get("n"),
                    first_logged_at: parse_ts(&first)?,
                    last_logged_at: parse_ts(&last)?,
                })
            })
            .collect()
    }

    /// Platform-wide volume, log count, and distinct logged days
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn global_consumption_totals(&self) -> AppResult<(f64, i64, i64)> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(volume_ml), 0) AS total,
                   COUNT(*) AS n,
                   COUNT(DISTINCT date(logged_at)) AS days
            FROM hydration_logs
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute global totals: {e}")))?;

        Ok((row.get("total"), row.get("n"), row.get("days")))
    }

    /// Brand with the highest platform-wide volume, if any logs carry a brand
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn most_popular_brand(&self) -> AppResult<Option<String>> {
        let row = sqlx::query(
            r"
            SELECT brand, SUM(volume_ml) AS total
            FROM hydration_logs
            WHERE brand IS NOT NULL
            GROUP BY brand
            ORDER BY total DESC
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find most popular brand: {e}")))?;

        Ok(row.map(|r| r.get("brand")))
    }

    /// Platform-wide volume logged within `[start, end)`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn global_volume_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<f64> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(volume_ml), 0) AS total
            FROM hydration_logs
            WHERE logged_at >= $1 AND logged_at < $2
            ",
        )
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute windowed volume: {e}")))?;

        Ok(row.get("total"))
    }

    /// Number of distinct users who logged anything within `[start, end)`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn active_users_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<i64> {
        let row = sqlx::query(
            r"
            SELECT COUNT(DISTINCT user_id) AS n
            FROM hydration_logs
            WHERE logged_at >= $1 AND logged_at < $2
            ",
        )
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count active users: {e}")))?;

        Ok(row.get("n"))
    }

    /// Upsert the per-day rollup row for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn upsert_daily_goal(&self, goal: &DailyGoal) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO daily_goals (user_id, date, total_volume_ml, goal_met)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, date)
            DO UPDATE SET total_volume_ml = excluded.total_volume_ml,
                          goal_met = excluded.goal_met
            ",
        )
        .bind(goal.user_id.to_string())
        .bind(goal.date.format("%Y-%m-%d").to_string())
        .bind(goal.total_volume_ml)
        .bind(goal.goal_met)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert daily goal: {e}")))?;

        Ok(())
    }

    /// Get the rollup row for a single day
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_daily_goal(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<DailyGoal>> {
        let row = sqlx::query(
            r"
            SELECT user_id, date, total_volume_ml, goal_met
            FROM daily_goals
            WHERE user_id = $1 AND date = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get daily goal: {e}")))?;

        row.map(|r| Self::row_to_daily_goal(&r)).transpose()
    }

    /// Dates with the goal met within `[start, end]`, ascending
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn goal_met_dates(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<NaiveDate>> {
        let rows = sqlx::query(
            r"
            SELECT date
            FROM daily_goals
            WHERE user_id = $1 AND goal_met = 1 AND date >= $2 AND date <= $3
            ORDER BY date
            ",
        )
        .bind(user_id.to_string())
        .bind(start.format("%Y-%m-%d").to_string())
        .bind(end.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list goal dates: {e}")))?;

        rows.iter()
            .map(|r| {
                let date: String = r.get("date");
                parse_date(&date)
            })
            .collect()
    }

    fn row_to_hydration_log(row: &SqliteRow) -> AppResult<HydrationLog> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let logged_at: String = row.get("logged_at");

        Ok(HydrationLog {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            volume_ml: row.get("volume_ml"),
            brand: row.get("brand"),
            logged_at: parse_ts(&logged_at)?,
        })
    }

    fn row_to_daily_goal(row: &SqliteRow) -> AppResult<DailyGoal> {
        let user_id: String = row.get("user_id");
        let date: String = row.get("date");

        Ok(DailyGoal {
            user_id: parse_uuid(&user_id)?,
            date: parse_date(&date)?,
            total_volume_ml: row.get("total_volume_ml"),
            goal_met: row.get("goal_met"),
        })
    }
}
