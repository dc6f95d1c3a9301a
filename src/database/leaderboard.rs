// ABOUTME: Ranking queries backing the leaderboards, one query per metric family
// ABOUTME: Full orderings are returned so callers can derive ranks beyond the page
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_uuid, Database};
use crate::errors::{AppError, AppResult};

/// One entry of a metric ordering, best first
#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub username: String,
    pub value: f64,
}

impl Database {
    /// Users ordered by total volume logged within `[start, end)`.
    ///
    /// Users with no logs in the window are absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn rank_by_consumption(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<LeaderboardRow>> {
        let rows = sqlx::query(
            r"
            SELECT u.id AS user_id, u.username AS username, SUM(l.volume_ml) AS value
            FROM hydration_logs l
            JOIN users u ON u.id = l.user_id
            WHERE l.logged_at >= $1 AND l.logged_at < $2
            GROUP BY u.id, u.username
            ORDER BY value DESC
            ",
        )
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to rank by consumption: {e}")))?;

        rows.iter().map(Self::row_to_leaderboard_row).collect()
    }

    /// Users ordered by current goal streak
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn rank_by_streak(&self) -> AppResult<Vec<LeaderboardRow>> {
        self.rank_by_profile_column("current_streak").await
    }

    /// Users ordered by points balance
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn rank_by_points(&self) -> AppResult<Vec<LeaderboardRow>> {
        self.rank_by_profile_column("points").await
    }

    /// Users ordered by lifetime XP
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn rank_by_xp(&self) -> AppResult<Vec<LeaderboardRow>> {
        self.rank_by_profile_column("total_xp").await
    }

    async fn rank_by_profile_column(&self, column: &'static str) -> AppResult<Vec<LeaderboardRow>> {
        // Column name is a compile-time constant, never user input
        let sql = format!(
            r"
            SELECT u.id AS user_id, u.username AS username, CAST(p.{column} AS REAL) AS value
            FROM user_profiles p
            JOIN users u ON u.id = p.user_id
            ORDER BY value DESC
            "
        );

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to rank by {column}: {e}")))?;

        rows.iter().map(Self::row_to_leaderboard_row).collect()
    }

    /// Users ordered by distinct days with at least one log within `[start, end)`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn rank_by_active_days(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<LeaderboardRow>> {
        let rows = sqlx::query(
            r"
            SELECT u.id AS user_id, u.username AS username,
                   CAST(COUNT(DISTINCT date(l.logged_at)) AS REAL) AS value
            FROM hydration_logs l
            JOIN users u ON u.id = l.user_id
            WHERE l.logged_at >= $1 AND l.logged_at < $2
            GROUP BY u.id, u.username
            ORDER BY value DESC
            ",
        )
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to rank by active days: {e}")))?;

        rows.iter().map(Self::row_to_leaderboard_row).collect()
    }

    /// Users ordered by days with the goal met within `[start, end]` (dates inclusive)
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn rank_by_goal_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<LeaderboardRow>> {
        let rows = sqlx::query(
            r"
            SELECT u.id AS user_id, u.username AS username, CAST(COUNT(*) AS REAL) AS value
            FROM daily_goals g
            JOIN users u ON u.id = g.user_id
            WHERE g.goal_met = 1 AND g.date >= $1 AND g.date <= $2
            GROUP BY u.id, u.username
            ORDER BY value DESC
            ",
        )
        .bind(start.format("%Y-%m-%d").to_string())
        .bind(end.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to rank by goal days: {e}")))?;

        rows.iter().map(Self::row_to_leaderboard_row).collect()
    }

    fn row_to_leaderboard_row(row: &SqliteRow) -> AppResult<LeaderboardRow> {
        let user_id: String = row.get("user_id");
        Ok(LeaderboardRow {
            user_id: parse_uuid(&user_id)?,
            username: row.get("username"),
            value: row.get("value"),
        })
    }
}
