// ABOUTME: User account and profile database operations
// ABOUTME: Registration, lookup by email/username, and profile stat mutations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserProfile};

impl Database {
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create users table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                points INTEGER NOT NULL DEFAULT 0,
                current_xp INTEGER NOT NULL DEFAULT 0,
                total_xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                current_streak INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                daily_goal_ml REAL NOT NULL DEFAULT 2000.0,
                prestige_level INTEGER NOT NULL DEFAULT 0,
                prestige_points INTEGER NOT NULL DEFAULT 0,
                last_prestige_at TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user_profiles table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;

        Ok(())
    }

    /// Create a user account together with its default profile
    ///
    /// # Errors
    ///
    /// Returns an error if the email or username is already taken, or the
    /// database query fails
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(AppError::new(
                crate::errors::ErrorCode::ResourceAlreadyExists,
                "Email already in use",
            ));
        }
        if self.get_user_by_username(&user.username).await?.is_some() {
            return Err(AppError::new(
                crate::errors::ErrorCode::ResourceAlreadyExists,
                "Username already taken",
            ));
        }

        sqlx::query(
            r"
            INSERT INTO users (id, email, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user: {e}")))?;

        let profile = UserProfile::new(user.id);
        sqlx::query(
            r"
            INSERT INTO user_profiles (user_id, points, current_xp, total_xp, level,
                                       current_streak, longest_streak, daily_goal_ml,
                                       prestige_level, prestige_points, last_prestige_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(profile.user_id.to_string())
        .bind(profile.points)
        .bind(profile.current_xp)
        .bind(profile.total_xp)
        .bind(profile.level)
        .bind(profile.current_streak)
        .bind(profile.longest_streak)
        .bind(profile.daily_goal_ml)
        .bind(profile.prestige_level)
        .bind(profile.prestige_points)
        .bind(Option::<String>::None)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user profile: {e}")))?;

        Ok(user.id)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Get a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user by email: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Get a user by username
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user by username: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Search users by username prefix, excluding the searching user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn search_users(
        &self,
        query: &str,
        exclude: Uuid,
        limit: i64,
    ) -> AppResult<Vec<User>> {
        let pattern = format!("{}%", query.replace(['%', '_'], ""));
        let rows = sqlx::query(
            r"
            SELECT id, email, username, password_hash, created_at
            FROM users
            WHERE username LIKE $1 AND id != $2
            ORDER BY username
            LIMIT $3
            ",
        )
        .bind(pattern)
        .bind(exclude.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to search users: {e}")))?;

        rows.iter().map(Self::row_to_user).collect()
    }

    /// Get a user's gamification profile
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is missing or the database query fails
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        let row = sqlx::query(
            r"
            SELECT user_id, points, current_xp, total_xp, level, current_streak,
                   longest_streak, daily_goal_ml, prestige_level, prestige_points,
                   last_prestige_at
            FROM user_profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;

        row.map_or_else(
            || Err(AppError::not_found("User profile")),
            |r| Self::row_to_profile(&r),
        )
    }

    /// Persist all mutable profile fields
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn update_profile(&self, profile: &UserProfile) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE user_profiles
            SET points = $1, current_xp = $2, total_xp = $3, level = $4,
                current_streak = $5, longest_streak = $6, daily_goal_ml = $7,
                prestige_level = $8, prestige_points = $9, last_prestige_at = $10
            WHERE user_id = $11
            ",
        )
        .bind(profile.points)
        .bind(profile.current_xp)
        .bind(profile.total_xp)
        .bind(profile.level)
        .bind(profile.current_streak)
        .bind(profile.longest_streak)
        .bind(profile.daily_goal_ml)
        .bind(profile.prestige_level)
        .bind(profile.prestige_points)
        .bind(profile.last_prestige_at.map(|dt| dt.to_rfc3339()))
        .bind(profile.user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;

        Ok(())
    }

    /// Total number of registered users
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_users(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count users: {e}")))?;

        Ok(row.get("n"))
    }

    fn row_to_user(row: &SqliteRow) -> AppResult<User> {
        let id: String = row.get("id");
        let created_at: String = row.get("created_at");

        Ok(User {
            id: parse_uuid(&id)?,
            email: row.get("email"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            created_at: parse_ts(&created_at)?,
        })
    }

    pub(super) fn row_to_profile(row: &SqliteRow) -> AppResult<UserProfile> {
        let user_id: String = row.get("user_id");
        let last_prestige_at: Option<String> = row.get("last_prestige_at");

        Ok(UserProfile {
            user_id: parse_uuid(&user_id)?,
            points: row.get("points"),
            current_xp: row.get("current_xp"),
            total_xp: row.get("total_xp"),
            level: row.get("level"),
            current_streak: row.get("current_streak"),
            longest_streak: row.get("longest_streak"),
            daily_goal_ml: row.get("daily_goal_ml"),
            prestige_level: row.get("prestige_level"),
            prestige_points: row.get("prestige_points"),
            last_prestige_at: super::parse_opt_ts(last_prestige_at)?,
        })
    }
}
