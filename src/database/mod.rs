// ABOUTME: SQLite access layer: connection pool, schema migrations, row mapping helpers
// ABOUTME: One submodule per domain area, all operating on the shared pool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

//! # Database Management
//!
//! Single `SQLite` database behind a shared `sqlx` pool. All domain state
//! lives here: accounts, hydration logs, gamification ledgers, social graph,
//! messaging, and notifications. Schema is created by idempotent migrations
//! at startup.

mod gamification;
mod hydration;
mod leaderboard;
mod messaging;
mod notifications;
mod social;
mod users;

pub use hydration::{BrandStats, ConsumptionSummary};
pub use leaderboard::LeaderboardRow;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Database manager for all persistent state
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or any migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains("memory")
            && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any table or index creation fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_hydration().await?;
        self.migrate_gamification().await?;
        self.migrate_social().await?;
        self.migrate_messaging().await?;
        self.migrate_notifications().await?;

        Ok(())
    }
}

// Row mapping helpers shared by the submodules. All UUIDs and timestamps are
// stored as TEXT (RFC 3339 for timestamps), so range filters compare
// lexicographically.

pub(crate) fn parse_uuid(s: &str) -> AppResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::database(format!("Invalid UUID: {e}")))
}

pub(crate) fn parse_ts(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid timestamp: {e}")))
}

pub(crate) fn parse_opt_ts(s: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_ts).transpose()
}

pub(crate) fn parse_date(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| AppError::database(format!("Invalid date: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_database_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aqualog-test.db");
        let url = format!("sqlite:{}", path.display());

        let database = Database::new(&url).await.expect("database");
        assert!(path.exists());

        // Migrations are idempotent
        database.migrate().await.expect("re-migrate");
    }

    #[tokio::test]
    async fn in_memory_database_migrates() {
        let database = Database::new("sqlite::memory:").await.expect("database");
        assert_eq!(database.count_users().await.expect("count"), 0);
    }
}
