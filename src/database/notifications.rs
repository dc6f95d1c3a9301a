// ABOUTME: In-app notification database operations
// ABOUTME: Simple per-user inbox with read tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::Notification;

impl Database {
    pub(super) async fn migrate_notifications(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create notifications table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notifications_user_read
             ON notifications(user_id, is_read, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;

        Ok(())
    }

    /// Insert a notification
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn insert_notification(&self, notification: &Notification) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO notifications (id, user_id, kind, title, body, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(notification.id.to_string())
        .bind(notification.user_id.to_string())
        .bind(&notification.kind)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.is_read)
        .bind(notification.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert notification: {e}")))?;

        Ok(notification.id)
    }

    /// List a user's notifications, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Notification>> {
        let sql = if unread_only {
            r"
            SELECT id, user_id, kind, title, body, is_read, created_at
            FROM notifications
            WHERE user_id = $1 AND is_read = 0
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "
        } else {
            r"
            SELECT id, user_id, kind, title, body, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "
        };

        let rows = sqlx::query(sql)
            .bind(user_id.to_string())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list notifications: {e}")))?;

        rows.iter().map(Self::row_to_notification).collect()
    }

    /// Number of unread notifications for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn unread_notification_count(&self, user_id: Uuid) -> AppResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM notifications WHERE user_id = $1 AND is_read = 0",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count notifications: {e}")))?;

        Ok(row.get("n"))
    }

    /// Mark one notification as read. Returns whether a row was updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE id = $1 AND user_id = $2",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark notification read: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark all of a user's notifications as read. Returns the count updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn mark_all_notifications_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE user_id = $1 AND is_read = 0",
        )
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark notifications read: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Delete a notification owned by a user. Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn delete_notification(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete notification: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_notification(row: &SqliteRow) -> AppResult<Notification> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let created_at: String = row.get("created_at");

        Ok(Notification {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            kind: row.get("kind"),
            title: row.get("title"),
            body: row.get("body"),
            is_read: row.get("is_read"),
            created_at: parse_ts(&created_at)?,
        })
    }
}
