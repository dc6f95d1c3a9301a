// ABOUTME: Social graph database operations: friend connections and the activity feed
// ABOUTME: Connections are directional rows queried in both directions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_opt_ts, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{FeedEvent, FriendConnection, FriendStatus};

impl Database {
    pub(super) async fn migrate_social(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS friend_connections (
                id TEXT PRIMARY KEY,
                initiator_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                receiver_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                accepted_at TEXT,
                UNIQUE (initiator_id, receiver_id)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to create friend_connections table: {e}"))
        })?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS feed_events (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create feed_events table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_friend_connections_receiver
             ON friend_connections(receiver_id, status)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_feed_events_user_time
             ON feed_events(user_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;

        Ok(())
    }

    // ========================================================================
    // Friend connections
    // ========================================================================

    /// Create a new friend connection request
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn create_friend_connection(&self, connection: &FriendConnection) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO friend_connections
                (id, initiator_id, receiver_id, status, created_at, updated_at, accepted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(connection.id.to_string())
        .bind(connection.initiator_id.to_string())
        .bind(connection.receiver_id.to_string())
        .bind(connection.status.as_str())
        .bind(connection.created_at.to_rfc3339())
        .bind(connection.updated_at.to_rfc3339())
        .bind(connection.accepted_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create friend connection: {e}")))?;

        Ok(connection.id)
    }

    /// Get a friend connection by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_friend_connection(&self, id: Uuid) -> AppResult<Option<FriendConnection>> {
        let row = sqlx::query(
            r"
            SELECT id, initiator_id, receiver_id, status, created_at, updated_at, accepted_at
            FROM friend_connections
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get friend connection: {e}")))?;

        row.map(|r| Self::row_to_friend_connection(&r)).transpose()
    }

    /// Get the connection between two users, in either direction
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_friend_connection_between(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<Option<FriendConnection>> {
        let row = sqlx::query(
            r"
            SELECT id, initiator_id, receiver_id, status, created_at, updated_at, accepted_at
            FROM friend_connections
            WHERE (initiator_id = $1 AND receiver_id = $2)
               OR (initiator_id = $2 AND receiver_id = $1)
            ",
        )
        .bind(user_a.to_string())
        .bind(user_b.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get friend connection: {e}")))?;

        row.map(|r| Self::row_to_friend_connection(&r)).transpose()
    }

    /// Update a connection's status, stamping `accepted_at` on acceptance
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn update_friend_connection_status(
        &self,
        id: Uuid,
        status: FriendStatus,
    ) -> AppResult<()> {
        let now = Utc::now();
        let accepted_at = if status == FriendStatus::Accepted {
            Some(now.to_rfc3339())
        } else {
            None
        };

        sqlx::query(
            r"
            UPDATE friend_connections
            SET status = $1, updated_at = $2, accepted_at = $3
            WHERE id = $4
            ",
        )
        .bind(status.as_str())
        .bind(now.to_rfc3339())
        .bind(accepted_at)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update friend connection: {e}")))?;

        Ok(())
    }

    /// Remove a connection entirely (unfriend or cancel request)
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn delete_friend_connection(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM friend_connections WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete friend connection: {e}")))?;

        Ok(())
    }

    /// All accepted connections for a user, most recently accepted first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_friends(&self, user_id: Uuid) -> AppResult<Vec<FriendConnection>> {
        let rows = sqlx::query(
            r"
            SELECT id, initiator_id, receiver_id, status, created_at, updated_at, accepted_at
            FROM friend_connections
            WHERE (initiator_id = $1 OR receiver_id = $1)
              AND status = 'accepted'
            ORDER BY accepted_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list friends: {e}")))?;

        rows.iter().map(Self::row_to_friend_connection).collect()
    }

    /// Pending requests where the user is the receiver, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_pending_requests(&self, user_id: Uuid) -> AppResult<Vec<FriendConnection>> {
        let rows = sqlx::query(
            r"
            SELECT id, initiator_id, receiver_id, status, created_at, updated_at, accepted_at
            FROM friend_connections
            WHERE receiver_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list pending requests: {e}")))?;

        rows.iter().map(Self::row_to_friend_connection).collect()
    }

    /// IDs of all accepted friends of a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn friend_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let friends = self.list_friends(user_id).await?;
        Ok(friends.iter().map(|c| c.other_user(user_id)).collect())
    }

    // ========================================================================
    // Activity feed
    // ========================================================================

    /// Append an activity feed event
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database query fails
    pub async fn insert_feed_event(&self, event: &FeedEvent) -> AppResult<Uuid> {
        let payload = serde_json::to_string(&event.payload)?;

        sqlx::query(
            r"
            INSERT INTO feed_events (id, user_id, kind, payload, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(event.id.to_string())
        .bind(event.user_id.to_string())
        .bind(event.kind.as_str())
        .bind(payload)
        .bind(event.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert feed event: {e}")))?;

        Ok(event.id)
    }

    /// Recent feed events for a set of users, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn feed_for_users(
        &self,
        user_ids: &[Uuid],
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<FeedEvent>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=user_ids.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r"
            SELECT id, user_id, kind, payload, created_at
            FROM feed_events
            WHERE user_id IN ({placeholders})
            ORDER BY created_at DESC
            LIMIT ${} OFFSET ${}
            ",
            user_ids.len() + 1,
            user_ids.len() + 2,
        );

        let mut query = sqlx::query(&sql);
        for id in user_ids {
            query = query.bind(id.to_string());
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load feed: {e}")))?;

        rows.iter().map(Self::row_to_feed_event).collect()
    }

    // ========================================================================
    // Row mappers
    // ========================================================================

    fn row_to_friend_connection(row: &SqliteRow) -> AppResult<FriendConnection> {
        let id: String = row.get("id");
        let initiator_id: String = row.get("initiator_id");
        let receiver_id: String = row.get("receiver_id");
        let status: String = row.get("status");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");
        let accepted_at: Option<String> = row.get("accepted_at");

        Ok(FriendConnection {
            id: parse_uuid(&id)?,
            initiator_id: parse_uuid(&initiator_id)?,
            receiver_id: parse_uuid(&receiver_id)?,
            status: status
                .parse()
                .map_err(|e: AppError| AppError::database(e.to_string()))?,
            created_at: parse_ts(&created_at)?,
            updated_at: parse_ts(&updated_at)?,
            accepted_at: parse_opt_ts(accepted_at)?,
        })
    }

    fn row_to_feed_event(row: &SqliteRow) -> AppResult<FeedEvent> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let kind: String = row.get("kind");
        let payload: String = row.get("payload");
        let created_at: String = row.get("created_at");

        Ok(FeedEvent {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            kind: kind
                .parse()
                .map_err(|e: AppError| AppError::database(e.to_string()))?,
            payload: serde_json::from_str(&payload)?,
            created_at: parse_ts(&created_at)?,
        })
    }
}
