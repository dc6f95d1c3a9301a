// ABOUTME: Direct messaging database operations: conversations and messages
// ABOUTME: Conversations are unique per user pair, ordered by most recent message
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_opt_ts, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Conversation, Message};

impl Database {
    pub(super) async fn migrate_messaging(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_a TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                user_b TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                last_message_at TEXT,
                UNIQUE (user_a, user_b)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversations table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                sender_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation_time
             ON messages(conversation_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;

        Ok(())
    }

    /// Get the conversation between two users, creating it if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_or_create_conversation(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<Conversation> {
        let row = sqlx::query(
            r"
            SELECT id, user_a, user_b, created_at, last_message_at
            FROM conversations
            WHERE (user_a = $1 AND user_b = $2) OR (user_a = $2 AND user_b = $1)
            ",
        )
        .bind(user_a.to_string())
        .bind(user_b.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        if let Some(r) = row {
            return Self::row_to_conversation(&r);
        }

        let conversation = Conversation::new(user_a, user_b);
        sqlx::query(
            r"
            INSERT INTO conversations (id, user_a, user_b, created_at, last_message_at)
            VALUES ($1, $2, $3, $4, NULL)
            ",
        )
        .bind(conversation.id.to_string())
        .bind(conversation.user_a.to_string())
        .bind(conversation.user_b.to_string())
        .bind(conversation.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        Ok(conversation)
    }

    /// Get a conversation by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_conversation(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT id, user_a, user_b, created_at, last_message_at FROM conversations WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        row.map(|r| Self::row_to_conversation(&r)).transpose()
    }

    /// All conversations a user participates in, most recently active first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_conversations(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_a, user_b, created_at, last_message_at
            FROM conversations
            WHERE user_a = $1 OR user_b = $1
            ORDER BY COALESCE(last_message_at, created_at) DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        rows.iter().map(Self::row_to_conversation).collect()
    }

    /// Append a message and bump the conversation's activity timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn insert_message(&self, message: &Message) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, sender_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.sender_id.to_string())
        .bind(&message.body)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert message: {e}")))?;

        sqlx::query("UPDATE conversations SET last_message_at = $1 WHERE id = $2")
            .bind(message.created_at.to_rfc3339())
            .bind(message.conversation_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update conversation: {e}")))?;

        Ok(message.id)
    }

    /// List a conversation's messages, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Message>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, sender_id, body, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(conversation_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list messages: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    fn row_to_conversation(row: &SqliteRow) -> AppResult<Conversation> {
        let id: String = row.get("id");
        let user_a: String = row.get("user_a");
        let user_b: String = row.get("user_b");
        let created_at: String = row.get("created_at");
        let last_message_at: Option<String> = row.get("last_message_at");

        Ok(Conversation {
            id: parse_uuid(&id)?,
            user_a: parse_uuid(&user_a)?,
            user_b: parse_uuid(&user_b)?,
            created_at: parse_ts(&created_at)?,
            last_message_at: parse_opt_ts(last_message_at)?,
        })
    }

    fn row_to_message(row: &SqliteRow) -> AppResult<Message> {
        let id: String = row.get("id");
        let conversation_id: String = row.get("conversation_id");
        let sender_id: String = row.get("sender_id");
        let created_at: String = row.get("created_at");

        Ok(Message {
            id: parse_uuid(&id)?,
            conversation_id: parse_uuid(&conversation_id)?,
            sender_id: parse_uuid(&sender_id)?,
            body: row.get("body"),
            created_at: parse_ts(&created_at)?,
        })
    }
}
