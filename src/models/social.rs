// ABOUTME: Social domain models: friend connections, activity feed, messaging, notifications
// ABOUTME: Status enums carry as_str/parse pairs for TEXT column storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::AppError;

/// Status of a friend connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Pending,
    Accepted,
    Declined,
}

impl FriendStatus {
    /// String form stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl std::str::FromStr for FriendStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(AppError::invalid_input(format!(
                "Unknown friend status: {other}"
            ))),
        }
    }
}

impl fmt::Display for FriendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A friend connection between two users, created as a pending request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendConnection {
    /// Unique identifier
    pub id: Uuid,
    /// User who sent the request
    pub initiator_id: Uuid,
    /// User who received the request
    pub receiver_id: Uuid,
    /// Current status
    pub status: FriendStatus,
    /// When the request was created
    pub created_at: DateTime<Utc>,
    /// When the connection was last updated
    pub updated_at: DateTime<Utc>,
    /// When the request was accepted (if accepted)
    pub accepted_at: Option<DateTime<Utc>>,
}

impl FriendConnection {
    /// Create a new pending friend request
    #[must_use]
    pub fn new(initiator_id: Uuid, receiver_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            initiator_id,
            receiver_id,
            status: FriendStatus::Pending,
            created_at: now,
            updated_at: now,
            accepted_at: None,
        }
    }

    /// The other participant of the connection, from `user_id`'s perspective
    #[must_use]
    pub fn other_user(&self, user_id: Uuid) -> Uuid {
        if self.initiator_id == user_id {
            self.receiver_id
        } else {
            self.initiator_id
        }
    }
}

/// Kind of activity feed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedEventKind {
    DrinkLogged,
    DailyGoalMet,
    LevelUp,
    PrestigeReset,
    FriendAccepted,
    MilestoneReached,
}

impl FeedEventKind {
    /// String form stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DrinkLogged => "drink_logged",
            Self::DailyGoalMet => "daily_goal_met",
            Self::LevelUp => "level_up",
            Self::PrestigeReset => "prestige_reset",
            Self::FriendAccepted => "friend_accepted",
            Self::MilestoneReached => "milestone_reached",
        }
    }
}

impl std::str::FromStr for FeedEventKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drink_logged" => Ok(Self::DrinkLogged),
            "daily_goal_met" => Ok(Self::DailyGoalMet),
            "level_up" => Ok(Self::LevelUp),
            "prestige_reset" => Ok(Self::PrestigeReset),
            "friend_accepted" => Ok(Self::FriendAccepted),
            "milestone_reached" => Ok(Self::MilestoneReached),
            other => Err(AppError::invalid_input(format!(
                "Unknown feed event kind: {other}"
            ))),
        }
    }
}

/// One entry in the activity feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEvent {
    /// Unique identifier
    pub id: Uuid,
    /// User the event belongs to
    pub user_id: Uuid,
    /// Event kind
    pub kind: FeedEventKind,
    /// Kind-specific payload
    pub payload: serde_json::Value,
    /// When the event occurred
    pub created_at: DateTime<Utc>,
}

impl FeedEvent {
    /// Create a new feed event timestamped now
    #[must_use]
    pub fn new(user_id: Uuid, kind: FeedEventKind, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            payload,
            created_at: Utc::now(),
        }
    }
}

/// A direct-message conversation between two users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier
    pub id: Uuid,
    /// First participant (ordering is creation order, not significant)
    pub user_a: Uuid,
    /// Second participant
    pub user_b: Uuid,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent message
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Create a new conversation between two users
    #[must_use]
    pub fn new(user_a: Uuid, user_b: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_a,
            user_b,
            created_at: Utc::now(),
            last_message_at: None,
        }
    }

    /// Whether `user_id` participates in this conversation
    #[must_use]
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }
}

/// A direct message within a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: Uuid,
    /// Parent conversation
    pub conversation_id: Uuid,
    /// Author
    pub sender_id: Uuid,
    /// Message body
    pub body: String,
    /// When the message was sent
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message timestamped now
    #[must_use]
    pub fn new(conversation_id: Uuid, sender_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            body,
            created_at: Utc::now(),
        }
    }
}

/// An in-app notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: Uuid,
    /// Recipient
    pub user_id: Uuid,
    /// Notification kind, e.g. `friend_request`, `new_message`
    pub kind: String,
    /// Short title
    pub title: String,
    /// Body text
    pub body: String,
    /// Whether the recipient has read it
    pub is_read: bool,
    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new unread notification timestamped now
    #[must_use]
    pub fn new(user_id: Uuid, kind: &str, title: String, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind: kind.to_owned(),
            title,
            body,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
