// ABOUTME: Main library entry point for the Aqualog hydration tracking backend
// ABOUTME: REST API for consumption logging, analytics, gamification, and social features
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

#![deny(unsafe_code)]

//! # Aqualog Server
//!
//! Backend for a consumer hydration-tracking and social-engagement
//! application: consumption logging, time-bucketed analytics, multi-criteria
//! leaderboards, XP/level and points gamification, friends, messaging, and
//! notifications.
//!
//! ## Architecture
//!
//! - **Routes**: axum HTTP handlers, one module per API surface
//! - **Database**: `SQLite` access layer over a shared `sqlx` pool
//! - **Analytics**: calendar-bucketed aggregation (heatmaps, time series)
//! - **Gamification**: exponential XP/level curve and audited points ledger
//! - **Leaderboard**: metric x period ranking with display formatting

/// Time-bucketed aggregation core (heatmaps, progress, time series)
pub mod analytics;

/// Authentication and JWT session management
pub mod auth;

/// Time-based cache for expensive platform-wide aggregations
pub mod cache;

/// Configuration management
pub mod config;

/// Application constants and tuning values
pub mod constants;

/// Database access layer and schema migrations
pub mod database;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// XP/level progression and points ledger
pub mod gamification;

/// Multi-criteria leaderboard ranking
pub mod leaderboard;

/// Production logging and structured output
pub mod logging;

/// Common data models
pub mod models;

/// HTTP route handlers
pub mod routes;

/// Server resources and router assembly
pub mod server;
