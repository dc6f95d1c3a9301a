// ABOUTME: Gamification services: XP/level progression and the points economy
// ABOUTME: Pure curve math lives in levels; all awards flow through the database ledger
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

//! # Gamification
//!
//! Two connected economies. XP is append-only and drives the exponential
//! level curve; points are spendable currency with caps, transfers, and a
//! reward store. Every balance change writes a ledger row.

pub mod levels;
pub mod points;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

/// Start of the UTC day containing `now`. Daily caps reset here.
#[must_use]
pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &now.date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_else(|| now.naive_utc()),
    )
}

/// Start of the ISO week (Monday, UTC) containing `now`. Weekly caps reset here.
#[must_use]
pub fn start_of_iso_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_from_monday = i64::from(now.date_naive().weekday().num_days_from_monday());
    start_of_utc_day(now) - Duration::days(days_from_monday)
}
