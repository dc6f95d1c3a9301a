// ABOUTME: Calendar bucketing helpers: granularities, period labels, month lengths
// ABOUTME: ISO weeks for progress grouping, calendar months aligned to day 1
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Bucket width for progress and time-series queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Default for Granularity {
    fn default() -> Self {
        Self::Daily
    }
}

/// ISO week label, e.g. `2026-W34`
pub(super) fn week_label(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Calendar month label, e.g. `2026-08`
pub(super) fn month_label(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

/// Number of days in the month containing `date`
pub(super) fn days_in_month(date: NaiveDate) -> u32 {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    // Both dates exist for every valid input month
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or(date);
    let first_of_this = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .unwrap_or(date);
    u32::try_from(first_of_next.signed_duration_since(first_of_this).num_days())
        .unwrap_or(30)
}

/// First day of the month containing `date`
pub(super) fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}
