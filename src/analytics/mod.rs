// ABOUTME: Time-bucketed aggregation core: heatmaps, progress averages, time series
// ABOUTME: Pure calendar math over per-day totals, fed by the database layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

//! # Analytics
//!
//! Aggregation primitives over per-day volume totals. The database layer
//! produces `(date, total)` pairs; everything here is deterministic calendar
//! math, which keeps it unit-testable without a database.

mod aggregate;
mod buckets;

pub use aggregate::{
    compute_streaks, heatmap, progress_over_time, timeseries, GlobalStats, HeatmapDay,
    ProgressPoint, TimeseriesPoint,
};
pub use buckets::Granularity;
