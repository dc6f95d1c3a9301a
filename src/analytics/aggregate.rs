// ABOUTME: Aggregation over per-day totals: heatmap shaping, progress averages, time series
// ABOUTME: Weekly progress divides by a full 7 days even for partial weeks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use super::buckets::{days_in_month, month_label, month_start, week_label, Granularity};

/// One day of the consumption heatmap
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub total_ml: f64,
}

/// One bucket of the progress view: average daily intake over a period
#[derive(Debug, Clone, Serialize)]
pub struct ProgressPoint {
    pub period: String,
    pub average_ml: f64,
}

/// One point of a zero-filled time series
#[derive(Debug, Clone, Serialize)]
pub struct TimeseriesPoint {
    pub date: NaiveDate,
    pub total_ml: f64,
}

/// Platform-wide aggregate snapshot. Expensive to compute, served from a
/// TTL cache.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub total_users: i64,
    pub total_volume_ml: f64,
    pub total_logs: i64,
    pub average_volume_per_user_ml: f64,
    /// Platform volume divided by the number of distinct days with any log
    pub average_daily_volume_ml: f64,
    pub active_users_last_7_days: i64,
    pub most_popular_brand: Option<String>,
}

/// Shape per-day totals into heatmap entries. Days without logs are omitted.
#[must_use]
pub fn heatmap(daily: &[(NaiveDate, f64)]) -> Vec<HeatmapDay> {
    daily
        .iter()
        .map(|&(date, total_ml)| HeatmapDay { date, total_ml })
        .collect()
}

/// Average daily intake per period.
///
/// Weekly buckets group by ISO week and divide by 7; monthly buckets group by
/// calendar month and divide by the month's length. Partial periods at the
/// edges of the data are not padded, so their averages dip accordingly.
/// Periods with no logs are absent.
#[must_use]
pub fn progress_over_time(daily: &[(NaiveDate, f64)], granularity: Granularity) -> Vec<ProgressPoint> {
    match granularity {
        Granularity::Daily => daily
            .iter()
            .map(|&(date, total)| ProgressPoint {
                period: date.format("%Y-%m-%d").to_string(),
                average_ml: total,
            })
            .collect(),
        Granularity::Weekly => group_averages(daily, week_label, |_| 7.0),
        Granularity::Monthly => {
            group_averages(daily, month_label, |date| f64::from(days_in_month(date)))
        }
    }
}

fn group_averages(
    daily: &[(NaiveDate, f64)],
    label: fn(NaiveDate) -> String,
    divisor: fn(NaiveDate) -> f64,
) -> Vec<ProgressPoint> {
    // Input is date-ordered, so first-seen label order is chronological
    let mut order: Vec<String> = Vec::new();
    let mut sums: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    for &(date, total) in daily {
        let key = label(date);
        if !sums.contains_key(&key) {
            order.push(key.clone());
        }
        let entry = sums.entry(key).or_insert((0.0, divisor(date)));
        entry.0 += total;
    }

    order
        .into_iter()
        .map(|key| {
            let (sum, div) = sums[&key];
            ProgressPoint {
                period: key,
                average_ml: sum / div,
            }
        })
        .collect()
}

/// Zero-filled time series over `[start, end]`.
///
/// Daily emits one point per day. Weekly emits one point per 7-day window
/// anchored at `start`. Monthly emits one point per calendar month, dated the
/// first of the month.
#[must_use]
pub fn timeseries(
    daily: &BTreeMap<NaiveDate, f64>,
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
) -> Vec<TimeseriesPoint> {
    if end < start {
        return Vec::new();
    }

    match granularity {
        Granularity::Daily => start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|date| TimeseriesPoint {
                date,
                total_ml: daily.get(&date).copied().unwrap_or(0.0),
            })
            .collect(),
        Granularity::Weekly => {
            let mut points = Vec::new();
            let mut window_start = start;
            while window_start <= end {
                let window_end = window_start + Duration::days(7);
                let total_ml = daily
                    .range(window_start..window_end)
                    .map(|(_, v)| v)
                    .sum();
                points.push(TimeseriesPoint {
                    date: window_start,
                    total_ml,
                });
                window_start = window_end;
            }
            points
        }
        Granularity::Monthly => {
            let mut points = Vec::new();
            let mut month = month_start(start);
            let last_month = month_start(end);
            while month <= last_month {
                let next = month + Duration::days(i64::from(days_in_month(month)));
                let total_ml = daily.range(month..next).map(|(_, v)| v).sum();
                points.push(TimeseriesPoint {
                    date: month,
                    total_ml,
                });
                month = next;
            }
            points
        }
    }
}

/// Current and longest goal streaks from the sorted set of goal-met dates.
///
/// The current streak is the consecutive run ending today or yesterday; a
/// day without the goal met breaks it.
#[must_use]
pub fn compute_streaks(goal_dates: &[NaiveDate], today: NaiveDate) -> (i32, i32) {
    if goal_dates.is_empty() {
        return (0, 0);
    }

    let mut longest = 1_i32;
    let mut run = 1_i32;
    for pair in goal_dates.windows(2) {
        if pair[1] == pair[0] + Duration::days(1) {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
    }

    let last = goal_dates[goal_dates.len() - 1];
    let current = if last == today || last + Duration::days(1) == today {
        run
    } else {
        0
    };

    (current, longest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn heatmap_preserves_totals_and_omits_empty_days() {
        let daily = vec![(d(2026, 8, 1), 1500.0), (d(2026, 8, 3), 2000.0)];
        let map = heatmap(&daily);

        assert_eq!(map.len(), 2);
        let sum: f64 = map.iter().map(|e| e.total_ml).sum();
        assert!((sum - 3500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weekly_progress_divides_by_seven_even_when_partial() {
        // Two days logged inside one ISO week
        let daily = vec![(d(2026, 8, 17), 1400.0), (d(2026, 8, 18), 700.0)];
        let points = progress_over_time(&daily, Granularity::Weekly);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].period, "2026-W34");
        assert!((points[0].average_ml - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn monthly_progress_divides_by_month_length() {
        let daily = vec![(d(2026, 2, 1), 2800.0)];
        let points = progress_over_time(&daily, Granularity::Monthly);

        assert_eq!(points[0].period, "2026-02");
        assert!((points[0].average_ml - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_periods_stay_chronological_across_years() {
        let daily = vec![
            (d(2024, 12, 28), 700.0),
            (d(2024, 12, 30), 700.0), // ISO week 2025-W01
            (d(2025, 1, 6), 700.0),
        ];
        let points = progress_over_time(&daily, Granularity::Weekly);
        let periods: Vec<&str> = points.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, vec!["2024-W52", "2025-W01", "2025-W02"]);
    }

    #[test]
    fn daily_timeseries_zero_fills() {
        let mut daily = BTreeMap::new();
        daily.insert(d(2026, 8, 2), 500.0);

        let points = timeseries(&daily, d(2026, 8, 1), d(2026, 8, 3), Granularity::Daily);
        assert_eq!(points.len(), 3);
        assert!((points[0].total_ml - 0.0).abs() < f64::EPSILON);
        assert!((points[1].total_ml - 500.0).abs() < f64::EPSILON);
        assert!((points[2].total_ml - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weekly_timeseries_anchors_windows_at_requested_start() {
        let mut daily = BTreeMap::new();
        daily.insert(d(2026, 8, 5), 1000.0); // day 2 of first window
        daily.insert(d(2026, 8, 12), 2000.0); // day 2 of second window

        let points = timeseries(&daily, d(2026, 8, 4), d(2026, 8, 17), Granularity::Weekly);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, d(2026, 8, 4));
        assert!((points[0].total_ml - 1000.0).abs() < f64::EPSILON);
        assert_eq!(points[1].date, d(2026, 8, 11));
        assert!((points[1].total_ml - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn monthly_timeseries_aligns_to_calendar_months() {
        let mut daily = BTreeMap::new();
        daily.insert(d(2026, 7, 31), 100.0);
        daily.insert(d(2026, 8, 1), 200.0);

        let points = timeseries(&daily, d(2026, 7, 15), d(2026, 8, 15), Granularity::Monthly);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, d(2026, 7, 1));
        assert!((points[0].total_ml - 100.0).abs() < f64::EPSILON);
        assert_eq!(points[1].date, d(2026, 8, 1));
        assert!((points[1].total_ml - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn streaks_track_runs_and_breaks() {
        let dates = vec![
            d(2026, 8, 10),
            d(2026, 8, 11),
            d(2026, 8, 12),
            d(2026, 8, 20),
            d(2026, 8, 21),
        ];

        // Last goal day was yesterday relative to the 22nd
        let (current, longest) = compute_streaks(&dates, d(2026, 8, 22));
        assert_eq!(current, 2);
        assert_eq!(longest, 3);

        // A gap before today zeroes the current streak
        let (current, longest) = compute_streaks(&dates, d(2026, 8, 25));
        assert_eq!(current, 0);
        assert_eq!(longest, 3);
    }

    #[test]
    fn empty_goal_history_has_no_streaks() {
        assert_eq!(compute_streaks(&[], d(2026, 8, 22)), (0, 0));
    }
}
