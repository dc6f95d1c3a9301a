// ABOUTME: Multi-criteria leaderboard engine: metric x period ranking with display formatting
// ABOUTME: Full orderings come from the database; ranks, badges, and labels are derived here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::limits::CONSISTENCY_DEFAULT_WINDOW_DAYS;
use crate::database::{Database, LeaderboardRow};
use crate::errors::{AppError, AppResult};
use crate::gamification::{start_of_iso_week, start_of_utc_day};

/// What a leaderboard ranks by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Consumption,
    Streak,
    Points,
    Xp,
    Consistency,
    WeeklyGoals,
    MonthlyGoals,
}

impl std::str::FromStr for Metric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consumption" => Ok(Self::Consumption),
            "streak" => Ok(Self::Streak),
            "points" => Ok(Self::Points),
            "xp" => Ok(Self::Xp),
            "consistency" => Ok(Self::Consistency),
            "weekly_goals" => Ok(Self::WeeklyGoals),
            "monthly_goals" => Ok(Self::MonthlyGoals),
            other => Err(AppError::invalid_input(format!(
                "Unknown leaderboard metric: {other}"
            ))),
        }
    }
}

/// Time window a leaderboard covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Weekly,
    CurrentWeek,
    Monthly,
    CurrentMonth,
    AllTime,
}

impl std::str::FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "current_week" => Ok(Self::CurrentWeek),
            "monthly" => Ok(Self::Monthly),
            "current_month" => Ok(Self::CurrentMonth),
            "all_time" => Ok(Self::AllTime),
            other => Err(AppError::invalid_input(format!(
                "Unknown leaderboard period: {other}"
            ))),
        }
    }
}

impl Period {
    /// Concrete `[start, end)` window for this period at `now`.
    ///
    /// Rolling periods (weekly, monthly) look back from now; calendar
    /// periods (`current_week`, `current_month`) start at the boundary.
    /// `all_time` spans from the epoch.
    #[must_use]
    pub fn date_range(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = now + Duration::seconds(1);
        match self {
            Self::Daily => (start_of_utc_day(now), end),
            Self::Weekly => (now - Duration::days(7), end),
            Self::CurrentWeek => (start_of_iso_week(now), end),
            Self::Monthly => (now - Duration::days(30), end),
            Self::CurrentMonth => {
                let day_of_month = i64::from(now.date_naive().day());
                (start_of_utc_day(now) - Duration::days(day_of_month - 1), end)
            }
            Self::AllTime => (Utc.timestamp_opt(0, 0).single().unwrap_or(now), end),
        }
    }
}

/// One row of a rendered leaderboard
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: Uuid,
    pub username: String,
    pub value: f64,
    pub formatted_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub is_current_user: bool,
}

/// The requesting user's position when outside the returned page
#[derive(Debug, Clone, Serialize)]
pub struct UserRank {
    pub rank: i64,
    pub value: f64,
    pub formatted_value: String,
}

/// A rendered leaderboard page
#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub metric: Metric,
    pub period: Period,
    pub entries: Vec<LeaderboardEntry>,
    pub total_participants: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rank: Option<UserRank>,
}

/// Champion badges for the top ranks
#[must_use]
pub fn badge_for_rank(rank: i64) -> Option<&'static str> {
    match rank {
        1 => Some("\u{1f947} Champion"),
        2 => Some("\u{1f948} Runner-up"),
        3 => Some("\u{1f949} Third Place"),
        4..=5 => Some("\u{2b50} Top 5"),
        6..=10 => Some("\u{1f525} Top 10"),
        _ => None,
    }
}

/// Human-readable value per metric: liters above 1000 ml, day counts for
/// streaks and goals, percentages for consistency
#[must_use]
pub fn format_value(metric: Metric, value: f64) -> String {
    match metric {
        Metric::Consumption => {
            if value >= 1000.0 {
                format!("{:.1} L", value / 1000.0)
            } else {
                format!("{value:.0} ml")
            }
        }
        Metric::Streak | Metric::WeeklyGoals | Metric::MonthlyGoals => {
            format!("{value:.0} days")
        }
        Metric::Points => format!("{value:.0} pts"),
        Metric::Xp => format!("{value:.0} XP"),
        Metric::Consistency => format!("{value:.1}%"),
    }
}

/// Build a leaderboard page for a metric and period.
///
/// Ranks are positions in the full ordering; ties keep query order. When the
/// requesting user falls outside the page, their true rank is still reported.
///
/// # Errors
///
/// Returns an error if a database query fails
pub async fn build(
    database: &Database,
    metric: Metric,
    period: Period,
    limit: usize,
    current_user: Uuid,
) -> AppResult<Leaderboard> {
    let now = Utc::now();
    let (start, end) = period.date_range(now);

    let rows = match metric {
        Metric::Consumption => database.rank_by_consumption(start, end).await?,
        Metric::Streak => database.rank_by_streak().await?,
        Metric::Points => database.rank_by_points().await?,
        Metric::Xp => database.rank_by_xp().await?,
        Metric::Consistency => {
            let (window_start, window_days) = if period == Period::AllTime {
                (
                    now - Duration::days(CONSISTENCY_DEFAULT_WINDOW_DAYS),
                    CONSISTENCY_DEFAULT_WINDOW_DAYS,
                )
            } else {
                (start, (end - start).num_days().max(1))
            };
            let rows = database.rank_by_active_days(window_start, end).await?;
            scale_to_percentage(rows, window_days)
        }
        Metric::WeeklyGoals => {
            let (week_start, week_end) = Period::CurrentWeek.date_range(now);
            database
                .rank_by_goal_days(week_start.date_naive(), week_end.date_naive())
                .await?
        }
        Metric::MonthlyGoals => {
            let (month_start, month_end) = Period::CurrentMonth.date_range(now);
            database
                .rank_by_goal_days(month_start.date_naive(), month_end.date_naive())
                .await?
        }
    };

    let total_participants = i64::try_from(rows.len()).unwrap_or(i64::MAX);

    let entries: Vec<LeaderboardEntry> = rows
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, row)| {
            let rank = i64::try_from(i).unwrap_or(i64::MAX) + 1;
            LeaderboardEntry {
                rank,
                user_id: row.user_id,
                username: row.username.clone(),
                value: row.value,
                formatted_value: format_value(metric, row.value),
                badge: badge_for_rank(rank).map(ToOwned::to_owned),
                is_current_user: row.user_id == current_user,
            }
        })
        .collect();

    let user_rank = rows.iter().position(|r| r.user_id == current_user).map(|i| {
        let rank = i64::try_from(i).unwrap_or(i64::MAX) + 1;
        UserRank {
            rank,
            value: rows[i].value,
            formatted_value: format_value(metric, rows[i].value),
        }
    });

    Ok(Leaderboard {
        metric,
        period,
        entries,
        total_participants,
        user_rank,
    })
}

#[allow(clippy::cast_precision_loss)]
fn scale_to_percentage(mut rows: Vec<LeaderboardRow>, window_days: i64) -> Vec<LeaderboardRow> {
    for row in &mut rows {
        row.value = (row.value / window_days as f64) * 100.0;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badges_cover_the_podium_and_top_ten() {
        assert_eq!(badge_for_rank(1), Some("\u{1f947} Champion"));
        assert_eq!(badge_for_rank(2), Some("\u{1f948} Runner-up"));
        assert_eq!(badge_for_rank(3), Some("\u{1f949} Third Place"));
        assert_eq!(badge_for_rank(5), Some("\u{2b50} Top 5"));
        assert_eq!(badge_for_rank(10), Some("\u{1f525} Top 10"));
        assert_eq!(badge_for_rank(11), None);
    }

    #[test]
    fn consumption_formats_switch_to_liters() {
        assert_eq!(format_value(Metric::Consumption, 950.0), "950 ml");
        assert_eq!(format_value(Metric::Consumption, 1500.0), "1.5 L");
        assert_eq!(format_value(Metric::Consumption, 12_340.0), "12.3 L");
    }

    #[test]
    fn unit_suffixes_per_metric() {
        assert_eq!(format_value(Metric::Streak, 7.0), "7 days");
        assert_eq!(format_value(Metric::Points, 420.0), "420 pts");
        assert_eq!(format_value(Metric::Xp, 9001.0), "9001 XP");
        assert_eq!(format_value(Metric::Consistency, 76.66), "76.7%");
        assert_eq!(format_value(Metric::MonthlyGoals, 12.0), "12 days");
    }

    #[test]
    fn metric_and_period_parse_from_query_strings() {
        assert_eq!("consumption".parse::<Metric>().unwrap(), Metric::Consumption);
        assert_eq!("weekly_goals".parse::<Metric>().unwrap(), Metric::WeeklyGoals);
        assert!("invalid".parse::<Metric>().is_err());

        assert_eq!("current_week".parse::<Period>().unwrap(), Period::CurrentWeek);
        assert_eq!("all_time".parse::<Period>().unwrap(), Period::AllTime);
        assert!("fortnight".parse::<Period>().is_err());
    }

    #[test]
    fn period_ranges_are_well_formed() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        for period in [
            Period::Daily,
            Period::Weekly,
            Period::CurrentWeek,
            Period::Monthly,
            Period::CurrentMonth,
            Period::AllTime,
        ] {
            let (start, end) = period.date_range(now);
            assert!(start < end, "{period:?} range inverted");
            assert!(end > now, "{period:?} range excludes now");
        }
    }

    #[test]
    fn current_month_starts_on_the_first() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        let (start, _) = Period::CurrentMonth.date_range(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());
    }
}
