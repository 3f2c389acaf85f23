//! Progress statistics over a user's habits.
//!
//! Rates are percentages in `0.0..=100.0`.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::Habit;

/// Number of days in the weekly window.
pub const WEEK_DAYS: u64 = 7;

/// Number of days in the monthly window.
pub const MONTH_DAYS: u64 = 30;

/// Completion figures for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStats {
    /// The day.
    pub date: NaiveDate,
    /// Habits completed on that day.
    pub completed: usize,
    /// Habits tracked.
    pub total: usize,
    /// `completed / total` as a percentage.
    pub rate: f64,
}

/// Per-habit figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    /// Habit name.
    pub name: String,
    /// Days completed.
    pub completions: usize,
    /// Current streak.
    pub current_streak: u32,
    /// Best streak.
    pub best_streak: u32,
    /// Completions over days tracked since creation, as a percentage.
    pub completion_rate: f64,
}

/// Summary shown on the progress overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    /// Figures for `today`.
    pub today: DayStats,
    /// The last seven days, oldest first, ending at `today`.
    pub weekly: Vec<DayStats>,
    /// Completion rate over the last thirty days.
    pub monthly_rate: f64,
    /// Per-habit figures, most completions first.
    pub habits: Vec<HabitStats>,
    /// Mean current streak.
    pub average_streak: f64,
}

impl ProgressSummary {
    /// Compute the summary for `habits` as of `today`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn compute(habits: &[Habit], today: NaiveDate) -> Self {
        let weekly = window(today, WEEK_DAYS)
            .map(|date| day_stats(habits, date))
            .collect();

        let monthly_completions: usize = window(today, MONTH_DAYS)
            .map(|date| completed_on(habits, date))
            .sum();
        let monthly_rate = percent(monthly_completions, habits.len() * MONTH_DAYS as usize);

        let mut per_habit: Vec<HabitStats> =
            habits.iter().map(|h| habit_stats(h, today)).collect();
        per_habit.sort_by(|a, b| b.completions.cmp(&a.completions));

        let average_streak = if habits.is_empty() {
            0.0
        } else {
            let total: u64 = habits.iter().map(|h| u64::from(h.current_streak)).sum();
            total as f64 / habits.len() as f64
        };

        Self {
            today: day_stats(habits, today),
            weekly,
            monthly_rate,
            habits: per_habit,
            average_streak,
        }
    }
}

/// The `len` days ending at `today`, oldest first.
fn window(today: NaiveDate, len: u64) -> impl Iterator<Item = NaiveDate> {
    (0..len)
        .rev()
        .filter_map(move |back| today.checked_sub_days(Days::new(back)))
}

fn completed_on(habits: &[Habit], date: NaiveDate) -> usize {
    habits.iter().filter(|h| h.is_completed_on(date)).count()
}

fn day_stats(habits: &[Habit], date: NaiveDate) -> DayStats {
    let completed = completed_on(habits, date);
    DayStats {
        date,
        completed,
        total: habits.len(),
        rate: percent(completed, habits.len()),
    }
}

fn habit_stats(habit: &Habit, today: NaiveDate) -> HabitStats {
    let tracked_days = today
        .signed_duration_since(habit.created_at.date_naive())
        .num_days()
        .saturating_add(1)
        .max(1);
    let tracked_days = usize::try_from(tracked_days).unwrap_or(usize::MAX);

    HabitStats {
        name: habit.name.clone(),
        completions: habit.completion_count(),
        current_streak: habit.current_streak,
        best_streak: habit.best_streak,
        completion_rate: percent(habit.completion_count(), tracked_days).min(100.0),
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
