//! Cross-store statistics and the export document.
//!
//! # Responsibility
//! - Combine per-store totals into landing-page user statistics.
//! - Pick the planner a returning or new user should land on.
//! - Describe the backup document shape.
//!
//! # Invariants
//! - Everything here is computed from snapshots; nothing is persisted.
//! - Percentages are whole numbers rounded half up; empty input yields 0.

use crate::model::task::Task;
use crate::store::granularity::{MonthlySnapshot, WeeklySnapshot};
use crate::store::{percent, TaskStats};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter};

pub const EXPORT_VERSION: &str = "2.0";
const STREAK_CAP: u32 = 30;
const TASKS_PER_STREAK_DAY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerKind {
    Daily,
    Weekly,
    Monthly,
}

impl PlannerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl Display for PlannerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-store totals for each planner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreTotals {
    pub daily: TaskStats,
    pub weekly: TaskStats,
    pub monthly: TaskStats,
}

impl StoreTotals {
    pub fn combined(&self) -> TaskStats {
        self.daily.merge(self.weekly).merge(self.monthly)
    }

    /// Planner holding the most tasks. Ties go to daily, then weekly.
    pub fn most_used(&self) -> PlannerKind {
        let (daily, weekly, monthly) = (self.daily.total, self.weekly.total, self.monthly.total);
        if daily >= weekly && daily >= monthly {
            PlannerKind::Daily
        } else if weekly >= monthly {
            PlannerKind::Weekly
        } else {
            PlannerKind::Monthly
        }
    }

    /// Landing target: the most used planner once any task exists, otherwise
    /// by time of day (morning daily, afternoon weekly, evening monthly).
    pub fn suggested(&self, local_hour: u32) -> PlannerKind {
        if self.combined().total > 0 {
            return self.most_used();
        }
        match local_hour {
            0..=11 => PlannerKind::Daily,
            12..=17 => PlannerKind::Weekly,
            _ => PlannerKind::Monthly,
        }
    }
}

/// Landing-page statistics across all planners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub current_streak: u32,
    pub completion_rate: u32,
}

impl UserStats {
    pub fn compute(totals: &StoreTotals, daily_tasks: &[Task], now: DateTime<Utc>) -> Self {
        let combined = totals.combined();
        Self {
            total_tasks: combined.total,
            completed_tasks: combined.completed,
            current_streak: current_streak(combined.completed, daily_tasks, now),
            completion_rate: percent(combined.completed, combined.total),
        }
    }
}

/// Activity streak estimate.
///
/// Zero unless something is completed and a daily task was created at most
/// one whole day ago; then one day per five completions, plus one, capped
/// at thirty.
pub fn current_streak(completed: usize, daily_tasks: &[Task], now: DateTime<Utc>) -> u32 {
    if completed == 0 {
        return 0;
    }
    let recent = daily_tasks
        .iter()
        .any(|task| now.signed_duration_since(task.created_at).num_days() <= 1);
    if !recent {
        return 0;
    }
    let days = u32::try_from(completed / TASKS_PER_STREAK_DAY).unwrap_or(u32::MAX);
    days.saturating_add(1).min(STREAK_CAP)
}

/// Full backup of all three stores plus the statistics at export time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub daily_tasks: Vec<Task>,
    pub weekly_tasks: WeeklySnapshot,
    pub monthly_tasks: MonthlySnapshot,
    #[serde(with = "crate::model::task::iso_millis")]
    pub export_date: DateTime<Utc>,
    pub stats: UserStats,
    pub version: &'static str,
}

impl ExportDocument {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Suggested download name, e.g. `tickme-backup-2024-01-15.json`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("tickme-backup-{}.json", date.format("%Y-%m-%d"))
}
