//! Planner facade over the daily, weekly and monthly stores.
//!
//! # Responsibility
//! - Open the shared storage backend from [`CoreConfig`].
//! - Hold the displayed-period cursors and resolve them to bucket keys.
//! - Provide cross-store operations: overview, export, clear-all.
//!
//! # Invariants
//! - All three stores persist through the same backend, one key each.
//! - Cursor movement never touches stored data.

use crate::calendar::weekly::default_day;
use crate::calendar::{today_local, DayKey, MonthCursor, WeekCursor};
use crate::config::{ConfigError, CoreConfig, StorageKeys};
use crate::db::DbError;
use crate::logging::init_logging;
use crate::model::task::{Priority, Task};
use crate::service::overview::{
    ExportDocument, PlannerKind, StoreTotals, UserStats, EXPORT_VERSION,
};
use crate::storage::{KeyValueStore, SqliteKvStore};
use crate::store::{
    DailyStore, MonthlyStore, TaskInputError, TaskStats, WeeklyStore,
};
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::time::Instant;

#[derive(Debug)]
pub enum PlannerError {
    Config(ConfigError),
    Logging(String),
    Db(DbError),
}

impl Display for PlannerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PlannerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<ConfigError> for PlannerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for PlannerError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// The three planners plus their displayed periods.
pub struct Planner<S: KeyValueStore> {
    storage: Rc<S>,
    daily: DailyStore<Rc<S>>,
    weekly: WeeklyStore<Rc<S>>,
    monthly: MonthlyStore<Rc<S>>,
    week: WeekCursor,
    month: MonthCursor,
}

impl Planner<SqliteKvStore> {
    /// Opens the planner described by `config`.
    ///
    /// # Contract
    /// - Validates `config` first.
    /// - Starts file logging when `log_dir` is set.
    /// - Uses an in-memory database when `database_path` is absent.
    /// - Cursors start at today's week and month.
    pub fn open(config: &CoreConfig) -> Result<Self, PlannerError> {
        config.validate()?;
        if let Some(dir) = &config.log_dir {
            init_logging(&config.log_level, &dir.to_string_lossy())
                .map_err(PlannerError::Logging)?;
        }

        let started_at = Instant::now();
        let storage = match &config.database_path {
            Some(path) => SqliteKvStore::open(path),
            None => SqliteKvStore::open_in_memory(),
        };
        let storage = storage.map_err(|err| {
            error!(
                "event=planner_open module=service status=error error_code=storage_open_failed error={}",
                err
            );
            PlannerError::from(err)
        })?;

        let planner = Self::new(storage, &config.storage_keys, today_local());
        info!(
            "event=planner_open module=service status=ok persistent={} tasks={} duration_ms={}",
            config.database_path.is_some(),
            planner.totals().combined().total,
            started_at.elapsed().as_millis()
        );
        Ok(planner)
    }
}

impl<S: KeyValueStore> Planner<S> {
    /// Loads all three stores from `storage` under `keys`.
    pub fn new(storage: S, keys: &StorageKeys, today: NaiveDate) -> Self {
        let storage = Rc::new(storage);
        Self {
            daily: DailyStore::open_with_key(Rc::clone(&storage), keys.daily.as_str()),
            weekly: WeeklyStore::open_with_key(Rc::clone(&storage), keys.weekly.as_str()),
            monthly: MonthlyStore::open_with_key(Rc::clone(&storage), keys.monthly.as_str()),
            storage,
            week: WeekCursor::new(today),
            month: MonthCursor::new(today),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn daily(&self) -> &DailyStore<Rc<S>> {
        &self.daily
    }

    pub fn daily_mut(&mut self) -> &mut DailyStore<Rc<S>> {
        &mut self.daily
    }

    pub fn weekly(&self) -> &WeeklyStore<Rc<S>> {
        &self.weekly
    }

    pub fn weekly_mut(&mut self) -> &mut WeeklyStore<Rc<S>> {
        &mut self.weekly
    }

    pub fn monthly(&self) -> &MonthlyStore<Rc<S>> {
        &self.monthly
    }

    pub fn monthly_mut(&mut self) -> &mut MonthlyStore<Rc<S>> {
        &mut self.monthly
    }

    pub fn week_cursor(&self) -> &WeekCursor {
        &self.week
    }

    pub fn week_cursor_mut(&mut self) -> &mut WeekCursor {
        &mut self.week
    }

    pub fn month_cursor(&self) -> &MonthCursor {
        &self.month
    }

    pub fn month_cursor_mut(&mut self) -> &mut MonthCursor {
        &mut self.month
    }

    /// Adds to `day` of the displayed week; `None` means today's weekday.
    pub fn add_weekly_task(
        &mut self,
        day: Option<Weekday>,
        text: &str,
        today: NaiveDate,
    ) -> Result<Task, TaskInputError> {
        let bucket = self.week.bucket(day.unwrap_or_else(|| default_day(today)));
        self.weekly.add_task(&bucket, text, None)
    }

    /// Tasks of `day` in the displayed week, oldest first.
    pub fn weekly_tasks(&self, day: Weekday) -> Vec<Task> {
        self.weekly.list_tasks(&self.week.bucket(day))
    }

    /// Totals for the displayed week.
    pub fn current_week_stats(&self) -> TaskStats {
        let week = self.week.key();
        self.weekly.aggregate_stats(|bucket| bucket.week == week)
    }

    /// Adds to the selected day of the displayed month.
    ///
    /// Returns `Ok(None)` when no day is selected.
    pub fn add_monthly_task(
        &mut self,
        text: &str,
        priority: Option<Priority>,
    ) -> Result<Option<Task>, TaskInputError> {
        let Some(key) = self.month.selected_key() else {
            return Ok(None);
        };
        self.monthly.add_task(&key, text, priority).map(Some)
    }

    /// Selected day's tasks in panel order; empty without a selection.
    pub fn selected_day_tasks(&self) -> Vec<Task> {
        self.month
            .selected_key()
            .map(|key| self.monthly.list_tasks(&key))
            .unwrap_or_default()
    }

    /// Totals for the displayed month; `active_buckets` counts active days.
    pub fn current_month_stats(&self) -> TaskStats {
        let (year, month0) = (self.month.year(), self.month.month0());
        self.monthly
            .aggregate_stats(|key: &DayKey| key.in_month(year, month0))
    }

    pub fn totals(&self) -> StoreTotals {
        StoreTotals {
            daily: self.daily.stats(),
            weekly: self.weekly.stats(),
            monthly: self.monthly.stats(),
        }
    }

    pub fn overview(&self, now: DateTime<Utc>) -> UserStats {
        UserStats::compute(&self.totals(), self.daily.snapshot(), now)
    }

    pub fn most_used_planner(&self) -> PlannerKind {
        self.totals().most_used()
    }

    pub fn suggested_planner(&self, local_hour: u32) -> PlannerKind {
        self.totals().suggested(local_hour)
    }

    /// Snapshot of every store plus current statistics.
    pub fn export(&self, now: DateTime<Utc>) -> ExportDocument {
        ExportDocument {
            daily_tasks: self.daily.snapshot().clone(),
            weekly_tasks: self.weekly.snapshot().clone(),
            monthly_tasks: self.monthly.snapshot().clone(),
            export_date: now,
            stats: self.overview(now),
            version: EXPORT_VERSION,
        }
    }

    /// Removes all three persisted snapshots and empties every store.
    pub fn clear_all(&mut self) {
        self.daily.clear();
        self.weekly.clear();
        self.monthly.clear();
    }
}
