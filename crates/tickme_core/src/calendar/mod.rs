//! Date bucketing per planner granularity.
//!
//! # Responsibility
//! - Map calendar dates to bucket keys (week/day keys).
//! - Provide period navigation cursors and display helpers.
//!
//! # Invariants
//! - Every function here is pure: same inputs, same outputs, no clock reads,
//!   except [`today_local`] which is the single entry point for "today".
//! - Weeks are Monday-first throughout.
//! - Months inside keys are zero-based (January = 0) to stay compatible with
//!   data written by the browser planners.

use chrono::{Datelike, Local, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod daily;
pub mod monthly;
pub mod weekly;

pub use monthly::{calendar_grid, navigate_month, CalendarCell, DayKey, MonthCursor};
pub use weekly::{navigate_week, week_key, week_start, WeekCursor, WeekKey, WeekdayBucket};

/// Number of cells in a Monday-aligned six-week month grid.
pub const GRID_CELLS: usize = 42;

/// Key parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateKeyError {
    InvalidWeekKey(String),
    InvalidDayKey(String),
    InvalidDayName(String),
}

impl Display for DateKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWeekKey(value) => write!(f, "invalid week key: `{value}`"),
            Self::InvalidDayKey(value) => write!(f, "invalid day key: `{value}`"),
            Self::InvalidDayName(value) => write!(f, "invalid day name: `{value}`"),
        }
    }
}

impl Error for DateKeyError {}

/// Today's date in the local timezone.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Zero-based month of `date` (January = 0).
pub fn month0(date: NaiveDate) -> u32 {
    date.month0()
}
