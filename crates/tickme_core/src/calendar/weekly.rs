//! Weekly bucketing.
//!
//! # Invariants
//! - `week_start` returns the Monday on or before the given date.
//! - `WeekKey` is month-relative: `ceil(day_of_month / 7)` of the week's
//!   Monday, plus that Monday's year and zero-based month. It is not an ISO
//!   week number and is only unique within one (year, month) pair; a week
//!   spanning two months is keyed by the month of its Monday.

use super::DateKeyError;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static WEEK_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d{1,6})-W([1-5])-(\d{1,2})$").expect("valid week key regex"));

/// Storage names of the week days, Monday first.
pub const DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    shift_days(date, -i64::from(date.weekday().num_days_from_monday()))
}

/// Month-relative key of the week containing `date`.
pub fn week_key(date: NaiveDate) -> WeekKey {
    WeekKey::from_monday(week_start(date))
}

/// Moves a week start by `weeks` whole weeks.
pub fn navigate_week(start: NaiveDate, weeks: i32) -> NaiveDate {
    shift_days(start, i64::from(weeks) * 7)
}

/// The seven dates of the week starting at `start`'s Monday.
pub fn week_days(start: NaiveDate) -> [NaiveDate; 7] {
    let monday = week_start(start);
    let mut days = [monday; 7];
    for (offset, day) in days.iter_mut().enumerate() {
        *day = shift_days(monday, offset as i64);
    }
    days
}

/// Header label such as `Jan 15 - Jan 21, 2024` (year of the Monday).
pub fn week_label(start: NaiveDate) -> String {
    let monday = week_start(start);
    let sunday = shift_days(monday, 6);
    format!(
        "{} - {}, {}",
        monday.format("%b %-d"),
        sunday.format("%b %-d"),
        monday.year()
    )
}

/// Storage name for a weekday (`monday` .. `sunday`).
pub fn day_name(day: Weekday) -> &'static str {
    DAY_NAMES[day.num_days_from_monday() as usize]
}

/// Parses a storage day name. Case-insensitive.
pub fn parse_day_name(value: &str) -> Result<Weekday, DateKeyError> {
    let normalized = value.trim().to_ascii_lowercase();
    DAY_NAMES
        .iter()
        .position(|name| *name == normalized)
        .map(|index| WEEKDAYS[index])
        .ok_or_else(|| DateKeyError::InvalidDayName(value.to_string()))
}

/// Default day offered by quick-add: today's weekday.
pub fn default_day(today: NaiveDate) -> Weekday {
    today.weekday()
}

fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
}

/// Month-relative week identifier, rendered as `{year}-W{n}-{month0}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    pub year: i32,
    pub week_of_month: u32,
    pub month0: u32,
}

impl WeekKey {
    /// Builds the key from a week's Monday.
    pub fn from_monday(monday: NaiveDate) -> Self {
        Self {
            year: monday.year(),
            week_of_month: monday.day().div_ceil(7),
            month0: monday.month0(),
        }
    }
}

impl Display for WeekKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{}-{}", self.year, self.week_of_month, self.month0)
    }
}

impl FromStr for WeekKey {
    type Err = DateKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DateKeyError::InvalidWeekKey(value.to_string());
        let caps = WEEK_KEY_RE.captures(value.trim()).ok_or_else(invalid)?;
        let year = caps[1].parse::<i32>().map_err(|_| invalid())?;
        let week_of_month = caps[2].parse::<u32>().map_err(|_| invalid())?;
        let month0 = caps[3].parse::<u32>().map_err(|_| invalid())?;
        if month0 > 11 {
            return Err(invalid());
        }
        Ok(Self {
            year,
            week_of_month,
            month0,
        })
    }
}

/// Bucket address in the weekly store: one day of one keyed week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayBucket {
    pub week: WeekKey,
    pub day: Weekday,
}

impl WeekdayBucket {
    pub fn new(week: WeekKey, day: Weekday) -> Self {
        Self { week, day }
    }

    /// Bucket holding tasks planned for `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            week: week_key(date),
            day: date.weekday(),
        }
    }

    pub fn day_name(&self) -> &'static str {
        day_name(self.day)
    }
}

/// Currently displayed week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCursor {
    start: NaiveDate,
}

impl WeekCursor {
    /// Opens on the week containing `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            start: week_start(today),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn key(&self) -> WeekKey {
        WeekKey::from_monday(self.start)
    }

    pub fn bucket(&self, day: Weekday) -> WeekdayBucket {
        WeekdayBucket::new(self.key(), day)
    }

    pub fn days(&self) -> [NaiveDate; 7] {
        week_days(self.start)
    }

    pub fn label(&self) -> String {
        week_label(self.start)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        week_start(date) == self.start
    }

    pub fn previous(&mut self) {
        self.navigate(-1);
    }

    pub fn next(&mut self) {
        self.navigate(1);
    }

    pub fn navigate(&mut self, weeks: i32) {
        self.start = navigate_week(self.start, weeks);
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.start = week_start(today);
    }
}
