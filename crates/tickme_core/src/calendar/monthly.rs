//! Monthly bucketing and the month grid.
//!
//! # Invariants
//! - `DayKey` renders as `{year}-{month0}-{day}` and always names a real date.
//! - Month navigation normalizes to the first of the month before shifting,
//!   so Jan 31 + 1 month is Feb 1, never Mar 2/3.
//! - `calendar_grid` always returns exactly [`GRID_CELLS`] Monday-aligned cells.
//! - Navigable months are limited to those whose whole grid is representable.

use super::{DateKeyError, GRID_CELLS};
use chrono::{Datelike, Days, Duration, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static DAY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d{1,6})-(\d{1,2})-(\d{1,2})$").expect("valid day key regex"));

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Bucket key of the monthly store: one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a key from year, zero-based month and day of month.
    pub fn from_parts(year: i32, month0: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month0.checked_add(1)?, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month0(&self) -> u32 {
        self.0.month0()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// True when the key falls inside (year, zero-based month).
    pub fn in_month(&self, year: i32, month0: u32) -> bool {
        self.year() == year && self.month0() == month0
    }
}

impl From<NaiveDate> for DayKey {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.year(), self.month0(), self.day())
    }
}

impl FromStr for DayKey {
    type Err = DateKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DateKeyError::InvalidDayKey(value.to_string());
        let caps = DAY_KEY_RE.captures(value.trim()).ok_or_else(invalid)?;
        let year = caps[1].parse::<i32>().map_err(|_| invalid())?;
        let month0 = caps[2].parse::<u32>().map_err(|_| invalid())?;
        let day = caps[3].parse::<u32>().map_err(|_| invalid())?;
        Self::from_parts(year, month0, day).ok_or_else(invalid)
    }
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First and last month (as their 1st) whose full grid fits in chrono's
/// date range.
pub fn grid_month_range() -> (NaiveDate, NaiveDate) {
    // A month's 1st is at most 30 days before the date it is taken from.
    let earliest = NaiveDate::MIN
        .checked_add_days(Days::new(36))
        .map(first_of_month)
        .unwrap_or(NaiveDate::MIN);
    let latest = NaiveDate::MAX
        .checked_sub_days(Days::new(GRID_CELLS as u64))
        .map(first_of_month)
        .unwrap_or(NaiveDate::MAX);
    (earliest, latest)
}

/// First of `date`'s month, clamped into [`grid_month_range`].
pub fn clamp_grid_month(date: NaiveDate) -> NaiveDate {
    let (earliest, latest) = grid_month_range();
    first_of_month(date).clamp(earliest, latest)
}

/// Shifts by whole months, landing on the first of the target month.
///
/// Saturates at [`grid_month_range`] instead of failing.
pub fn navigate_month(date: NaiveDate, months: i32) -> NaiveDate {
    let (earliest, latest) = grid_month_range();
    let first = first_of_month(date);
    let step = Months::new(months.unsigned_abs());
    let shifted = if months < 0 {
        first.checked_sub_months(step)
    } else {
        first.checked_add_months(step)
    };
    match shifted {
        Some(target) => target.clamp(earliest, latest),
        None if months < 0 => earliest,
        None => latest,
    }
}

/// Header label such as `January 2024`.
pub fn month_label(date: NaiveDate) -> String {
    format!("{} {}", MONTH_NAMES[date.month0() as usize], date.year())
}

/// Full label for the selected day, e.g. `Monday, January 15, 2024`.
pub fn day_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// One cell of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// False for lead-in days of the previous month and trailing days of the
    /// next month.
    pub in_month: bool,
}

impl CalendarCell {
    pub fn key(&self) -> DayKey {
        DayKey(self.date)
    }
}

/// Builds the Monday-aligned 6x7 grid for the month containing `month`.
///
/// Lead-in is `(first_weekday + 6) % 7` days of the previous month, i.e.
/// the first day's Monday-based index; the rest is filled forward. Months
/// at the edge of the date range use the nearest month in
/// [`grid_month_range`].
pub fn calendar_grid(month: NaiveDate) -> Vec<CalendarCell> {
    let first = clamp_grid_month(month);
    let lead_in = i64::from(first.weekday().num_days_from_monday());
    let grid_start = first
        .checked_sub_signed(Duration::days(lead_in))
        .unwrap_or(first);

    grid_start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| CalendarCell {
            date,
            in_month: date.year() == first.year() && date.month() == first.month(),
        })
        .collect()
}

/// Currently displayed month plus an optional selected day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    first: NaiveDate,
    selected: Option<NaiveDate>,
}

impl MonthCursor {
    /// Opens on `today`'s month with `today` selected.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            first: clamp_grid_month(today),
            selected: Some(today),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month0(&self) -> u32 {
        self.first.month0()
    }

    pub fn label(&self) -> String {
        month_label(self.first)
    }

    pub fn grid(&self) -> Vec<CalendarCell> {
        calendar_grid(self.first)
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn selected_key(&self) -> Option<DayKey> {
        self.selected.map(DayKey)
    }

    pub fn select(&mut self, date: NaiveDate) {
        self.selected = Some(date);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// True when `key` belongs to the displayed month.
    pub fn contains(&self, key: &DayKey) -> bool {
        key.in_month(self.year(), self.month0())
    }

    pub fn previous(&mut self) {
        self.navigate(-1);
    }

    pub fn next(&mut self) {
        self.navigate(1);
    }

    /// Moves by whole months; any selection is dropped.
    pub fn navigate(&mut self, months: i32) {
        self.first = navigate_month(self.first, months);
        self.selected = None;
    }

    /// Jumps to today's month and selects today.
    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.first = clamp_grid_month(today);
        self.selected = Some(today);
    }
}

#[cfg(test)]
mod tests {
    use super::{calendar_grid, day_label, grid_month_range, navigate_month, DayKey, MonthCursor};
    use chrono::{Datelike, NaiveDate, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_key_uses_zero_based_month() {
        assert_eq!(DayKey::new(date(2024, 1, 15)).to_string(), "2024-0-15");
        assert_eq!(
            "2024-11-31".parse::<DayKey>().unwrap().date(),
            date(2024, 12, 31)
        );
    }

    #[test]
    fn day_key_rejects_impossible_dates() {
        assert!("2023-1-29".parse::<DayKey>().is_err());
        assert!("2024-12-1".parse::<DayKey>().is_err());
        assert!("2024-0".parse::<DayKey>().is_err());
    }

    #[test]
    fn navigation_normalizes_to_first_of_month() {
        assert_eq!(navigate_month(date(2024, 1, 31), 1), date(2024, 2, 1));
        assert_eq!(navigate_month(date(2024, 1, 31), -1), date(2023, 12, 1));
        assert_eq!(navigate_month(date(2024, 3, 15), 12), date(2025, 3, 1));
    }

    #[test]
    fn grid_leads_in_from_previous_month() {
        // September 2024 starts on a Sunday: six lead-in days.
        let grid = calendar_grid(date(2024, 9, 10));
        assert_eq!(grid.len(), 42);
        assert_eq!(grid[0].date, date(2024, 8, 26));
        assert!(!grid[5].in_month);
        assert_eq!(grid[6].date, date(2024, 9, 1));
        assert!(grid[6].in_month);
        assert!(!grid[41].in_month);
    }

    #[test]
    fn cursor_navigation_drops_selection() {
        let mut cursor = MonthCursor::new(date(2024, 1, 15));
        assert_eq!(cursor.selected(), Some(date(2024, 1, 15)));
        cursor.next();
        assert_eq!(cursor.selected(), None);
        assert_eq!(cursor.label(), "February 2024");
        cursor.go_to_today(date(2024, 1, 20));
        assert_eq!(cursor.month0(), 0);
        assert_eq!(cursor.selected_key().unwrap().to_string(), "2024-0-20");
    }

    #[test]
    fn grid_stays_full_at_the_edges_of_the_date_range() {
        for month in [NaiveDate::MIN, NaiveDate::MAX] {
            let grid = calendar_grid(month);
            assert_eq!(grid.len(), 42);
            assert_eq!(grid[0].date.weekday(), Weekday::Mon);
        }

        let (earliest, latest) = grid_month_range();
        assert_eq!(navigate_month(date(2024, 1, 15), i32::MAX), latest);
        assert_eq!(navigate_month(date(2024, 1, 15), i32::MIN), earliest);
        assert_eq!(navigate_month(latest, 1), latest);
    }

    #[test]
    fn day_label_is_long_form() {
        assert_eq!(day_label(date(2024, 1, 15)), "Monday, January 15, 2024");
    }
}
