//! Snapshot layouts of the three planner granularities.
//!
//! # Responsibility
//! - Describe how each granularity shapes its persisted container and how a
//!   bucket key addresses a task list inside it.
//! - Check loaded snapshots task by task and repair what can be repaired.
//!
//! # Invariants
//! - Persisted container shapes match the browser planners: daily = JSON
//!   array, weekly = `{weekKey: {dayName: [..]}}`, monthly =
//!   `{"year-month0-day": [..]}`.
//! - Non-canonical keys are reported but kept, so a later save writes them
//!   back untouched. Only tasks that cannot be repaired are dropped.

use super::ordering::DisplayOrder;
use crate::calendar::weekly::{day_name, parse_day_name};
use crate::calendar::{DateKeyError, DayKey, WeekKey, WeekdayBucket};
use crate::model::task::{Task, TaskValidationError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// A problem found in a stored snapshot.
///
/// Only `Parse` discards the whole snapshot; the other variants describe a
/// single key or task.
#[derive(Debug)]
pub enum SnapshotError {
    Parse(serde_json::Error),
    InvalidKey(DateKeyError),
    NonCanonicalKey(String),
    /// Task dropped on load.
    InvalidTask(TaskValidationError),
    /// Task kept after its completion timestamp was fixed.
    RepairedTask(TaskValidationError),
}

impl SnapshotError {
    /// Stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "snapshot_malformed",
            Self::InvalidKey(_) => "bucket_key_invalid",
            Self::NonCanonicalKey(_) => "bucket_key_non_canonical",
            Self::InvalidTask(_) => "task_dropped",
            Self::RepairedTask(_) => "task_repaired",
        }
    }
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "snapshot is not valid JSON for this layout: {err}"),
            Self::InvalidKey(err) => write!(f, "{err}"),
            Self::NonCanonicalKey(key) => write!(f, "bucket key `{key}` is not canonical"),
            Self::InvalidTask(err) => write!(f, "dropped task: {err}"),
            Self::RepairedTask(err) => write!(f, "repaired task: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidKey(err) => Some(err),
            Self::NonCanonicalKey(_) => None,
            Self::InvalidTask(err) | Self::RepairedTask(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<DateKeyError> for SnapshotError {
    fn from(value: DateKeyError) -> Self {
        Self::InvalidKey(value)
    }
}


/// Container layout and bucket addressing for one planner granularity.
pub trait Granularity {
    /// Bucket address.
    type Key: Clone + Debug;
    /// Whole persisted state.
    type Snapshot: Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned;

    const NAME: &'static str;
    const DEFAULT_STORAGE_KEY: &'static str;
    /// Whether tasks carry a priority (defaulting to medium).
    const SUPPORTS_PRIORITY: bool;
    /// Whether a bucket emptied by a delete is removed from the container.
    const PRUNES_EMPTY_BUCKETS: bool;
    const DISPLAY_ORDER: DisplayOrder;

    fn bucket<'s>(snapshot: &'s Self::Snapshot, key: &Self::Key) -> Option<&'s Vec<Task>>;
    fn bucket_mut<'s>(snapshot: &'s mut Self::Snapshot, key: &Self::Key)
        -> Option<&'s mut Vec<Task>>;
    fn bucket_or_insert<'s>(snapshot: &'s mut Self::Snapshot, key: &Self::Key) -> &'s mut Vec<Task>;
    fn remove_bucket(snapshot: &mut Self::Snapshot, key: &Self::Key);
    /// Every addressable bucket with its key.
    fn buckets(snapshot: &Self::Snapshot) -> Vec<(Self::Key, &Vec<Task>)>;
    /// Every stored task list, including those under unparseable keys.
    fn task_lists_mut(snapshot: &mut Self::Snapshot) -> Vec<&mut Vec<Task>>;
    /// Keys that do not parse or are not in canonical form.
    fn key_issues(snapshot: &Self::Snapshot) -> Vec<SnapshotError>;

    /// Places a new task into its bucket. Appends by default.
    fn insert_task(bucket: &mut Vec<Task>, task: Task) {
        bucket.push(task);
    }

    fn task_count(snapshot: &Self::Snapshot) -> usize {
        Self::buckets(snapshot)
            .iter()
            .map(|(_, tasks)| tasks.len())
            .sum()
    }
}

/// Repairs completion mismatches and drops tasks without an id or text.
///
/// Returns one entry per repaired or dropped task, after the key issues.
pub fn repair_snapshot<G: Granularity>(snapshot: &mut G::Snapshot) -> Vec<SnapshotError> {
    let mut issues = G::key_issues(snapshot);
    for tasks in G::task_lists_mut(snapshot) {
        tasks.retain_mut(|task| {
            if let Some(fixed) = task.repair_completion() {
                issues.push(SnapshotError::RepairedTask(fixed));
            }
            match task.validate() {
                Ok(()) => true,
                Err(err) => {
                    issues.push(SnapshotError::InvalidTask(err));
                    false
                }
            }
        });
    }
    issues
}

fn canonical_key_issue<K>(raw: &str) -> Option<SnapshotError>
where
    K: std::str::FromStr<Err = DateKeyError> + Display,
{
    match raw.parse::<K>() {
        Err(err) => Some(SnapshotError::InvalidKey(err)),
        Ok(parsed) if parsed.to_string() != raw => {
            Some(SnapshotError::NonCanonicalKey(raw.to_string()))
        }
        Ok(_) => None,
    }
}

/// One flat list, newest task at the front.
#[derive(Debug, Clone, Copy, Default)]
pub struct Daily;

impl Granularity for Daily {
    type Key = ();
    type Snapshot = Vec<Task>;

    const NAME: &'static str = "daily";
    const DEFAULT_STORAGE_KEY: &'static str = "dailyTasks_v2";
    const SUPPORTS_PRIORITY: bool = false;
    const PRUNES_EMPTY_BUCKETS: bool = false;
    const DISPLAY_ORDER: DisplayOrder = DisplayOrder::NewestFirst;

    fn bucket<'s>(snapshot: &'s Self::Snapshot, _key: &()) -> Option<&'s Vec<Task>> {
        Some(snapshot)
    }

    fn bucket_mut<'s>(snapshot: &'s mut Self::Snapshot, _key: &()) -> Option<&'s mut Vec<Task>> {
        Some(snapshot)
    }

    fn bucket_or_insert<'s>(snapshot: &'s mut Self::Snapshot, _key: &()) -> &'s mut Vec<Task> {
        snapshot
    }

    /// The daily list is the container itself and is never removed.
    fn remove_bucket(_snapshot: &mut Self::Snapshot, _key: &()) {}

    fn buckets(snapshot: &Self::Snapshot) -> Vec<((), &Vec<Task>)> {
        vec![((), snapshot)]
    }

    fn task_lists_mut(snapshot: &mut Self::Snapshot) -> Vec<&mut Vec<Task>> {
        vec![snapshot]
    }

    fn key_issues(_snapshot: &Self::Snapshot) -> Vec<SnapshotError> {
        Vec::new()
    }

    fn insert_task(bucket: &mut Vec<Task>, task: Task) {
        bucket.insert(0, task);
    }
}

/// Week key -> day name -> tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Weekly;

pub type WeeklySnapshot = BTreeMap<String, BTreeMap<String, Vec<Task>>>;

impl Granularity for Weekly {
    type Key = WeekdayBucket;
    type Snapshot = WeeklySnapshot;

    const NAME: &'static str = "weekly";
    const DEFAULT_STORAGE_KEY: &'static str = "weeklyTasks_v2";
    const SUPPORTS_PRIORITY: bool = false;
    const PRUNES_EMPTY_BUCKETS: bool = false;
    const DISPLAY_ORDER: DisplayOrder = DisplayOrder::OldestFirst;

    fn bucket<'s>(snapshot: &'s Self::Snapshot, key: &WeekdayBucket) -> Option<&'s Vec<Task>> {
        snapshot
            .get(&key.week.to_string())
            .and_then(|days| days.get(key.day_name()))
    }

    fn bucket_mut<'s>(
        snapshot: &'s mut Self::Snapshot,
        key: &WeekdayBucket,
    ) -> Option<&'s mut Vec<Task>> {
        snapshot
            .get_mut(&key.week.to_string())
            .and_then(|days| days.get_mut(key.day_name()))
    }

    fn bucket_or_insert<'s>(
        snapshot: &'s mut Self::Snapshot,
        key: &WeekdayBucket,
    ) -> &'s mut Vec<Task> {
        snapshot
            .entry(key.week.to_string())
            .or_default()
            .entry(key.day_name().to_string())
            .or_default()
    }

    fn remove_bucket(snapshot: &mut Self::Snapshot, key: &WeekdayBucket) {
        let week = key.week.to_string();
        if let Some(days) = snapshot.get_mut(&week) {
            days.remove(key.day_name());
            if days.is_empty() {
                snapshot.remove(&week);
            }
        }
    }

    fn buckets(snapshot: &Self::Snapshot) -> Vec<(WeekdayBucket, &Vec<Task>)> {
        snapshot
            .iter()
            .filter_map(|(week, days)| week.parse::<WeekKey>().ok().map(|week| (week, days)))
            .flat_map(|(week, days)| {
                days.iter().filter_map(move |(day, tasks)| {
                    parse_day_name(day)
                        .ok()
                        .map(|day| (WeekdayBucket::new(week, day), tasks))
                })
            })
            .collect()
    }

    fn task_lists_mut(snapshot: &mut Self::Snapshot) -> Vec<&mut Vec<Task>> {
        snapshot.values_mut().flat_map(|days| days.values_mut()).collect()
    }

    fn key_issues(snapshot: &Self::Snapshot) -> Vec<SnapshotError> {
        let mut issues = Vec::new();
        for (week, days) in snapshot {
            issues.extend(canonical_key_issue::<WeekKey>(week));
            for day in days.keys() {
                match parse_day_name(day) {
                    Err(err) => issues.push(err.into()),
                    Ok(parsed) if day_name(parsed) != day.as_str() => {
                        issues.push(SnapshotError::NonCanonicalKey(day.clone()))
                    }
                    Ok(_) => {}
                }
            }
        }
        issues
    }
}

/// Day key -> tasks, one list per calendar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct Monthly;

pub type MonthlySnapshot = BTreeMap<String, Vec<Task>>;

impl Granularity for Monthly {
    type Key = DayKey;
    type Snapshot = MonthlySnapshot;

    const NAME: &'static str = "monthly";
    const DEFAULT_STORAGE_KEY: &'static str = "monthlyTasks_v2";
    const SUPPORTS_PRIORITY: bool = true;
    const PRUNES_EMPTY_BUCKETS: bool = true;
    const DISPLAY_ORDER: DisplayOrder = DisplayOrder::CompletionThenPriority;

    fn bucket<'s>(snapshot: &'s Self::Snapshot, key: &DayKey) -> Option<&'s Vec<Task>> {
        snapshot.get(&key.to_string())
    }

    fn bucket_mut<'s>(snapshot: &'s mut Self::Snapshot, key: &DayKey) -> Option<&'s mut Vec<Task>> {
        snapshot.get_mut(&key.to_string())
    }

    fn bucket_or_insert<'s>(snapshot: &'s mut Self::Snapshot, key: &DayKey) -> &'s mut Vec<Task> {
        snapshot.entry(key.to_string()).or_default()
    }

    fn remove_bucket(snapshot: &mut Self::Snapshot, key: &DayKey) {
        snapshot.remove(&key.to_string());
    }

    fn buckets(snapshot: &Self::Snapshot) -> Vec<(DayKey, &Vec<Task>)> {
        snapshot
            .iter()
            .filter_map(|(key, tasks)| key.parse::<DayKey>().ok().map(|key| (key, tasks)))
            .collect()
    }

    fn task_lists_mut(snapshot: &mut Self::Snapshot) -> Vec<&mut Vec<Task>> {
        snapshot.values_mut().collect()
    }

    fn key_issues(snapshot: &Self::Snapshot) -> Vec<SnapshotError> {
        snapshot
            .keys()
            .filter_map(|key| canonical_key_issue::<DayKey>(key))
            .collect()
    }
}
