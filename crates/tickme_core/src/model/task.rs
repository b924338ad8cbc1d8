//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by daily/weekly/monthly stores.
//! - Own completion transitions so `completed` and `completed_at` never drift.
//!
//! # Invariants
//! - `id` is generated once and never reused for another task.
//! - `text` is trimmed and non-empty.
//! - `completed == true` iff `completed_at` is set.
//! - `created_at` is set once at construction.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable task identifier.
///
/// Kept as a string so ids written by older planner builds (which were not
/// UUIDs) still load and stay usable as map keys.
pub type TaskId = String;

/// Generates a fresh collision-resistant task id.
pub fn new_task_id() -> TaskId {
    Uuid::new_v4().to_string()
}

/// Task urgency. Only the monthly planner records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Sort rank used by the monthly view: high first.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unsupported priority `{other}`")),
        }
    }
}

/// Validation failures for persisted or constructed tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyId,
    EmptyText { id: TaskId },
    CompletionMismatch { id: TaskId },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "task id cannot be empty"),
            Self::EmptyText { id } => write!(f, "task {id} has empty text"),
            Self::CompletionMismatch { id } => write!(
                f,
                "task {id} has inconsistent completed/completedAt state"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// One to-do entry.
///
/// Serialized with camelCase field names and millisecond RFC 3339
/// timestamps, so stored JSON reads back exactly as the browser planners
/// wrote it. A `completedAt` key that was absent on load stays absent on
/// save until the task is toggled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub priority: Option<Priority>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    omit_completed_at: bool,
}

impl Task {
    /// Creates an open task with a generated id.
    ///
    /// `text` is stored as given; callers normalize it first with
    /// [`normalize_text`].
    pub fn new(text: impl Into<String>, priority: Option<Priority>, now: DateTime<Utc>) -> Self {
        Self::with_id(new_task_id(), text, priority, now)
    }

    /// Creates an open task with a caller-provided id (import paths).
    pub fn with_id(
        id: impl Into<TaskId>,
        text: impl Into<String>,
        priority: Option<Priority>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
            priority,
            created_at: stamp(now),
            completed_at: None,
            updated_at: None,
            omit_completed_at: false,
        }
    }

    /// Sets completion state and stamps or clears `completed_at`.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        self.completed = completed;
        self.completed_at = completed.then(|| stamp(now));
        self.omit_completed_at = false;
    }

    /// Flips completion state. Returns the new value.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> bool {
        self.set_completed(!self.completed, now);
        self.completed
    }

    /// Replaces text (and optionally priority) and stamps `updated_at`.
    pub fn apply_edit(&mut self, text: String, priority: Option<Priority>, now: DateTime<Utc>) {
        self.text = text;
        if priority.is_some() {
            self.priority = priority;
        }
        self.updated_at = Some(stamp(now));
    }

    /// Effective priority for ordering; tasks without one rank as medium.
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.trim().is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        if self.text.trim().is_empty() {
            return Err(TaskValidationError::EmptyText {
                id: self.id.clone(),
            });
        }
        if self.completed != self.completed_at.is_some() {
            return Err(TaskValidationError::CompletionMismatch {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Brings `completed_at` in line with `completed`.
    ///
    /// A completed task without a timestamp is stamped with `created_at`; an
    /// open task loses its stale timestamp. Returns the mismatch that was
    /// fixed, if any.
    pub fn repair_completion(&mut self) -> Option<TaskValidationError> {
        if self.completed == self.completed_at.is_some() {
            return None;
        }
        self.completed_at = self.completed.then_some(self.created_at);
        self.omit_completed_at = false;
        Some(TaskValidationError::CompletionMismatch {
            id: self.id.clone(),
        })
    }
}

/// Timestamps keep millisecond precision, the resolution stored JSON has.
fn stamp(now: DateTime<Utc>) -> DateTime<Utc> {
    now.trunc_subsecs(3)
}

/// Wire shape of [`Task`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(with = "iso_millis")]
    created_at: DateTime<Utc>,
    /// Outer `None`: key absent. `Some(None)`: explicit `null`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_millis::nullable_field"
    )]
    completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_millis::optional"
    )]
    updated_at: Option<DateTime<Utc>>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            text: record.text,
            completed: record.completed,
            priority: record.priority,
            created_at: record.created_at,
            omit_completed_at: record.completed_at.is_none(),
            completed_at: record.completed_at.flatten(),
            updated_at: record.updated_at,
        }
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        let completed_at = if task.omit_completed_at && task.completed_at.is_none() {
            None
        } else {
            Some(task.completed_at)
        };
        Self {
            id: task.id,
            text: task.text,
            completed: task.completed,
            priority: task.priority,
            created_at: task.created_at,
            completed_at,
            updated_at: task.updated_at,
        }
    }
}

/// `toISOString`-style timestamps: `2024-01-15T10:00:00.000Z`.
pub(crate) mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }

    pub mod optional {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value.as_ref().map(format).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<DateTime<Utc>>::deserialize(deserializer)
        }
    }

    /// A key that may be absent, `null`, or a timestamp.
    pub mod nullable_field {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<Option<DateTime<Utc>>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            (*value).flatten().as_ref().map(format).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Option<DateTime<Utc>>>, D::Error> {
            Option::<DateTime<Utc>>::deserialize(deserializer).map(Some)
        }
    }
}

/// Trims user input; returns `None` when nothing is left.
pub fn normalize_text(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_text, Priority, Task, TaskValidationError};
    use chrono::{TimeZone, Utc};

    #[test]
    fn toggle_keeps_completed_and_timestamp_in_step() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let mut task = Task::new("write report", None, now);
        assert!(task.toggle(now));
        assert_eq!(task.completed_at, Some(now));
        assert!(!task.toggle(now));
        assert_eq!(task.completed_at, None);
        task.validate().unwrap();
    }

    #[test]
    fn validate_rejects_mismatched_completion() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let mut task = Task::with_id("abc", "x", None, now);
        task.completed = true;
        assert_eq!(
            task.validate(),
            Err(TaskValidationError::CompletionMismatch {
                id: "abc".to_string()
            })
        );
    }

    #[test]
    fn normalize_text_trims_and_rejects_blank() {
        assert_eq!(normalize_text("  milk \n").as_deref(), Some("milk"));
        assert_eq!(normalize_text(" \t "), None);
    }

    #[test]
    fn priority_parses_and_ranks() {
        assert_eq!(" HIGH ".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn deserializes_browser_payload() {
        let json = r#"{"id":"lq1x9k2abc","text":"Buy milk","completed":false,
            "priority":"high","createdAt":"2024-01-15T10:00:00.000Z","completedAt":null}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, "lq1x9k2abc");
        assert_eq!(task.priority, Some(Priority::High));
        assert!(task.completed_at.is_none());
        assert!(task.updated_at.is_none());
    }

    #[test]
    fn absent_completed_at_stays_absent_until_toggled() {
        let json = r#"{"id":"w1","text":"gym","completed":false,"createdAt":"2024-01-17T10:00:00.000Z"}"#;
        let mut task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&task).unwrap(), json);

        let now = Utc.with_ymd_and_hms(2024, 1, 17, 11, 0, 0).unwrap();
        task.toggle(now);
        task.toggle(now);
        let value = serde_json::to_value(&task).unwrap();
        assert!(value["completedAt"].is_null());
        assert!(value.as_object().unwrap().contains_key("completedAt"));
    }

    #[test]
    fn timestamps_serialize_with_milliseconds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let task = Task::with_id("t", "x", None, now);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["createdAt"], "2024-01-15T09:00:00.123Z");
        assert_eq!(value["completedAt"], serde_json::Value::Null);

        let back: Task = serde_json::from_value(value).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn repair_completion_stamps_or_clears_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let mut done = Task::with_id("a", "x", None, now);
        done.completed = true;
        assert!(done.repair_completion().is_some());
        assert_eq!(done.completed_at, Some(now));
        assert_eq!(done.repair_completion(), None);

        let mut open = Task::with_id("b", "y", None, now);
        open.completed_at = Some(now);
        assert!(open.repair_completion().is_some());
        assert_eq!(open.completed_at, None);
        open.validate().unwrap();
    }
}
