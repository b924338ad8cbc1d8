//! Task stores: in-memory snapshots with write-through persistence.
//!
//! # Responsibility
//! - Own every task of one granularity and its CRUD operations.
//! - Round-trip the whole snapshot through a [`KeyValueStore`].
//! - Notify subscribers after each persisted mutation.
//!
//! # Invariants
//! - Loading never fails: missing data or unparseable JSON loads as the
//!   empty container. Individual bad tasks are repaired or dropped and
//!   logged; their valid siblings load normally.
//! - Every mutation is followed by one full-snapshot write. A failed write is
//!   logged and the in-memory snapshot stays authoritative for the session.
//! - Operations on unknown ids or buckets change nothing and report `None`.
//! - Input text is trimmed; blank input is rejected before any state change.

use crate::model::task::{normalize_text, Priority, Task, TaskId};
use crate::storage::KeyValueStore;
use chrono::Utc;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::time::Instant;

pub mod granularity;
pub mod ordering;

pub use granularity::{repair_snapshot, Daily, Granularity, Monthly, SnapshotError, Weekly};
pub use ordering::DisplayOrder;

pub type DailyStore<S> = TaskStore<Daily, S>;
pub type WeeklyStore<S> = TaskStore<Weekly, S>;
pub type MonthlyStore<S> = TaskStore<Monthly, S>;

/// Rejected user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskInputError {
    /// Text was empty after trimming.
    EmptyText,
}

impl Display for TaskInputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text cannot be empty"),
        }
    }
}

impl Error for TaskInputError {}

/// Change notification delivered after the snapshot was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added { id: TaskId },
    Toggled { id: TaskId, completed: bool },
    Edited { id: TaskId },
    Deleted { id: TaskId },
    Cleared,
    Reloaded,
}

/// Task totals over a set of buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    /// Buckets holding at least one task.
    pub active_buckets: usize,
}

impl TaskStats {
    pub fn pending(&self) -> usize {
        self.total - self.completed
    }

    /// Completion as a whole percentage, rounded half up; 0 when empty.
    pub fn completion_percent(&self) -> u32 {
        percent(self.completed, self.total)
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            completed: self.completed + other.completed,
            active_buckets: self.active_buckets + other.active_buckets,
        }
    }
}

pub(crate) fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// All tasks of one granularity, persisted under one storage key.
pub struct TaskStore<G: Granularity, S: KeyValueStore> {
    storage: S,
    storage_key: String,
    snapshot: G::Snapshot,
    listeners: Vec<Listener>,
    _granularity: PhantomData<G>,
}

impl<G: Granularity, S: KeyValueStore> TaskStore<G, S> {
    /// Opens the store under the granularity's default storage key.
    pub fn open(storage: S) -> Self {
        Self::open_with_key(storage, G::DEFAULT_STORAGE_KEY)
    }

    /// Opens the store and loads its snapshot from `storage_key`.
    pub fn open_with_key(storage: S, storage_key: impl Into<String>) -> Self {
        let mut store = Self {
            storage,
            storage_key: storage_key.into(),
            snapshot: G::Snapshot::default(),
            listeners: Vec::new(),
            _granularity: PhantomData,
        };
        store.snapshot = store.load();
        store
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read-only view of the whole in-memory state.
    pub fn snapshot(&self) -> &G::Snapshot {
        &self.snapshot
    }

    /// Reads the persisted snapshot without touching in-memory state.
    ///
    /// Never fails: absent data yields the empty container; backend errors
    /// and unparseable JSON are logged and yield it too. Content issues are
    /// handled per task (see [`granularity::repair_snapshot`]).
    pub fn load(&self) -> G::Snapshot {
        let started_at = Instant::now();
        let raw = match self.storage.get(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!(
                    "event=store_load module=store status=ok granularity={} key={} tasks=0 source=default",
                    G::NAME,
                    self.storage_key
                );
                return G::Snapshot::default();
            }
            Err(err) => {
                error!(
                    "event=store_load module=store status=error granularity={} key={} error_code=storage_read_failed error={}",
                    G::NAME,
                    self.storage_key,
                    err
                );
                return G::Snapshot::default();
            }
        };

        match serde_json::from_str::<G::Snapshot>(&raw) {
            Ok(mut snapshot) => {
                for issue in repair_snapshot::<G>(&mut snapshot) {
                    warn!(
                        "event=snapshot_repair module=store status=ok granularity={} key={} issue={} detail={}",
                        G::NAME,
                        self.storage_key,
                        issue.code(),
                        issue
                    );
                }
                info!(
                    "event=store_load module=store status=ok granularity={} key={} tasks={} duration_ms={}",
                    G::NAME,
                    self.storage_key,
                    G::task_count(&snapshot),
                    started_at.elapsed().as_millis()
                );
                snapshot
            }
            Err(err) => {
                let err = SnapshotError::from(err);
                error!(
                    "event=store_load module=store status=error granularity={} key={} error_code={} error={}",
                    G::NAME,
                    self.storage_key,
                    err.code(),
                    err
                );
                G::Snapshot::default()
            }
        }
    }

    /// Serializes `snapshot` and writes it under the store key.
    ///
    /// Returns whether the write landed. Failures are logged, never raised,
    /// and nothing is rolled back.
    pub fn save(&self, snapshot: &G::Snapshot) -> bool {
        let payload = match serde_json::to_string(snapshot) {
            Ok(payload) => payload,
            Err(err) => {
                error!(
                    "event=store_save module=store status=error granularity={} key={} error_code=serialize_failed error={}",
                    G::NAME,
                    self.storage_key,
                    err
                );
                return false;
            }
        };

        match self.storage.set(&self.storage_key, &payload) {
            Ok(()) => {
                debug!(
                    "event=store_save module=store status=ok granularity={} key={} bytes={}",
                    G::NAME,
                    self.storage_key,
                    payload.len()
                );
                true
            }
            Err(err) => {
                error!(
                    "event=store_save module=store status=error granularity={} key={} error_code=storage_write_failed error={}",
                    G::NAME,
                    self.storage_key,
                    err
                );
                false
            }
        }
    }

    /// Replaces in-memory state with the persisted snapshot.
    pub fn reload(&mut self) {
        self.snapshot = self.load();
        self.notify(&StoreEvent::Reloaded);
    }

    /// Registers a callback run after every persisted mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Creates a task in `key`'s bucket, creating the bucket if needed.
    ///
    /// `priority` is only kept by granularities that support it, where it
    /// defaults to medium.
    pub fn add_task(
        &mut self,
        key: &G::Key,
        text: &str,
        priority: Option<Priority>,
    ) -> Result<Task, TaskInputError> {
        let Some(text) = normalize_text(text) else {
            debug!(
                "event=task_add module=store status=skip granularity={} reason=empty_text",
                G::NAME
            );
            return Err(TaskInputError::EmptyText);
        };

        let priority = G::SUPPORTS_PRIORITY.then(|| priority.unwrap_or_default());
        let task = Task::new(text, priority, Utc::now());
        G::insert_task(G::bucket_or_insert(&mut self.snapshot, key), task.clone());

        info!(
            "event=task_add module=store status=ok granularity={} task_id={}",
            G::NAME,
            task.id
        );
        self.commit(StoreEvent::Added {
            id: task.id.clone(),
        });
        Ok(task)
    }

    /// Flips completion of one task. Returns the updated task, or `None`
    /// when the id is not in the bucket.
    pub fn toggle_task(&mut self, key: &G::Key, id: &str) -> Option<Task> {
        let Some(task) = find_task_mut::<G>(&mut self.snapshot, key, id) else {
            debug!(
                "event=task_toggle module=store status=skip granularity={} task_id={} reason=not_found",
                G::NAME,
                id
            );
            return None;
        };
        let completed = task.toggle(Utc::now());
        let updated = task.clone();

        info!(
            "event=task_toggle module=store status=ok granularity={} task_id={} completed={}",
            G::NAME,
            id,
            completed
        );
        self.commit(StoreEvent::Toggled {
            id: updated.id.clone(),
            completed,
        });
        Some(updated)
    }

    /// Replaces text (and priority where supported) and stamps `updated_at`.
    ///
    /// Blank text is rejected first; `Ok(None)` means the id was not found.
    /// A `None` priority keeps the current one.
    pub fn edit_task(
        &mut self,
        key: &G::Key,
        id: &str,
        new_text: &str,
        new_priority: Option<Priority>,
    ) -> Result<Option<Task>, TaskInputError> {
        let Some(text) = normalize_text(new_text) else {
            debug!(
                "event=task_edit module=store status=skip granularity={} task_id={} reason=empty_text",
                G::NAME,
                id
            );
            return Err(TaskInputError::EmptyText);
        };
        let priority = new_priority.filter(|_| G::SUPPORTS_PRIORITY);

        let Some(task) = find_task_mut::<G>(&mut self.snapshot, key, id) else {
            debug!(
                "event=task_edit module=store status=skip granularity={} task_id={} reason=not_found",
                G::NAME,
                id
            );
            return Ok(None);
        };
        task.apply_edit(text, priority, Utc::now());
        let updated = task.clone();

        info!(
            "event=task_edit module=store status=ok granularity={} task_id={}",
            G::NAME,
            id
        );
        self.commit(StoreEvent::Edited {
            id: updated.id.clone(),
        });
        Ok(Some(updated))
    }

    /// Removes one task and returns it.
    ///
    /// Granularities that prune drop the bucket once it is empty. The
    /// snapshot is written whether or not anything was removed.
    pub fn delete_task(&mut self, key: &G::Key, id: &str) -> Option<Task> {
        let removed = G::bucket_mut(&mut self.snapshot, key).and_then(|bucket| {
            let index = bucket.iter().position(|task| task.id == id)?;
            Some(bucket.remove(index))
        });

        if G::PRUNES_EMPTY_BUCKETS
            && G::bucket(&self.snapshot, key).is_some_and(|bucket| bucket.is_empty())
        {
            G::remove_bucket(&mut self.snapshot, key);
        }

        match &removed {
            Some(task) => {
                info!(
                    "event=task_delete module=store status=ok granularity={} task_id={}",
                    G::NAME,
                    task.id
                );
                self.commit(StoreEvent::Deleted {
                    id: task.id.clone(),
                });
            }
            None => {
                debug!(
                    "event=task_delete module=store status=skip granularity={} task_id={} reason=not_found",
                    G::NAME,
                    id
                );
                self.persist();
            }
        }
        removed
    }

    /// Bucket contents in display order; empty when the bucket is absent.
    pub fn list_tasks(&self, key: &G::Key) -> Vec<Task> {
        G::bucket(&self.snapshot, key)
            .map(|tasks| G::DISPLAY_ORDER.sorted(tasks))
            .unwrap_or_default()
    }

    pub fn find_task(&self, key: &G::Key, id: &str) -> Option<&Task> {
        G::bucket(&self.snapshot, key)?
            .iter()
            .find(|task| task.id == id)
    }

    /// Existence check for delayed presentation effects.
    pub fn contains_task(&self, key: &G::Key, id: &str) -> bool {
        self.find_task(key, id).is_some()
    }

    /// Totals over buckets whose key satisfies `predicate`.
    pub fn aggregate_stats(&self, predicate: impl Fn(&G::Key) -> bool) -> TaskStats {
        G::buckets(&self.snapshot)
            .into_iter()
            .filter(|(key, _)| predicate(key))
            .fold(TaskStats::default(), |stats, (_, tasks)| {
                stats.merge(TaskStats {
                    total: tasks.len(),
                    completed: tasks.iter().filter(|task| task.completed).count(),
                    active_buckets: usize::from(!tasks.is_empty()),
                })
            })
    }

    /// Totals over the whole store.
    pub fn stats(&self) -> TaskStats {
        self.aggregate_stats(|_| true)
    }

    pub fn is_empty(&self) -> bool {
        G::task_count(&self.snapshot) == 0
    }

    /// Deletes the persisted snapshot and empties the store.
    pub fn clear(&mut self) {
        match self.storage.remove(&self.storage_key) {
            Ok(()) => info!(
                "event=store_clear module=store status=ok granularity={} key={}",
                G::NAME,
                self.storage_key
            ),
            Err(err) => warn!(
                "event=store_clear module=store status=error granularity={} key={} error={}",
                G::NAME,
                self.storage_key,
                err
            ),
        }
        self.snapshot = G::Snapshot::default();
        self.notify(&StoreEvent::Cleared);
    }

    fn persist(&self) -> bool {
        self.save(&self.snapshot)
    }

    fn commit(&mut self, event: StoreEvent) {
        self.persist();
        self.notify(&event);
    }

    fn notify(&mut self, event: &StoreEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl<S: KeyValueStore> TaskStore<Daily, S> {
    /// Daily list in display order (newest first).
    pub fn tasks(&self) -> Vec<Task> {
        self.list_tasks(&())
    }

    pub fn add(&mut self, text: &str) -> Result<Task, TaskInputError> {
        self.add_task(&(), text, None)
    }

    pub fn toggle(&mut self, id: &str) -> Option<Task> {
        self.toggle_task(&(), id)
    }

    pub fn delete(&mut self, id: &str) -> Option<Task> {
        self.delete_task(&(), id)
    }
}

fn find_task_mut<'s, G: Granularity>(
    snapshot: &'s mut G::Snapshot,
    key: &G::Key,
    id: &str,
) -> Option<&'s mut Task> {
    G::bucket_mut(snapshot, key)?
        .iter_mut()
        .find(|task| task.id == id)
}

#[cfg(test)]
mod tests {
    use super::{percent, TaskStats};

    #[test]
    fn percent_rounds_half_up_and_handles_empty() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(2, 3), 67);
    }

    #[test]
    fn stats_merge_sums_fields() {
        let a = TaskStats {
            total: 2,
            completed: 1,
            active_buckets: 1,
        };
        let merged = a.merge(a);
        assert_eq!(merged.total, 4);
        assert_eq!(merged.pending(), 2);
        assert_eq!(merged.completion_percent(), 50);
    }
}
