//! Display ordering of bucket contents.
//!
//! Ordering is recomputed from task fields on every read; no order index is
//! ever persisted.

use crate::model::task::Task;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOrder {
    /// `created_at` descending (daily list).
    NewestFirst,
    /// `created_at` ascending (weekly day cards).
    OldestFirst,
    /// Open before completed, then priority rank, then `created_at` ascending
    /// (monthly day panel).
    CompletionThenPriority,
}

impl DisplayOrder {
    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::NewestFirst => b.created_at.cmp(&a.created_at),
            Self::OldestFirst => a.created_at.cmp(&b.created_at),
            Self::CompletionThenPriority => a
                .completed
                .cmp(&b.completed)
                .then_with(|| {
                    a.effective_priority()
                        .rank()
                        .cmp(&b.effective_priority().rank())
                })
                .then_with(|| a.created_at.cmp(&b.created_at)),
        }
    }

    /// Returns a sorted copy; ties keep stored order.
    pub fn sorted(self, tasks: &[Task]) -> Vec<Task> {
        let mut sorted = tasks.to_vec();
        sorted.sort_by(|a, b| self.compare(a, b));
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::DisplayOrder;
    use crate::model::task::{Priority, Task};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn monthly_order_puts_open_high_priority_first() {
        let base = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let low = Task::with_id("low", "low", Some(Priority::Low), base);
        let high = Task::with_id("high", "high", Some(Priority::High), base + Duration::hours(1));
        let mut done = Task::with_id("done", "done", Some(Priority::High), base);
        done.set_completed(true, base);
        let medium_late =
            Task::with_id("mid", "mid", Some(Priority::Medium), base + Duration::hours(2));

        let sorted = DisplayOrder::CompletionThenPriority
            .sorted(&[done, low, medium_late, high]);
        let ids: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["high", "mid", "low", "done"]);
    }

    #[test]
    fn newest_first_reverses_creation_order() {
        let base = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let first = Task::with_id("a", "a", None, base);
        let second = Task::with_id("b", "b", None, base + Duration::minutes(1));
        let sorted = DisplayOrder::NewestFirst.sorted(&[first.clone(), second.clone()]);
        assert_eq!(sorted, vec![second.clone(), first.clone()]);
        let sorted = DisplayOrder::OldestFirst.sorted(&[second.clone(), first.clone()]);
        assert_eq!(sorted, vec![first, second]);
    }
}
