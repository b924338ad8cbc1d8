use chrono::NaiveDate;
use tickme_core::{DayKey, KeyValueStore, MemoryStore, MonthlyStore, Priority, TaskInputError};

fn jan(day: u32) -> DayKey {
    DayKey::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap())
}

#[test]
fn month_stats_follow_add_and_toggle() {
    let storage = MemoryStore::new();
    let mut store = MonthlyStore::open(&storage);
    let key: DayKey = "2024-0-15".parse().unwrap();
    assert_eq!(key, jan(15));

    let task = store
        .add_task(&key, "Buy milk", Some(Priority::High))
        .unwrap();
    assert_eq!(task.priority, Some(Priority::High));

    let in_january = |key: &DayKey| key.in_month(2024, 0);
    let stats = store.aggregate_stats(in_january);
    assert_eq!((stats.total, stats.completed), (1, 0));

    store.toggle_task(&key, &task.id).unwrap();
    let stats = store.aggregate_stats(in_january);
    assert_eq!((stats.total, stats.completed), (1, 1));
    assert_eq!(stats.completion_percent(), 100);
    assert_eq!(stats.active_buckets, 1);

    let february = store.aggregate_stats(|key| key.in_month(2024, 1));
    assert_eq!(february.total, 0);
}

#[test]
fn priority_defaults_to_medium() {
    let storage = MemoryStore::new();
    let mut store = MonthlyStore::open(&storage);

    let task = store.add_task(&jan(3), "stand-up", None).unwrap();
    assert_eq!(task.priority, Some(Priority::Medium));
}

#[test]
fn panel_order_is_open_first_then_priority() {
    let storage = MemoryStore::new();
    let mut store = MonthlyStore::open(&storage);
    let key = jan(10);

    let low = store.add_task(&key, "low", Some(Priority::Low)).unwrap();
    let done = store.add_task(&key, "done", Some(Priority::High)).unwrap();
    let high = store.add_task(&key, "high", Some(Priority::High)).unwrap();
    store.toggle_task(&key, &done.id).unwrap();

    let ids: Vec<_> = store.list_tasks(&key).into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![high.id, low.id, done.id]);
}

#[test]
fn edit_replaces_text_and_priority_and_stamps_update() {
    let storage = MemoryStore::new();
    let mut store = MonthlyStore::open(&storage);
    let key = jan(20);
    let task = store.add_task(&key, "draft", Some(Priority::Low)).unwrap();
    assert_eq!(task.updated_at, None);

    let edited = store
        .edit_task(&key, &task.id, " final ", Some(Priority::High))
        .unwrap()
        .unwrap();
    assert_eq!(edited.text, "final");
    assert_eq!(edited.priority, Some(Priority::High));
    assert!(edited.updated_at.is_some());
    assert_eq!(edited.created_at, task.created_at);

    let kept = store
        .edit_task(&key, &task.id, "final v2", None)
        .unwrap()
        .unwrap();
    assert_eq!(kept.priority, Some(Priority::High));

    assert_eq!(
        store.edit_task(&key, &task.id, "  ", None).unwrap_err(),
        TaskInputError::EmptyText
    );
    assert_eq!(store.find_task(&key, &task.id).unwrap().text, "final v2");
}

#[test]
fn deleting_last_task_removes_day_bucket() {
    let storage = MemoryStore::new();
    let mut store = MonthlyStore::open(&storage);
    let key = jan(5);
    let a = store.add_task(&key, "a", None).unwrap();
    let b = store.add_task(&key, "b", None).unwrap();

    store.delete_task(&key, &a.id).unwrap();
    assert!(store.snapshot().contains_key("2024-0-5"));

    store.delete_task(&key, &b.id).unwrap();
    assert!(!store.snapshot().contains_key("2024-0-5"));
    assert_eq!(store.delete_task(&key, &b.id), None);

    assert_eq!(storage.get("monthlyTasks_v2").unwrap().as_deref(), Some("{}"));
}

#[test]
fn unknown_bucket_operations_are_no_ops() {
    let storage = MemoryStore::new();
    let mut store = MonthlyStore::open(&storage);

    assert!(store.list_tasks(&jan(1)).is_empty());
    assert_eq!(store.toggle_task(&jan(1), "nope"), None);
    assert_eq!(store.delete_task(&jan(1), "nope"), None);
    assert!(store.snapshot().is_empty());
}
