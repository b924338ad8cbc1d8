use chrono::{NaiveDate, Weekday};
use tickme_core::calendar::weekly::week_days;
use tickme_core::{KeyValueStore, MemoryStore, WeekCursor, WeekdayBucket, WeeklyStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn tasks_land_in_week_and_day_buckets() {
    let storage = MemoryStore::new();
    let mut store = WeeklyStore::open(&storage);
    let cursor = WeekCursor::new(date(2024, 1, 17));

    let task = store
        .add_task(&cursor.bucket(Weekday::Wed), "gym", None)
        .unwrap();

    assert_eq!(store.list_tasks(&cursor.bucket(Weekday::Wed)), vec![task]);
    assert!(store.list_tasks(&cursor.bucket(Weekday::Thu)).is_empty());

    let raw: serde_json::Value =
        serde_json::from_str(&storage.get("weeklyTasks_v2").unwrap().unwrap()).unwrap();
    assert_eq!(raw["2024-W3-0"]["wednesday"][0]["text"], "gym");
}

#[test]
fn every_day_of_a_week_shares_the_week_key() {
    let cursor = WeekCursor::new(date(2024, 1, 21));
    let keys: Vec<_> = week_days(cursor.start())
        .into_iter()
        .map(|day| WeekdayBucket::for_date(day).week)
        .collect();

    assert!(keys.iter().all(|key| *key == cursor.key()));
    assert_eq!(cursor.key().to_string(), "2024-W3-0");
}

#[test]
fn day_lists_are_oldest_first() {
    let storage = MemoryStore::new();
    let mut store = WeeklyStore::open(&storage);
    let bucket = WeekdayBucket::for_date(date(2024, 1, 15));

    let first = store.add_task(&bucket, "first", None).unwrap();
    let second = store.add_task(&bucket, "second", None).unwrap();

    let ids: Vec<_> = store.list_tasks(&bucket).into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn emptied_day_buckets_are_kept() {
    let storage = MemoryStore::new();
    let mut store = WeeklyStore::open(&storage);
    let bucket = WeekdayBucket::for_date(date(2024, 1, 15));
    let task = store.add_task(&bucket, "review", None).unwrap();

    store.delete_task(&bucket, &task.id).unwrap();

    let days = store.snapshot().get("2024-W3-0").unwrap();
    assert_eq!(days.get("monday"), Some(&Vec::new()));
}

#[test]
fn toggle_and_edit_on_wrong_day_are_not_found() {
    let storage = MemoryStore::new();
    let mut store = WeeklyStore::open(&storage);
    let cursor = WeekCursor::new(date(2024, 1, 15));
    let task = store
        .add_task(&cursor.bucket(Weekday::Mon), "plan", None)
        .unwrap();

    assert_eq!(store.toggle_task(&cursor.bucket(Weekday::Tue), &task.id), None);
    assert_eq!(
        store
            .edit_task(&cursor.bucket(Weekday::Tue), &task.id, "replan", None)
            .unwrap(),
        None
    );
    assert!(store
        .toggle_task(&cursor.bucket(Weekday::Mon), &task.id)
        .unwrap()
        .completed);
}

#[test]
fn stats_filter_by_week() {
    let storage = MemoryStore::new();
    let mut store = WeeklyStore::open(&storage);
    let mut cursor = WeekCursor::new(date(2024, 1, 15));
    store.add_task(&cursor.bucket(Weekday::Mon), "a", None).unwrap();
    store.add_task(&cursor.bucket(Weekday::Fri), "b", None).unwrap();
    cursor.next();
    let next_week = store.add_task(&cursor.bucket(Weekday::Mon), "c", None).unwrap();
    store.toggle_task(&cursor.bucket(Weekday::Mon), &next_week.id);

    let this_week = cursor.key();
    let stats = store.aggregate_stats(|bucket| bucket.week == this_week);
    assert_eq!((stats.total, stats.completed), (1, 1));
    assert_eq!(store.stats().total, 3);
    assert_eq!(store.stats().active_buckets, 3);
}
