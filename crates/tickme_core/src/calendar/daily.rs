//! Daily view helpers. The daily store has no bucketing, so only display
//! formatting lives here.

use super::monthly::day_label;
use chrono::{DateTime, Local, NaiveDate, Utc};

/// Header label for the daily list, e.g. `Monday, January 15, 2024`.
pub fn header_label(today: NaiveDate) -> String {
    day_label(today)
}

/// Relative age of a task: `just now`, `5m ago`, `3h ago`, `yesterday`,
/// `4d ago`, then a plain `M/D/YYYY` date after a week.
///
/// Future timestamps (clock skew) read as `just now`.
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    if hours < 24 {
        return format!("{hours}h ago");
    }
    if days == 1 {
        return "yesterday".to_string();
    }
    if days < 7 {
        return format!("{days}d ago");
    }

    created_at
        .with_timezone(&Local)
        .date_naive()
        .format("%-m/%-d/%Y")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::time_ago;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn buckets_elapsed_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(time_ago(now - Duration::seconds(30), now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3h ago");
        assert_eq!(time_ago(now - Duration::hours(30), now), "yesterday");
        assert_eq!(time_ago(now - Duration::days(4), now), "4d ago");
        assert_eq!(time_ago(now + Duration::minutes(2), now), "just now");
    }

    #[test]
    fn falls_back_to_date_after_a_week() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let label = time_ago(now - Duration::days(10), now);
        assert!(label.ends_with("/2024"), "unexpected label {label}");
    }
}
