//! Core task-store and date-bucketing logic for the TickMe planners.
//! This crate is the single source of truth for task invariants; rendering
//! layers read its data and forward user actions back into it.

pub mod calendar;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;

pub use calendar::{
    calendar_grid, navigate_month, navigate_week, today_local, week_key, week_start,
    CalendarCell, DateKeyError, DayKey, MonthCursor, WeekCursor, WeekKey, WeekdayBucket,
    GRID_CELLS,
};
pub use config::{ConfigError, CoreConfig, StorageKeys};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Priority, Task, TaskId, TaskValidationError};
pub use service::overview::{backup_file_name, ExportDocument, PlannerKind, UserStats};
pub use service::planner::{Planner, PlannerError};
pub use storage::{KeyValueStore, MemoryStore, SqliteKvStore, StorageError};
pub use store::{
    DailyStore, MonthlyStore, SnapshotError, StoreEvent, TaskInputError, TaskStats, TaskStore,
    WeeklyStore,
};

/// Minimal health-check API for embedding layers.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
