//! Schema steps for the snapshot database.
//!
//! Each step is a SQL script tagged with the `user_version` it produces.
//! Steps newer than the stored version run together in one transaction.

use crate::db::{DbError, DbLocation, DbResult};
use log::info;
use rusqlite::{Connection, OptionalExtension};

/// Table holding one JSON snapshot per storage key.
pub const SNAPSHOT_TABLE: &str = "kv_entries";

/// `(user_version, name, script)` in ascending version order.
const STEPS: &[(u32, &str, &str)] = &[(1, "kv_entries", include_str!("0001_kv_entries.sql"))];

/// Highest `user_version` this build can produce.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(version, _, _)| *version)
}

/// Brings the database at `location` up to [`latest_version`].
///
/// Returns how many steps ran; zero when the schema was current.
pub fn apply_migrations(conn: &mut Connection, location: &DbLocation) -> DbResult<usize> {
    let found = stored_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew {
            location: location.clone(),
            found,
            supported,
        });
    }

    let pending: Vec<_> = STEPS
        .iter()
        .filter(|(version, _, _)| *version > found)
        .collect();
    if !pending.is_empty() {
        let tx = conn.transaction()?;
        for (version, name, script) in &pending {
            tx.execute_batch(script)?;
            tx.pragma_update(None, "user_version", version)?;
            info!(
                "event=db_migrate module=db status=ok mode={} step={} version={}",
                location.mode(),
                name,
                version
            );
        }
        tx.commit()?;
    }

    if !snapshot_table_exists(conn)? {
        return Err(DbError::MissingSnapshotTable {
            location: location.clone(),
        });
    }
    Ok(pending.len())
}

fn stored_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

fn snapshot_table_exists(conn: &Connection) -> DbResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [SNAPSHOT_TABLE],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}
