//! Opening snapshot databases.

use super::migrations::apply_migrations;
use super::{DbError, DbLocation, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) the snapshot database file at `path`.
///
/// # Side effects
/// - Emits `db_open` events with mode, migration count and duration.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_at(DbLocation::File(path.to_path_buf()), || Connection::open(path))
}

/// Opens a private in-memory snapshot database, gone when dropped.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_at(DbLocation::Memory, Connection::open_in_memory)
}

fn open_at(
    location: DbLocation,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={}", location.mode());

    let opened: DbResult<(Connection, usize)> =
        connect().map_err(DbError::from).and_then(|mut conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            let applied = apply_migrations(&mut conn, &location)?;
            Ok((conn, applied))
        });

    match opened {
        Ok((conn, applied)) => {
            info!(
                "event=db_open module=db status=ok mode={} migrations_applied={} duration_ms={}",
                location.mode(),
                applied,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error={}",
                location.mode(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}
