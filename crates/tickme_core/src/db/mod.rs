//! SQLite file behind [`crate::storage::SqliteKvStore`].
//!
//! # Responsibility
//! - Open the snapshot database at a [`DbLocation`] and bring its schema up
//!   to date before any planner snapshot is read or written.
//! - Report failures with the location they happened at.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A snapshot database from a newer build is refused, never downgraded.
//! - An opened connection always has the `kv_entries` snapshot table.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Where a snapshot database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

impl DbLocation {
    /// Short form for `mode=` log fields.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

impl Display for DbLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(":memory:"),
        }
    }
}

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file's `user_version` is ahead of this build's migrations.
    SchemaTooNew {
        location: DbLocation,
        found: u32,
        supported: u32,
    },
    /// Migrations ran but the snapshot table is absent.
    MissingSnapshotTable { location: DbLocation },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaTooNew {
                location,
                found,
                supported,
            } => write!(
                f,
                "snapshot database {location} has schema version {found}; this build reads up to {supported}"
            ),
            Self::MissingSnapshotTable { location } => write!(
                f,
                "snapshot database {location} has no `{}` table",
                migrations::SNAPSHOT_TABLE
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } | Self::MissingSnapshotTable { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
