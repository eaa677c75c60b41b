//! Project-record storage on SQLite.
//!
//! # Responsibility
//! - Hand out connections whose schema matches this binary.
//! - Report where an open connection stands against the migration list.
//!
//! # Invariants
//! - `PRAGMA user_version` is the only record of the applied schema.
//! - Project rows are neither read nor written before migrations succeed.
//! - Evaluation results are never written back here.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::{current_user_version, latest_version};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A migration step failed and every pending step was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The file was migrated by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Value of the `error_code=` log field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_sqlite",
            Self::Migration { .. } => "db_migration_failed",
            Self::UnsupportedSchemaVersion { .. } => "db_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "migration {version:04}_{name} failed: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "project store uses schema {db_version}; this build reads up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Applied versus known schema version of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatus {
    pub version: u32,
    pub latest: u32,
}

impl SchemaStatus {
    pub fn is_current(self) -> bool {
        self.version == self.latest
    }

    pub fn is_newer(self) -> bool {
        self.version > self.latest
    }

    /// Migrations still to apply; zero for current or newer files.
    pub fn pending(self) -> u32 {
        self.latest.saturating_sub(self.version)
    }
}

pub fn schema_status(conn: &Connection) -> DbResult<SchemaStatus> {
    Ok(SchemaStatus {
        version: current_user_version(conn)?,
        latest: latest_version(),
    })
}

#[cfg(test)]
mod tests {
    use super::{open_db_in_memory, schema_status, DbError, SchemaStatus};
    use rusqlite::Connection;
    use std::error::Error;

    #[test]
    fn blank_connection_has_every_migration_pending() {
        let conn = Connection::open_in_memory().unwrap();
        let status = schema_status(&conn).unwrap();
        assert_eq!(status.version, 0);
        assert_eq!(status.pending(), status.latest);
        assert!(!status.is_current());
    }

    #[test]
    fn opened_connection_is_current() {
        let conn = open_db_in_memory().unwrap();
        let status = schema_status(&conn).unwrap();
        assert!(status.is_current());
        assert_eq!(status.pending(), 0);
    }

    #[test]
    fn newer_file_has_nothing_pending() {
        let status = SchemaStatus {
            version: 9,
            latest: 2,
        };
        assert!(status.is_newer());
        assert_eq!(status.pending(), 0);
    }

    #[test]
    fn migration_error_names_the_step_and_keeps_source() {
        let err = DbError::Migration {
            version: 2,
            name: "project_indexes",
            source: rusqlite::Error::InvalidQuery,
        };
        assert_eq!(err.code(), "db_migration_failed");
        assert!(err.to_string().starts_with("migration 0002_project_indexes failed"));
        assert!(err.source().is_some());
    }
}
