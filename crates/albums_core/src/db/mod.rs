//! SQLite storage bootstrap, connection pooling and schema migrations.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the album store.
//! - Hand out pooled connections bounded by a per-call deadline.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No pooled connection is handed out before migrations succeed.
//! - A missed deadline inside a pooled call surfaces as `DbError::Timeout`;
//!   lock conflicts while opening stay `DbError::Sqlite`.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod pool;

pub use pool::{DbPool, PoolMode, DEFAULT_POOL_SIZE};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The call deadline passed while waiting for a connection, a lock, or a
    /// running statement.
    Timeout,
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Timeout => write!(f, "storage operation timed out"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Timeout | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl DbError {
    /// Classifies an error raised inside `DbPool::with_connection`.
    ///
    /// There, interrupts come from the deadline progress handler and
    /// busy/locked means `busy_timeout` (set to the remaining budget) ran out.
    pub fn from_call_error(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::OperationInterrupted)
            | Some(ErrorCode::DatabaseBusy)
            | Some(ErrorCode::DatabaseLocked) => Self::Timeout,
            _ => Self::Sqlite(value),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
