//! SQLite storage bootstrap, schema migrations and the query executor.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the blog core.
//! - Apply schema migrations in deterministic order.
//! - Expose one executor capability shared by connections and transactions.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Executor errors are returned uninterpreted; classification happens in
//!   [`crate::error`].

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod context;
pub mod executor;
pub mod migrations;
mod open;

pub use context::{CancelHandle, ExecContext};
pub use executor::{fetch_all, fetch_one, fetch_optional, ExecOutcome, Queryable};
pub use open::{open_db, open_db_in_memory, open_store};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The caller's context was canceled before the store replied.
    Canceled,
    /// The caller's deadline passed before the store replied.
    DeadlineExceeded,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Canceled => write!(f, "operation canceled by caller"),
            Self::DeadlineExceeded => write!(f, "operation deadline exceeded"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::Canceled | Self::DeadlineExceeded => {
                None
            }
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
