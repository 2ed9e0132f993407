//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for posts, tags and
//!   categories.
//! - Isolate SQLite query details from service orchestration.
//! - Bundle every repository into one [`Repository`] set bound to a single
//!   executor, so the same set works on a connection or a transaction.
//!
//! # Invariants
//! - Read paths exclude soft-deleted rows.
//! - Repository APIs return semantic errors (`NotFound`, `RowsNotAffected`)
//!   next to raw store errors; user-facing classification lives in
//!   [`crate::error`].

use crate::db::{DbError, Queryable};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod bridge;
pub mod category_repo;
pub mod filter;
mod hydrate;
pub mod post_repo;
pub mod tag_repo;
mod taxonomy;
pub mod unit_of_work;

pub use category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use post_repo::{PostRepository, SqlitePostRepository};
pub use tag_repo::{SqliteTagRepository, TagRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// No active row matched the targeted id or query.
    NotFound {
        entity: &'static str,
        id: Option<i64>,
    },
    /// A write targeted a specific row but changed nothing.
    RowsNotAffected {
        entity: &'static str,
        id: i64,
    },
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
    /// A unit of work was requested on an executor that already is a
    /// transaction.
    NestedTransaction,
    /// Work failed and the rollback failed too.
    Rollback {
        source: Box<RepoError>,
        rollback: DbError,
    },
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound {
            entity,
            id: Some(id),
        }
    }

    /// Returns the failure that triggered a rollback, or `self`.
    pub fn root(&self) -> &RepoError {
        match self {
            Self::Rollback { source, .. } => source.root(),
            other => other,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound {
                entity,
                id: Some(id),
            } => write!(f, "{entity} not found: {id}"),
            Self::NotFound { entity, id: None } => write!(f, "no {entity} rows matched"),
            Self::RowsNotAffected { entity, id } => {
                write!(f, "{entity} {id}: no rows affected")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::NestedTransaction => {
                write!(f, "unit of work requires a connection, got a transaction")
            }
            Self::Rollback { source, rollback } => {
                write!(f, "tx err: {source}, rb err: {rollback}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Rollback { source, .. } => Some(source.as_ref()),
            Self::NotFound { .. }
            | Self::RowsNotAffected { .. }
            | Self::InvalidData(_)
            | Self::NestedTransaction => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Every repository, bound to one executor.
pub struct Repository<'q> {
    pub posts: SqlitePostRepository<'q>,
    pub tags: SqliteTagRepository<'q>,
    pub categories: SqliteCategoryRepository<'q>,
    db: &'q dyn Queryable,
}

impl<'q> Repository<'q> {
    /// Binds a full repository set to a connection or a transaction.
    pub fn new(db: &'q dyn Queryable) -> Self {
        Self {
            posts: SqlitePostRepository::new(db),
            tags: SqliteTagRepository::new(db),
            categories: SqliteCategoryRepository::new(db),
            db,
        }
    }

    /// The executor every repository in this set runs on. Inside a unit of
    /// work this is the open transaction.
    pub fn executor(&self) -> &'q dyn Queryable {
        self.db
    }
}
