//! Classification of persistence failures into domain outcomes.
//!
//! # Responsibility
//! - Map raw store/repository failures to a small, stable taxonomy.
//! - Pair each outcome with a client message and a status code.
//!
//! # Invariants
//! - The original failure is always retained as the cause, including after
//!   the message is replaced.
//! - Unrecognized failures, including unrecognized constraint violations,
//!   are `Internal`.

use crate::db::DbError;
use crate::repo::RepoError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Unique-constraint targets that get a field-specific message.
const UNIQUE_FIELD_MESSAGES: &[(&str, &str)] = &[
    ("tags.title", "tag already exists"),
    ("category.title", "category already exists"),
];

/// Outcome kinds a caller can map to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    RecordExists,
    RowsNotAffected,
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::RecordExists => 409,
            Self::RowsNotAffected => 418,
            Self::Internal => 500,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            Self::NotFound => "record not found",
            Self::RecordExists => "record already exists",
            Self::RowsNotAffected => "no rows affected",
            Self::Internal => "internal server error, please retry later",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotFound => "not_found",
            Self::RecordExists => "record_exists",
            Self::RowsNotAffected => "rows_not_affected",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Classified error returned to service callers.
#[derive(Debug)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    cause: Option<RepoError>,
}

impl AppError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
            cause: None,
        }
    }

    /// Attaches the underlying failure.
    pub fn with_cause(mut self, cause: RepoError) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Replaces the client message; kind and cause are kept.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Client-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&RepoError> {
        self.cause.as_ref()
    }

    /// Finds the store error at the bottom of the cause chain, if any.
    pub fn sqlite_error(&self) -> Option<&rusqlite::Error> {
        let mut current: Option<&(dyn Error + 'static)> = self.source();
        while let Some(err) = current {
            if let Some(sqlite) = err.downcast_ref::<rusqlite::Error>() {
                return Some(sqlite);
            }
            current = err.source();
        }
        None
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "code: {}, message: {}",
            self.kind.status_code(),
            self.message
        )?;
        if let Some(cause) = &self.cause {
            write!(f, ", cause: {cause}")?;
        }
        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(|cause| cause as &(dyn Error + 'static))
    }
}

impl From<RepoError> for AppError {
    fn from(value: RepoError) -> Self {
        classify(value)
    }
}

/// Maps a repository failure to its domain classification.
pub fn classify(err: RepoError) -> AppError {
    let (kind, message) = match err.root() {
        RepoError::NotFound { .. } => (ErrorKind::NotFound, None),
        RepoError::RowsNotAffected { .. } => (ErrorKind::RowsNotAffected, None),
        RepoError::Db(DbError::Sqlite(sqlite)) => classify_sqlite(sqlite),
        RepoError::Db(DbError::Canceled) => (ErrorKind::Internal, Some("request was canceled")),
        RepoError::Db(DbError::DeadlineExceeded) => {
            (ErrorKind::Internal, Some("request timed out"))
        }
        RepoError::Db(DbError::UnsupportedSchemaVersion { .. })
        | RepoError::InvalidData(_)
        | RepoError::NestedTransaction
        | RepoError::Rollback { .. } => (ErrorKind::Internal, None),
    };

    let classified = AppError::new(kind).with_cause(err);
    match message {
        Some(message) => classified.with_message(message),
        None => classified,
    }
}

fn classify_sqlite(err: &rusqlite::Error) -> (ErrorKind, Option<&'static str>) {
    match err {
        rusqlite::Error::QueryReturnedNoRows => (ErrorKind::NotFound, None),
        rusqlite::Error::SqliteFailure(failure, detail)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            let detail = detail.as_deref().unwrap_or_default();
            let known = UNIQUE_FIELD_MESSAGES
                .iter()
                .find(|(target, _)| detail.contains("UNIQUE") && detail.contains(target));
            match known {
                Some((_, message)) => (ErrorKind::RecordExists, Some(*message)),
                None => (ErrorKind::Internal, None),
            }
        }
        _ => (ErrorKind::Internal, None),
    }
}
