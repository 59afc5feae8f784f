//! Ledger Error Types
//!
//! Storage errors are carried unchanged; [`LedgerError::kind`] classifies
//! them without translating the underlying error.

use thiserror::Error;

use crate::core_types::AccountId;
use crate::validation::ValidationError;

/// PostgreSQL SQLSTATE: foreign_key_violation
const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";
/// PostgreSQL SQLSTATE: serialization_failure
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";
/// PostgreSQL SQLSTATE: deadlock_detected
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";
/// PostgreSQL SQLSTATE: lock_not_available (lock_timeout)
const SQLSTATE_LOCK_NOT_AVAILABLE: &str = "55P03";
/// PostgreSQL SQLSTATE: query_canceled (statement_timeout)
const SQLSTATE_QUERY_CANCELED: &str = "57014";

/// Error class, used by callers to decide on retries or status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced account (or row) does not exist
    NotFound,
    /// Connection loss, I/O error or constraint violation
    StorageFailure,
    /// Lock-wait timeout, serialization failure or detected deadlock
    ConflictOrTimeout,
    /// Rejected by caller-level validation before touching storage
    InvalidRequest,
}

/// Ledger error types
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("{entity} {id} is still referenced by other rows")]
    StillReferenced { entity: &'static str, id: i64 },

    #[error("Lock wait timeout on account {0}")]
    LockTimeout(AccountId),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Invalid transfer request: {0}")]
    Validation(#[from] ValidationError),

    #[error("transaction error: {source}, rollback error: {rollback}")]
    Rollback {
        source: Box<LedgerError>,
        rollback: Box<LedgerError>,
    },
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// Compose a failed unit of work with the error from rolling it back
    pub fn with_rollback(source: LedgerError, rollback: LedgerError) -> Self {
        LedgerError::Rollback {
            source: Box::new(source),
            rollback: Box::new(rollback),
        }
    }

    /// Classify the error. A composed rollback error keeps the kind of the
    /// original failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Database(e) => classify_sqlx(e),
            LedgerError::NotFound { .. } | LedgerError::UserNotFound(_) => ErrorKind::NotFound,
            LedgerError::StillReferenced { .. } => ErrorKind::StorageFailure,
            LedgerError::LockTimeout(_) => ErrorKind::ConflictOrTimeout,
            LedgerError::Storage(_) => ErrorKind::StorageFailure,
            LedgerError::Validation(_) => ErrorKind::InvalidRequest,
            LedgerError::Rollback { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Whether a caller may reasonably retry the whole transfer
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConflictOrTimeout
    }
}

fn classify_sqlx(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        sqlx::Error::PoolTimedOut => ErrorKind::ConflictOrTimeout,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| classify_database_error(&code, db_err.message()))
            .unwrap_or(ErrorKind::StorageFailure),
        _ => ErrorKind::StorageFailure,
    }
}

/// Like [`classify_sqlstate`], but a foreign-key violation raised by deleting
/// a still-referenced parent is a storage failure: the row exists.
///
/// PostgreSQL reports the two directions with distinct messages,
/// "insert or update on table ..." vs "update or delete on table ...".
pub fn classify_database_error(code: &str, message: &str) -> ErrorKind {
    if code == SQLSTATE_FOREIGN_KEY_VIOLATION && message.starts_with("update or delete on table") {
        return ErrorKind::StorageFailure;
    }
    classify_sqlstate(code)
}

/// Map a PostgreSQL SQLSTATE to an error class
pub fn classify_sqlstate(code: &str) -> ErrorKind {
    match code {
        SQLSTATE_FOREIGN_KEY_VIOLATION => ErrorKind::NotFound,
        SQLSTATE_SERIALIZATION_FAILURE
        | SQLSTATE_DEADLOCK_DETECTED
        | SQLSTATE_LOCK_NOT_AVAILABLE
        | SQLSTATE_QUERY_CANCELED => ErrorKind::ConflictOrTimeout,
        _ => ErrorKind::StorageFailure,
    }
}
