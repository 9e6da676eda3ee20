use std::os::raw::c_int;

use planner_types::AccountId;
use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("No account with id {0}")]
    UnknownOwner(AccountId),

    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i64, supported: i64 },

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("DB lock poisoned")]
    LockPoisoned,

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Extended SQLite result code of a constraint violation, if `err` is one.
pub(crate) fn constraint_violation(err: &rusqlite::Error) -> Option<c_int> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        constraint_violation(err),
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    constraint_violation(err) == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}
