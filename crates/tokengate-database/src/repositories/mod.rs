//! PostgreSQL implementations of the store contracts.

pub mod identity;
pub mod token;

pub use identity::PgIdentityRepository;
pub use token::PgRefreshStore;

use tokengate_core::error::{AppError, ErrorKind};

/// Wrap a driver error with the name of the failing operation.
pub(crate) fn db_err(op: &str, e: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Database, format!("{op}: {e}"), e)
}

/// Whether the error is a unique-constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
