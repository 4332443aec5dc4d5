pub mod memory;
pub mod models;
pub mod product_repo;
pub mod purchase_repo;
pub mod user_repo;

#[cfg(test)]
pub(crate) mod test_db;

use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::domain::errors::DomainError;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

/// Turns a unique-constraint violation into `Conflict(message)`.
pub(crate) fn conflict_on_unique(message: &str) -> impl Fn(DieselError) -> DomainError + '_ {
    move |e| match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DomainError::Conflict(message.to_string())
        }
        other => other.into(),
    }
}
