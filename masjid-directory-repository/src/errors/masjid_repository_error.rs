//! Masjid repository error types.
//!
//! Covers both failures of the backing store and the application-level
//! failures raised before anything is written (validation, missing entries,
//! slug assignment).

use masjid_directory_shared::FieldError;
use thiserror::Error;

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unified errors from store and service operations.
#[derive(Debug, Clone, Error)]
pub enum MasjidRepositoryError {
    /// One or more fields failed validation. Raised before the slug is assigned.
    #[error("Validation error: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// A store round-trip failed (connectivity, backend fault, poisoned lock).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store's unique slug constraint rejected a write.
    #[error("Slug already taken: {0}")]
    SlugTaken(String),

    /// Every slug attempt collided with an existing entry.
    #[error("Could not assign a unique slug for '{candidate}' after {attempts} attempts")]
    SlugExhausted { candidate: String, attempts: u32 },

    /// A record with the same identifier already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The referenced entry does not exist.
    #[error("Masjid not found: {0}")]
    NotFound(String),

    /// A stored row could not be turned back into a domain value.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl MasjidRepositoryError {
    /// Create a store unavailable error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound(id.to_string())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a single-field validation error.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<Vec<FieldError>> for MasjidRepositoryError {
    fn from(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }
}

impl From<sqlx::Error> for MasjidRepositoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for MasjidRepositoryError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::StoreUnavailable(format!("migration failed: {}", err))
    }
}
