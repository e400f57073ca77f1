//! Error types for the masjid directory repository.
//!
//! This module provides a unified error type for store, slug and service operations.

mod masjid_repository_error;

pub use masjid_repository_error::MasjidRepositoryError;
