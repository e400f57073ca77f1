//! # Masjid Directory Repository
//!
//! This crate provides the store interface the directory is built on, the
//! service that application code talks to, and two store implementations:
//! PostgreSQL for deployments and an in-process store for tests and local
//! development.
//!
//! ## Modules
//!
//! - [`interfaces`]: the `MasjidStore` trait
//! - [`service`]: `MasjidService`, which validates, assigns slugs and joins reviews
//! - [`slug`]: slug derivation and collision handling
//! - [`reporting`]: the tag frequency and top-rated pipelines
//! - [`query`]: read filters and read options
//! - [`postgres`] / [`memory`]: store implementations
//! - [`errors`]: the crate error type

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod reporting;
pub mod service;
pub mod slug;

pub use config::MasjidServiceConfig;
pub use errors::MasjidRepositoryError;
pub use interfaces::MasjidStore;
pub use memory::InMemoryMasjidStore;
pub use postgres::PostgresMasjidStore;
pub use query::{MasjidFilter, MasjidQuery, ReadOptions};
pub use service::MasjidService;
pub use slug::SlugPattern;
