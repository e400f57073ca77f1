//! PostgreSQL implementation of the masjid store.
//!
//! Provides a PostgreSQL backend for the `MasjidStore` trait using a
//! `sqlx::PgPool`.
//!
//! ## Tables
//!
//! - `masajid`: directory entries, with the location flattened into
//!   `longitude`/`latitude` and address columns
//! - `reviews`: reviews, referencing `masajid.id` through `masjid`
//!
//! ## Indexes
//!
//! - `masajid_slug_key`: unique on `lower(slug)`, backs slug uniqueness
//! - `masajid_text_idx`: GIN full-text index over name, description, imam and secretary names
//! - `masajid_location_idx`: coordinate index used to pre-filter near queries
//! - `reviews_masjid_idx`: the review join
mod masjid_store;
mod rows;

pub use masjid_store::PostgresMasjidStore;
