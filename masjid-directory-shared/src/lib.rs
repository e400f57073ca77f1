//! # Masjid Directory Shared
//!
//! This crate defines the data structures shared across the masjid directory
//! workspace: directory entries, reviews, the request types used to create and
//! update entries, the report shapes produced by the aggregation queries, and
//! the field validation and geo helpers those types rely on.

pub mod geo;
pub mod types;
pub mod validation;

pub use geo::GeoPoint;
pub use types::{
    CreateMasjidRequest, Location, LocationRequest, Masjid, MasjidId, MasjidView, NewReview,
    Review, ReviewId, TagCount, TopMasjid, UpdateMasjidRequest, UserId,
};
pub use validation::FieldError;
