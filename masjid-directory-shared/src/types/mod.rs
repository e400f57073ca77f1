//! This module defines the core data structures used across the masjid directory.
//! It re-exports the entry, review, request and report types.

pub mod masjid;
pub mod report;
pub mod request;
pub mod review;

use uuid::Uuid;

pub type MasjidId = Uuid;
pub type ReviewId = Uuid;
pub type UserId = Uuid;

pub use masjid::{Location, Masjid, MasjidView, POINT_TYPE};
pub use report::{TagCount, TopMasjid};
pub use request::{CreateMasjidRequest, LocationRequest, UpdateMasjidRequest};
pub use review::{NewReview, Review};
