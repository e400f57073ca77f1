//! Directory entry types.
//!
//! A `Masjid` is the stored shape of a directory entry. Reviews are not part
//! of it; they live in their own collection and are attached on read through
//! `MasjidView`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MasjidId, Review, UserId};
use crate::geo::GeoPoint;

/// GeoJSON geometry type stored with every location.
pub const POINT_TYPE: &str = "Point";

fn default_point_type() -> String {
    POINT_TYPE.to_string()
}

/// Where a masjid is, as a GeoJSON point plus its postal address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    #[serde(rename = "type", default = "default_point_type")]
    pub kind: String,
    /// `[longitude, latitude]` in degrees.
    pub coordinates: [f64; 2],
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl Location {
    pub fn new(
        coordinates: [f64; 2],
        address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            kind: default_point_type(),
            coordinates,
            address: address.into(),
            city: city.into(),
            state: state.into(),
            country: country.into(),
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::from_coordinates(self.coordinates)
    }
}

/// A masjid directory entry as persisted in the store.
///
/// `slug` is derived from `name` by the slug assigner and is unique across all
/// entries. It is empty only on an entry that has not been saved yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Masjid {
    pub id: MasjidId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub imam_name: String,
    pub imam_phone_no: u64,
    pub sec_name: String,
    pub sec_phone_no: u64,
    pub population: u64,
    pub langservice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acctname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acctno: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub madrasah_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub madrasah_phone_no: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub author: UserId,
}

impl Masjid {
    /// Whether `tag` appears in this entry's tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// The text fields covered by the full-text index.
    pub fn searchable_text(&self) -> [&str; 4] {
        [
            self.name.as_str(),
            self.description.as_deref().unwrap_or_default(),
            self.imam_name.as_str(),
            self.sec_name.as_str(),
        ]
    }
}

/// The public read shape of an entry.
///
/// `reviews` is `Some` when the read asked for reviews to be attached and
/// holds exactly the reviews whose `masjid` references this entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasjidView {
    #[serde(flatten)]
    pub masjid: Masjid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<Review>>,
}

impl MasjidView {
    pub fn without_reviews(masjid: Masjid) -> Self {
        Self {
            masjid,
            reviews: None,
        }
    }

    pub fn with_reviews(masjid: Masjid, reviews: Vec<Review>) -> Self {
        Self {
            masjid,
            reviews: Some(reviews),
        }
    }
}
