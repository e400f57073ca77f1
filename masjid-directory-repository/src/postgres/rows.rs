//! Row types for the PostgreSQL store and their conversions to domain types.
//!
//! PostgreSQL has no unsigned integers, so counts and phone numbers are stored
//! as `BIGINT` and range-checked on the way in and out.

use chrono::{DateTime, Utc};
use masjid_directory_shared::{Location, Masjid, Review, TagCount};
use uuid::Uuid;

use crate::errors::MasjidRepositoryError;

/// Column list matching `MasjidRow`, in table order.
pub(crate) const MASJID_COLUMNS: &str = "id, name, slug, imam_name, imam_phone_no, sec_name, \
     sec_phone_no, population, langservice, bank, website, acctname, acctno, madrasah_name, \
     madrasah_phone_no, description, tags, created, location_type, longitude, latitude, \
     address, city, state, country, photo, author";

pub(crate) const REVIEW_COLUMNS: &str = "id, masjid, author, text, rating, created";

pub(crate) fn to_db_int(field: &str, value: u64) -> Result<i64, MasjidRepositoryError> {
    i64::try_from(value)
        .map_err(|_| MasjidRepositoryError::invalid_field(field, format!("{} is too large", value)))
}

pub(crate) fn to_db_opt_int(
    field: &str,
    value: Option<u64>,
) -> Result<Option<i64>, MasjidRepositoryError> {
    value.map(|v| to_db_int(field, v)).transpose()
}

fn from_db_int(field: &str, value: i64) -> Result<u64, MasjidRepositoryError> {
    u64::try_from(value)
        .map_err(|_| MasjidRepositoryError::decode(format!("negative {}: {}", field, value)))
}

fn from_db_opt_int(field: &str, value: Option<i64>) -> Result<Option<u64>, MasjidRepositoryError> {
    value.map(|v| from_db_int(field, v)).transpose()
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MasjidRow {
    id: Uuid,
    name: String,
    slug: String,
    imam_name: String,
    imam_phone_no: i64,
    sec_name: String,
    sec_phone_no: i64,
    population: i64,
    langservice: String,
    bank: Option<String>,
    website: Option<String>,
    acctname: Option<String>,
    acctno: Option<i64>,
    madrasah_name: Option<String>,
    madrasah_phone_no: Option<i64>,
    description: Option<String>,
    tags: Vec<String>,
    created: DateTime<Utc>,
    location_type: String,
    longitude: f64,
    latitude: f64,
    address: String,
    city: String,
    state: String,
    country: String,
    photo: Option<String>,
    author: Uuid,
}

impl TryFrom<MasjidRow> for Masjid {
    type Error = MasjidRepositoryError;

    fn try_from(row: MasjidRow) -> Result<Self, Self::Error> {
        Ok(Masjid {
            id: row.id,
            name: row.name,
            slug: row.slug,
            imam_name: row.imam_name,
            imam_phone_no: from_db_int("imam_phone_no", row.imam_phone_no)?,
            sec_name: row.sec_name,
            sec_phone_no: from_db_int("sec_phone_no", row.sec_phone_no)?,
            population: from_db_int("population", row.population)?,
            langservice: row.langservice,
            bank: row.bank,
            website: row.website,
            acctname: row.acctname,
            acctno: from_db_opt_int("acctno", row.acctno)?,
            madrasah_name: row.madrasah_name,
            madrasah_phone_no: from_db_opt_int("madrasah_phone_no", row.madrasah_phone_no)?,
            description: row.description,
            tags: row.tags,
            created: row.created,
            location: Location {
                kind: row.location_type,
                coordinates: [row.longitude, row.latitude],
                address: row.address,
                city: row.city,
                state: row.state,
                country: row.country,
            },
            photo: row.photo,
            author: row.author,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReviewRow {
    id: Uuid,
    masjid: Uuid,
    author: Uuid,
    text: Option<String>,
    rating: f64,
    created: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            masjid: row.masjid,
            author: row.author,
            text: row.text,
            rating: row.rating,
            created: row.created,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TagCountRow {
    tag: String,
    count: i64,
}

impl TryFrom<TagCountRow> for TagCount {
    type Error = MasjidRepositoryError;

    fn try_from(row: TagCountRow) -> Result<Self, Self::Error> {
        Ok(TagCount::new(row.tag, from_db_int("count", row.count)?))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TopRatedRow {
    pub id: Uuid,
    pub photo: Option<String>,
    pub name: String,
    pub slug: String,
    pub average_rating: f64,
}

pub(crate) fn decode_masajid(rows: Vec<MasjidRow>) -> Result<Vec<Masjid>, MasjidRepositoryError> {
    rows.into_iter().map(Masjid::try_from).collect()
}
