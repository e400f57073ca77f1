//! Masjid store trait definition.
//!
//! This module defines the interface to the document store holding the
//! `masajid` and `reviews` collections.

use async_trait::async_trait;
use masjid_directory_shared::{Masjid, MasjidId, Review, TagCount, TopMasjid};

use crate::errors::MasjidRepositoryError;
use crate::query::MasjidQuery;
use crate::slug::SlugPattern;

/// Abstracts the store that holds directory entries and their reviews.
///
/// Implementations are injected into `MasjidService`. Every method is a single
/// round-trip to the store; a failing round-trip is reported as
/// `MasjidRepositoryError::StoreUnavailable` and leaves no partial state.
///
/// # Slug uniqueness
///
/// Implementations must enforce case-insensitive uniqueness of `slug` on
/// `insert_masjid` and `update_masjid`, rejecting a conflicting write with
/// `MasjidRepositoryError::SlugTaken`. The service relies on this to close the
/// gap between checking for existing slugs and writing the entry.
#[async_trait]
pub trait MasjidStore: Send + Sync {
    /// Ensure the schema and its indexes exist: the unique slug index, the
    /// full-text index over name, description, imam and secretary names, and
    /// the location index.
    async fn ensure_indexes(&self) -> Result<(), MasjidRepositoryError>;

    /// Return the slugs of every entry whose slug matches `pattern`.
    ///
    /// An entry that is being re-saved is included in the result.
    async fn find_slugs_matching(
        &self,
        pattern: &SlugPattern,
    ) -> Result<Vec<String>, MasjidRepositoryError>;

    /// Insert a new entry.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The entry was stored
    /// * `Err(MasjidRepositoryError::SlugTaken)` - Another entry already has the slug
    /// * `Err(MasjidRepositoryError::AlreadyExists)` - The id is already in use
    async fn insert_masjid(&self, masjid: &Masjid) -> Result<(), MasjidRepositoryError>;

    /// Replace an existing entry, matched by id.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The entry was replaced
    /// * `Err(MasjidRepositoryError::SlugTaken)` - Another entry already has the slug
    /// * `Err(MasjidRepositoryError::NotFound)` - No entry has this id
    async fn update_masjid(&self, masjid: &Masjid) -> Result<(), MasjidRepositoryError>;

    async fn get_masjid(&self, id: MasjidId) -> Result<Option<Masjid>, MasjidRepositoryError>;

    /// Look an entry up by slug, ignoring case.
    async fn get_masjid_by_slug(&self, slug: &str)
        -> Result<Option<Masjid>, MasjidRepositoryError>;

    /// Return the entries selected by `query`, ordered as its filter documents.
    async fn find_masajid(&self, query: &MasjidQuery)
        -> Result<Vec<Masjid>, MasjidRepositoryError>;

    /// Insert a review. Fails with `NotFound` when the referenced entry is missing.
    async fn insert_review(&self, review: &Review) -> Result<(), MasjidRepositoryError>;

    /// Return every review whose `masjid` is one of `masjid_ids`, oldest first.
    async fn find_reviews(
        &self,
        masjid_ids: &[MasjidId],
    ) -> Result<Vec<Review>, MasjidRepositoryError>;

    /// Tag frequency: unwind tags, group by tag, count, most frequent first.
    async fn tag_counts(&self) -> Result<Vec<TagCount>, MasjidRepositoryError>;

    /// Top rated: join reviews, keep entries with at least `min_reviews`,
    /// average the ratings, highest first, at most `limit` rows.
    async fn top_rated(
        &self,
        min_reviews: usize,
        limit: usize,
    ) -> Result<Vec<TopMasjid>, MasjidRepositoryError>;
}
