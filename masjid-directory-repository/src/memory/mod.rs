//! In-process masjid store for testing and local development.
//!
//! `InMemoryMasjidStore` keeps both collections in memory, enforces the same
//! case-insensitive slug uniqueness as the PostgreSQL schema, and answers the
//! reporting queries with the pipelines in [`crate::reporting`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use masjid_directory_repository::{InMemoryMasjidStore, MasjidService};
//!
//! let service = MasjidService::new(Arc::new(InMemoryMasjidStore::new()));
//! let masjid = service.create(request).await?;
//! ```

use std::cmp::Ordering;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use masjid_directory_shared::{Masjid, MasjidId, Review, TagCount, TopMasjid};

use crate::errors::MasjidRepositoryError;
use crate::interfaces::MasjidStore;
use crate::query::{search_terms, MasjidFilter, MasjidQuery};
use crate::reporting;
use crate::slug::SlugPattern;

/// Store backed by two in-memory collections, kept in insertion order.
#[derive(Default)]
pub struct InMemoryMasjidStore {
    masajid: RwLock<Vec<Masjid>>,
    reviews: RwLock<Vec<Review>>,
}

fn poisoned<T>(_: T) -> MasjidRepositoryError {
    MasjidRepositoryError::store("in-memory store lock poisoned")
}

impl InMemoryMasjidStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries and reviews, as given.
    ///
    /// No uniqueness checks are applied, which makes it possible to seed
    /// states the service itself would never produce.
    pub fn with_data(masajid: Vec<Masjid>, reviews: Vec<Review>) -> Self {
        Self {
            masajid: RwLock::new(masajid),
            reviews: RwLock::new(reviews),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.masajid.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_masajid(&self) -> Result<RwLockReadGuard<'_, Vec<Masjid>>, MasjidRepositoryError> {
        self.masajid.read().map_err(poisoned)
    }

    fn write_masajid(&self) -> Result<RwLockWriteGuard<'_, Vec<Masjid>>, MasjidRepositoryError> {
        self.masajid.write().map_err(poisoned)
    }

    fn read_reviews(&self) -> Result<RwLockReadGuard<'_, Vec<Review>>, MasjidRepositoryError> {
        self.reviews.read().map_err(poisoned)
    }

    fn ensure_slug_free(masajid: &[Masjid], candidate: &Masjid) -> Result<(), MasjidRepositoryError> {
        let taken = masajid
            .iter()
            .any(|m| m.id != candidate.id && m.slug.eq_ignore_ascii_case(&candidate.slug));
        if taken {
            return Err(MasjidRepositoryError::SlugTaken(candidate.slug.clone()));
        }
        Ok(())
    }
}

/// Relevance of an entry for the given terms: how many indexed words match.
fn text_score(masjid: &Masjid, terms: &[String]) -> usize {
    masjid
        .searchable_text()
        .iter()
        .flat_map(|field| search_terms(field))
        .filter(|word| terms.contains(word))
        .count()
}

fn newest_first(a: &Masjid, b: &Masjid) -> Ordering {
    b.created.cmp(&a.created)
}

#[async_trait]
impl MasjidStore for InMemoryMasjidStore {
    async fn ensure_indexes(&self) -> Result<(), MasjidRepositoryError> {
        Ok(())
    }

    async fn find_slugs_matching(
        &self,
        pattern: &SlugPattern,
    ) -> Result<Vec<String>, MasjidRepositoryError> {
        let masajid = self.read_masajid()?;
        Ok(masajid
            .iter()
            .filter(|m| pattern.matches(&m.slug))
            .map(|m| m.slug.clone())
            .collect())
    }

    async fn insert_masjid(&self, masjid: &Masjid) -> Result<(), MasjidRepositoryError> {
        let mut masajid = self.write_masajid()?;
        if masajid.iter().any(|m| m.id == masjid.id) {
            return Err(MasjidRepositoryError::AlreadyExists(masjid.id.to_string()));
        }
        Self::ensure_slug_free(&masajid, masjid)?;
        masajid.push(masjid.clone());
        Ok(())
    }

    async fn update_masjid(&self, masjid: &Masjid) -> Result<(), MasjidRepositoryError> {
        let mut masajid = self.write_masajid()?;
        Self::ensure_slug_free(&masajid, masjid)?;
        let slot = masajid
            .iter_mut()
            .find(|m| m.id == masjid.id)
            .ok_or_else(|| MasjidRepositoryError::not_found(masjid.id))?;
        *slot = masjid.clone();
        Ok(())
    }

    async fn get_masjid(&self, id: MasjidId) -> Result<Option<Masjid>, MasjidRepositoryError> {
        let masajid = self.read_masajid()?;
        Ok(masajid.iter().find(|m| m.id == id).cloned())
    }

    async fn get_masjid_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Masjid>, MasjidRepositoryError> {
        let masajid = self.read_masajid()?;
        Ok(masajid
            .iter()
            .find(|m| m.slug.eq_ignore_ascii_case(slug))
            .cloned())
    }

    async fn find_masajid(
        &self,
        query: &MasjidQuery,
    ) -> Result<Vec<Masjid>, MasjidRepositoryError> {
        let masajid = self.read_masajid()?;

        let selected: Vec<Masjid> = match &query.filter {
            MasjidFilter::All => {
                let mut all: Vec<Masjid> = masajid.clone();
                all.sort_by(newest_first);
                all
            }
            MasjidFilter::Tag(tag) => {
                let mut tagged: Vec<Masjid> =
                    masajid.iter().filter(|m| m.has_tag(tag)).cloned().collect();
                tagged.sort_by(newest_first);
                tagged
            }
            MasjidFilter::Text(text) => {
                let terms = search_terms(text);
                let mut scored: Vec<(usize, &Masjid)> = masajid
                    .iter()
                    .map(|m| (text_score(m, &terms), m))
                    .filter(|(score, _)| *score > 0)
                    .collect();
                scored.sort_by(|a, b| b.0.cmp(&a.0));
                scored.into_iter().map(|(_, m)| m.clone()).collect()
            }
            MasjidFilter::Near {
                point,
                max_distance_meters,
            } => {
                let mut nearby: Vec<(f64, &Masjid)> = masajid
                    .iter()
                    .map(|m| (point.distance_meters(&m.location.point()), m))
                    .filter(|(distance, _)| *distance <= *max_distance_meters)
                    .collect();
                nearby.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
                nearby.into_iter().map(|(_, m)| m.clone()).collect()
            }
        };

        Ok(query.paginate(selected))
    }

    async fn insert_review(&self, review: &Review) -> Result<(), MasjidRepositoryError> {
        // Lock order: masajid before reviews, same as the readers.
        let masajid = self.read_masajid()?;
        if !masajid.iter().any(|m| m.id == review.masjid) {
            return Err(MasjidRepositoryError::not_found(review.masjid));
        }
        let mut reviews = self.reviews.write().map_err(poisoned)?;
        if reviews.iter().any(|r| r.id == review.id) {
            return Err(MasjidRepositoryError::AlreadyExists(review.id.to_string()));
        }
        reviews.push(review.clone());
        Ok(())
    }

    async fn find_reviews(
        &self,
        masjid_ids: &[MasjidId],
    ) -> Result<Vec<Review>, MasjidRepositoryError> {
        let reviews = self.read_reviews()?;
        let mut matching: Vec<Review> = reviews
            .iter()
            .filter(|r| masjid_ids.contains(&r.masjid))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created.cmp(&b.created));
        Ok(matching)
    }

    async fn tag_counts(&self) -> Result<Vec<TagCount>, MasjidRepositoryError> {
        let masajid = self.read_masajid()?;
        Ok(reporting::tag_frequency(masajid.iter()))
    }

    async fn top_rated(
        &self,
        min_reviews: usize,
        limit: usize,
    ) -> Result<Vec<TopMasjid>, MasjidRepositoryError> {
        let masajid = self.read_masajid()?;
        let reviews = self.read_reviews()?;
        Ok(reporting::top_rated(
            masajid.iter(),
            &reviews,
            min_reviews,
            limit,
        ))
    }
}
