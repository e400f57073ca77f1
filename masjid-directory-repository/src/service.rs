//! Masjid directory service implementation.
//!
//! This module provides the service application code talks to. It validates
//! submissions, assigns unique slugs, attaches reviews to the entries it reads
//! and runs the two reporting queries.

use std::sync::Arc;

use chrono::Utc;
use masjid_directory_shared::validation::validate_masjid;
use masjid_directory_shared::{
    CreateMasjidRequest, GeoPoint, Masjid, MasjidId, MasjidView, NewReview, Review, TagCount,
    TopMasjid, UpdateMasjidRequest,
};
use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MasjidServiceConfig;
use crate::errors::MasjidRepositoryError;
use crate::interfaces::MasjidStore;
use crate::query::{search_terms, MasjidQuery, ReadOptions};
use crate::reporting::{self, TOP_RATED_LIMIT, TOP_RATED_MIN_REVIEWS};
use crate::slug::{candidate_slug, count_based_slug, retry_spread, spread_slug, SlugPattern};

/// How an entry is written once its slug is known.
#[derive(Debug, Clone, Copy)]
enum SaveMode {
    Insert,
    Update,
}

/// A uniformly random offset below `spread`.
fn random_offset(spread: u64) -> u64 {
    rand::thread_rng().gen_range(0..spread.max(1))
}

/// The main service for the masjid directory.
///
/// Every operation validates its input before the first store round-trip and
/// reports failures as `MasjidRepositoryError`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use masjid_directory_repository::{InMemoryMasjidStore, MasjidService};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = MasjidService::new(Arc::new(InMemoryMasjidStore::new()));
/// for row in service.tags_list().await? {
///     println!("{} {}", row.tag, row.count);
/// }
/// # Ok(())
/// # }
/// ```
pub struct MasjidService {
    store: Arc<dyn MasjidStore>,
    config: MasjidServiceConfig,
}

impl MasjidService {
    /// Create a new MasjidService with default configuration.
    pub fn new(store: Arc<dyn MasjidStore>) -> Self {
        Self {
            store,
            config: MasjidServiceConfig::default(),
        }
    }

    /// Create a new MasjidService with custom configuration.
    pub fn with_config(store: Arc<dyn MasjidStore>, config: MasjidServiceConfig) -> Self {
        Self { store, config }
    }

    /// Validate a submission and save it as a new entry with a unique slug.
    ///
    /// # Returns
    ///
    /// * `Ok(Masjid)` - The stored entry, slug assigned
    /// * `Err(MasjidRepositoryError::Validation)` - A required field is missing or malformed
    /// * `Err(MasjidRepositoryError::SlugExhausted)` - Every slug attempt collided
    /// * `Err(MasjidRepositoryError)` - The store failed
    pub async fn create(
        &self,
        request: CreateMasjidRequest,
    ) -> Result<Masjid, MasjidRepositoryError> {
        let mut masjid = request.into_masjid(Uuid::new_v4(), Utc::now())?;
        self.save_with_slug(&mut masjid, SaveMode::Insert).await?;
        info!(id = %masjid.id, slug = %masjid.slug, "Created masjid");
        Ok(masjid)
    }

    /// Apply a partial update to an existing entry.
    ///
    /// The slug is derived again only when the name changed; otherwise the
    /// stored slug is kept as is.
    ///
    /// # Returns
    ///
    /// * `Ok(Masjid)` - The stored entry after the update
    /// * `Err(MasjidRepositoryError::NotFound)` - No entry has this id
    /// * `Err(MasjidRepositoryError::Validation)` - The update left a required field blank
    /// * `Err(MasjidRepositoryError)` - Slug assignment or the store failed
    pub async fn update(
        &self,
        id: MasjidId,
        request: UpdateMasjidRequest,
    ) -> Result<Masjid, MasjidRepositoryError> {
        let mut masjid = self
            .store
            .get_masjid(id)
            .await?
            .ok_or_else(|| MasjidRepositoryError::not_found(id))?;

        let name_changed = request.apply(&mut masjid);
        validate_masjid(&masjid)?;

        if name_changed {
            self.save_with_slug(&mut masjid, SaveMode::Update).await?;
        } else {
            self.store.update_masjid(&masjid).await?;
        }

        info!(id = %masjid.id, slug = %masjid.slug, name_changed, "Updated masjid");
        Ok(masjid)
    }

    /// Assign a slug from the entry's name and write it.
    ///
    /// The first attempt uses the count of existing matches. If the store
    /// rejects that slug because a concurrent save took it, the matches are
    /// read again and the next attempt lands at a random suffix above the
    /// highest one in use, in a window that doubles with every retry.
    async fn save_with_slug(
        &self,
        masjid: &mut Masjid,
        mode: SaveMode,
    ) -> Result<(), MasjidRepositoryError> {
        let candidate = candidate_slug(&masjid.name);
        let pattern = SlugPattern::new(&candidate)?;
        let attempts = self.config.attempts();

        for attempt in 1..=attempts {
            let existing = self.store.find_slugs_matching(&pattern).await?;
            masjid.slug = if attempt == 1 {
                count_based_slug(&candidate, existing.len())
            } else {
                spread_slug(&candidate, &existing, random_offset(retry_spread(attempt)))
            };
            debug!(
                candidate = %candidate,
                slug = %masjid.slug,
                matches = existing.len(),
                attempt,
                "Trying slug"
            );

            let result = match mode {
                SaveMode::Insert => self.store.insert_masjid(masjid).await,
                SaveMode::Update => self.store.update_masjid(masjid).await,
            };
            match result {
                Ok(()) => return Ok(()),
                Err(MasjidRepositoryError::SlugTaken(slug)) => {
                    warn!(slug = %slug, attempt, attempts, "Slug taken, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Err(MasjidRepositoryError::SlugExhausted {
            candidate,
            attempts,
        })
    }

    /// Fetch one entry by id.
    pub async fn get(
        &self,
        id: MasjidId,
        options: ReadOptions,
    ) -> Result<Option<MasjidView>, MasjidRepositoryError> {
        match self.store.get_masjid(id).await? {
            Some(masjid) => Ok(self.attach(vec![masjid], options).await?.pop()),
            None => Ok(None),
        }
    }

    /// Fetch one entry by slug, ignoring case.
    pub async fn get_by_slug(
        &self,
        slug: &str,
        options: ReadOptions,
    ) -> Result<Option<MasjidView>, MasjidRepositoryError> {
        match self.store.get_masjid_by_slug(slug.trim()).await? {
            Some(masjid) => Ok(self.attach(vec![masjid], options).await?.pop()),
            None => Ok(None),
        }
    }

    /// Run a query and attach reviews as `options` asks.
    pub async fn list(
        &self,
        query: MasjidQuery,
        options: ReadOptions,
    ) -> Result<Vec<MasjidView>, MasjidRepositoryError> {
        let masajid = self.store.find_masajid(&query).await?;
        debug!(filter = ?query.filter, count = masajid.len(), "Listed masajid");
        self.attach(masajid, options).await
    }

    /// Full-text search over name, description, imam and secretary names.
    ///
    /// Text without any searchable term matches nothing.
    pub async fn search(
        &self,
        text: &str,
        limit: Option<usize>,
        options: ReadOptions,
    ) -> Result<Vec<MasjidView>, MasjidRepositoryError> {
        if search_terms(text).is_empty() {
            return Ok(Vec::new());
        }
        let mut query = MasjidQuery::text(text);
        query.limit = limit;
        self.list(query, options).await
    }

    /// Entries within `max_distance_meters` of `point`, nearest first.
    pub async fn near(
        &self,
        point: GeoPoint,
        max_distance_meters: f64,
        limit: Option<usize>,
        options: ReadOptions,
    ) -> Result<Vec<MasjidView>, MasjidRepositoryError> {
        if !point.is_valid() {
            return Err(MasjidRepositoryError::invalid_field(
                "coordinates",
                "coordinates are out of range",
            ));
        }
        if !max_distance_meters.is_finite() || max_distance_meters < 0.0 {
            return Err(MasjidRepositoryError::invalid_field(
                "max_distance",
                "distance must be a non-negative number of meters",
            ));
        }
        let mut query = MasjidQuery::near(point, max_distance_meters);
        query.limit = limit;
        self.list(query, options).await
    }

    /// Entries carrying `tag`, newest first.
    pub async fn by_tag(
        &self,
        tag: &str,
        options: ReadOptions,
    ) -> Result<Vec<MasjidView>, MasjidRepositoryError> {
        self.list(MasjidQuery::tag(tag.trim()), options).await
    }

    /// Validate and store a review of an existing entry.
    pub async fn add_review(&self, review: NewReview) -> Result<Review, MasjidRepositoryError> {
        let review = review.into_review()?;
        if self.store.get_masjid(review.masjid).await?.is_none() {
            return Err(MasjidRepositoryError::not_found(review.masjid));
        }
        self.store.insert_review(&review).await?;
        info!(id = %review.id, masjid = %review.masjid, rating = review.rating, "Added review");
        Ok(review)
    }

    /// Every distinct tag with its number of occurrences, most frequent first.
    ///
    /// A tag listed twice on one entry counts twice.
    pub async fn tags_list(&self) -> Result<Vec<TagCount>, MasjidRepositoryError> {
        let tags = self.store.tag_counts().await?;
        debug!(count = tags.len(), "Computed tag list");
        Ok(tags)
    }

    /// Up to ten entries with at least two reviews, highest average rating first.
    pub async fn top_masajid(&self) -> Result<Vec<TopMasjid>, MasjidRepositoryError> {
        let rows = self
            .store
            .top_rated(TOP_RATED_MIN_REVIEWS, TOP_RATED_LIMIT)
            .await?;
        debug!(count = rows.len(), "Computed top masajid");
        Ok(rows)
    }

    async fn attach(
        &self,
        masajid: Vec<Masjid>,
        options: ReadOptions,
    ) -> Result<Vec<MasjidView>, MasjidRepositoryError> {
        if !options.include_reviews {
            return Ok(masajid.into_iter().map(MasjidView::without_reviews).collect());
        }
        if masajid.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<MasjidId> = masajid.iter().map(|m| m.id).collect();
        let reviews = self.store.find_reviews(&ids).await?;
        Ok(reporting::attach_reviews(masajid, reviews))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryMasjidStore;
    use async_trait::async_trait;
    use masjid_directory_shared::LocationRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Store whose every call fails, counting the calls it received.
    #[derive(Default)]
    struct UnavailableStore {
        calls: AtomicUsize,
    }

    impl UnavailableStore {
        fn fail<T>(&self) -> Result<T, MasjidRepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(MasjidRepositoryError::store("connection refused"))
        }
    }

    #[async_trait]
    impl MasjidStore for UnavailableStore {
        async fn ensure_indexes(&self) -> Result<(), MasjidRepositoryError> {
            self.fail()
        }
        async fn find_slugs_matching(
            &self,
            _pattern: &SlugPattern,
        ) -> Result<Vec<String>, MasjidRepositoryError> {
            self.fail()
        }
        async fn insert_masjid(&self, _masjid: &Masjid) -> Result<(), MasjidRepositoryError> {
            self.fail()
        }
        async fn update_masjid(&self, _masjid: &Masjid) -> Result<(), MasjidRepositoryError> {
            self.fail()
        }
        async fn get_masjid(&self, _id: MasjidId) -> Result<Option<Masjid>, MasjidRepositoryError> {
            self.fail()
        }
        async fn get_masjid_by_slug(
            &self,
            _slug: &str,
        ) -> Result<Option<Masjid>, MasjidRepositoryError> {
            self.fail()
        }
        async fn find_masajid(
            &self,
            _query: &MasjidQuery,
        ) -> Result<Vec<Masjid>, MasjidRepositoryError> {
            self.fail()
        }
        async fn insert_review(&self, _review: &Review) -> Result<(), MasjidRepositoryError> {
            self.fail()
        }
        async fn find_reviews(
            &self,
            _masjid_ids: &[MasjidId],
        ) -> Result<Vec<Review>, MasjidRepositoryError> {
            self.fail()
        }
        async fn tag_counts(&self) -> Result<Vec<TagCount>, MasjidRepositoryError> {
            self.fail()
        }
        async fn top_rated(
            &self,
            _min_reviews: usize,
            _limit: usize,
        ) -> Result<Vec<TopMasjid>, MasjidRepositoryError> {
            self.fail()
        }
    }

    /// Store that reports no existing slugs but rejects the first
    /// `collisions` inserts, as if concurrent saves kept winning the race.
    struct RacingStore {
        collisions: AtomicUsize,
        written: Mutex<Vec<String>>,
        lookups: AtomicUsize,
    }

    impl RacingStore {
        fn new(collisions: usize) -> Self {
            Self {
                collisions: AtomicUsize::new(collisions),
                written: Mutex::new(Vec::new()),
                lookups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MasjidStore for RacingStore {
        async fn ensure_indexes(&self) -> Result<(), MasjidRepositoryError> {
            Ok(())
        }
        async fn find_slugs_matching(
            &self,
            pattern: &SlugPattern,
        ) -> Result<Vec<String>, MasjidRepositoryError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            // The winners of the race are visible from the second lookup on.
            let written = self.written.lock().unwrap();
            if written.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![pattern.candidate().to_string()])
            }
        }
        async fn insert_masjid(&self, masjid: &Masjid) -> Result<(), MasjidRepositoryError> {
            let mut written = self.written.lock().unwrap();
            written.push(masjid.slug.clone());
            let remaining = self.collisions.load(Ordering::SeqCst);
            if remaining > 0 {
                self.collisions.store(remaining - 1, Ordering::SeqCst);
                return Err(MasjidRepositoryError::SlugTaken(masjid.slug.clone()));
            }
            Ok(())
        }
        async fn update_masjid(&self, _masjid: &Masjid) -> Result<(), MasjidRepositoryError> {
            Ok(())
        }
        async fn get_masjid(&self, _id: MasjidId) -> Result<Option<Masjid>, MasjidRepositoryError> {
            Ok(None)
        }
        async fn get_masjid_by_slug(
            &self,
            _slug: &str,
        ) -> Result<Option<Masjid>, MasjidRepositoryError> {
            Ok(None)
        }
        async fn find_masajid(
            &self,
            _query: &MasjidQuery,
        ) -> Result<Vec<Masjid>, MasjidRepositoryError> {
            Ok(Vec::new())
        }
        async fn insert_review(&self, _review: &Review) -> Result<(), MasjidRepositoryError> {
            Ok(())
        }
        async fn find_reviews(
            &self,
            _masjid_ids: &[MasjidId],
        ) -> Result<Vec<Review>, MasjidRepositoryError> {
            Ok(Vec::new())
        }
        async fn tag_counts(&self) -> Result<Vec<TagCount>, MasjidRepositoryError> {
            Ok(Vec::new())
        }
        async fn top_rated(
            &self,
            _min_reviews: usize,
            _limit: usize,
        ) -> Result<Vec<TopMasjid>, MasjidRepositoryError> {
            Ok(Vec::new())
        }
    }

    fn request(name: &str) -> CreateMasjidRequest {
        CreateMasjidRequest {
            name: Some(name.to_string()),
            imam_name: Some("Abdullahi Musa".to_string()),
            imam_phone_no: Some(2348030000001),
            sec_name: Some("Yusuf Bello".to_string()),
            sec_phone_no: Some(2348030000002),
            population: Some(350),
            langservice: Some("Hausa".to_string()),
            location: Some(LocationRequest {
                coordinates: Some([8.52, 12.0]),
                address: Some("12 Bompai Road".to_string()),
                city: Some("Kano".to_string()),
                state: Some("Kano".to_string()),
                country: Some("Nigeria".to_string()),
            }),
            author: Some(Uuid::new_v4()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_validation_runs_before_any_store_call() {
        let store = Arc::new(UnavailableStore::default());
        let service = MasjidService::new(store.clone());

        let result = service.create(CreateMasjidRequest::default()).await;

        assert!(matches!(result, Err(MasjidRepositoryError::Validation(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_from_create() {
        let store = Arc::new(UnavailableStore::default());
        let service = MasjidService::new(store.clone());

        let result = service.create(request("Al Noor")).await;

        assert!(matches!(
            result,
            Err(MasjidRepositoryError::StoreUnavailable(_))
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_from_reports() {
        let service = MasjidService::new(Arc::new(UnavailableStore::default()));

        assert!(matches!(
            service.tags_list().await,
            Err(MasjidRepositoryError::StoreUnavailable(_))
        ));
        assert!(matches!(
            service.top_masajid().await,
            Err(MasjidRepositoryError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_slug_taken_is_retried_past_the_winner() {
        let store = Arc::new(RacingStore::new(1));
        let service = MasjidService::new(store.clone());

        let masjid = service.create(request("Al Noor")).await.unwrap();

        let suffix: u64 = masjid.slug.strip_prefix("al-noor-").unwrap().parse().unwrap();
        assert!((2..2 + crate::slug::RETRY_SPREAD).contains(&suffix));
        assert_eq!(*store.written.lock().unwrap(), vec!["al-noor".to_string(), masjid.slug]);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 2);
    }

    /// In-process store that yields between every call, so concurrent saves
    /// interleave their slug lookups and inserts.
    struct YieldingStore {
        inner: InMemoryMasjidStore,
    }

    #[async_trait]
    impl MasjidStore for YieldingStore {
        async fn ensure_indexes(&self) -> Result<(), MasjidRepositoryError> {
            self.inner.ensure_indexes().await
        }
        async fn find_slugs_matching(
            &self,
            pattern: &SlugPattern,
        ) -> Result<Vec<String>, MasjidRepositoryError> {
            let found = self.inner.find_slugs_matching(pattern).await;
            tokio::task::yield_now().await;
            found
        }
        async fn insert_masjid(&self, masjid: &Masjid) -> Result<(), MasjidRepositoryError> {
            tokio::task::yield_now().await;
            self.inner.insert_masjid(masjid).await
        }
        async fn update_masjid(&self, masjid: &Masjid) -> Result<(), MasjidRepositoryError> {
            tokio::task::yield_now().await;
            self.inner.update_masjid(masjid).await
        }
        async fn get_masjid(&self, id: MasjidId) -> Result<Option<Masjid>, MasjidRepositoryError> {
            self.inner.get_masjid(id).await
        }
        async fn get_masjid_by_slug(
            &self,
            slug: &str,
        ) -> Result<Option<Masjid>, MasjidRepositoryError> {
            self.inner.get_masjid_by_slug(slug).await
        }
        async fn find_masajid(
            &self,
            query: &MasjidQuery,
        ) -> Result<Vec<Masjid>, MasjidRepositoryError> {
            self.inner.find_masajid(query).await
        }
        async fn insert_review(&self, review: &Review) -> Result<(), MasjidRepositoryError> {
            self.inner.insert_review(review).await
        }
        async fn find_reviews(
            &self,
            masjid_ids: &[MasjidId],
        ) -> Result<Vec<Review>, MasjidRepositoryError> {
            self.inner.find_reviews(masjid_ids).await
        }
        async fn tag_counts(&self) -> Result<Vec<TagCount>, MasjidRepositoryError> {
            self.inner.tag_counts().await
        }
        async fn top_rated(
            &self,
            min_reviews: usize,
            limit: usize,
        ) -> Result<Vec<TopMasjid>, MasjidRepositoryError> {
            self.inner.top_rated(min_reviews, limit).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_of_one_name_all_get_distinct_slugs() {
        let service = Arc::new(MasjidService::new(Arc::new(YieldingStore {
            inner: InMemoryMasjidStore::new(),
        })));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.create(request("Al Noor")).await })
            })
            .collect();

        let mut slugs = std::collections::HashSet::new();
        for handle in handles {
            let masjid = handle.await.unwrap().unwrap();
            assert!(SlugPattern::new("al-noor").unwrap().matches(&masjid.slug));
            slugs.insert(masjid.slug);
        }
        assert_eq!(slugs.len(), 20);
    }

    #[tokio::test]
    async fn test_slug_attempts_are_bounded() {
        let store = Arc::new(RacingStore::new(usize::MAX));
        let service = MasjidService::with_config(
            store.clone(),
            MasjidServiceConfig::with_max_slug_attempts(3),
        );

        let result = service.create(request("Al Noor")).await;

        match result {
            Err(MasjidRepositoryError::SlugExhausted {
                candidate,
                attempts,
            }) => {
                assert_eq!(candidate, "al-noor");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected SlugExhausted, got {:?}", other),
        }
        assert_eq!(store.written.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_missing_entry_is_not_found() {
        let service = MasjidService::new(Arc::new(RacingStore::new(0)));

        let result = service
            .update(Uuid::new_v4(), UpdateMasjidRequest::default())
            .await;

        assert!(matches!(result, Err(MasjidRepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_near_rejects_invalid_point_without_store_call() {
        let store = Arc::new(UnavailableStore::default());
        let service = MasjidService::new(store.clone());

        let result = service
            .near(GeoPoint::new(200.0, 0.0), 1000.0, None, ReadOptions::default())
            .await;

        assert!(matches!(result, Err(MasjidRepositoryError::Validation(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_search_matches_nothing() {
        let store = Arc::new(UnavailableStore::default());
        let service = MasjidService::new(store.clone());

        let found = service
            .search("  !! ", None, ReadOptions::default())
            .await
            .unwrap();

        assert!(found.is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }
}
