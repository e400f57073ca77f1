//! Read filters and read options.
//!
//! `MasjidQuery` describes which entries a read returns and in what order.
//! `ReadOptions` describes what is attached to each returned entry.

use masjid_directory_shared::GeoPoint;

/// Which entries a read selects.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MasjidFilter {
    /// Every entry, newest first.
    #[default]
    All,
    /// Entries carrying the tag, newest first.
    Tag(String),
    /// Full-text search over name, description, imam and secretary names.
    /// Any term may match; best matches first.
    Text(String),
    /// Entries within `max_distance_meters` of `point`, nearest first.
    Near {
        point: GeoPoint,
        max_distance_meters: f64,
    },
}

/// A filter plus pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasjidQuery {
    pub filter: MasjidFilter,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl MasjidQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self::with_filter(MasjidFilter::Tag(tag.into()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_filter(MasjidFilter::Text(text.into()))
    }

    pub fn near(point: GeoPoint, max_distance_meters: f64) -> Self {
        Self::with_filter(MasjidFilter::Near {
            point,
            max_distance_meters,
        })
    }

    fn with_filter(filter: MasjidFilter) -> Self {
        Self {
            filter,
            skip: 0,
            limit: None,
        }
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply `skip` and `limit` to an already ordered result.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.skip);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// What a read attaches to each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Attach the reviews referencing each entry. On by default.
    pub include_reviews: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            include_reviews: true,
        }
    }
}

impl ReadOptions {
    pub fn with_reviews() -> Self {
        Self {
            include_reviews: true,
        }
    }

    pub fn without_reviews() -> Self {
        Self {
            include_reviews: false,
        }
    }
}

/// Split text into lowercase alphanumeric terms, without duplicates.
pub fn search_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
    {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}
