//! Slug derivation and collision handling.
//!
//! A slug is derived from an entry's name: transliterated to ASCII,
//! lowercased, non-alphanumeric runs collapsed to single hyphens, leading and
//! trailing hyphens trimmed. Collisions are resolved with a numeric suffix.
//!
//! The first attempt for a save uses the count of existing matches
//! (`name`, `name-2`, `name-3`, ...). When the store's unique constraint
//! rejects that slug, later attempts start one above the highest suffix
//! already taken, which steps over gaps left by renamed entries, and add a
//! random offset so writers that lost the same race pick different suffixes.

use regex::{Regex, RegexBuilder};

use crate::errors::MasjidRepositoryError;

/// Used when a name has no characters that survive slugification.
pub const FALLBACK_SLUG: &str = "masjid";

/// Width of the random offset window on the first retry.
pub const RETRY_SPREAD: u64 = 32;

/// Widest offset window a retry may use.
const MAX_RETRY_SPREAD: u64 = 1 << 16;

/// Derive the candidate slug for a name. Pure and deterministic.
pub fn candidate_slug(name: &str) -> String {
    let candidate = slug::slugify(name);
    if candidate.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        candidate
    }
}

/// Case-insensitive matcher for `candidate` and `candidate-<digits>`.
#[derive(Debug, Clone)]
pub struct SlugPattern {
    candidate: String,
    source: String,
    regex: Regex,
}

impl SlugPattern {
    pub fn new(candidate: &str) -> Result<Self, MasjidRepositoryError> {
        let source = format!("^({})((-[0-9]*)?)$", regex::escape(candidate));
        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                MasjidRepositoryError::invalid_field("slug", format!("invalid slug pattern: {}", e))
            })?;

        Ok(Self {
            candidate: candidate.to_string(),
            source,
            regex,
        })
    }

    pub fn candidate(&self) -> &str {
        &self.candidate
    }

    /// The pattern text. It is also valid as a PostgreSQL `~*` operand.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, slug: &str) -> bool {
        self.regex.is_match(slug)
    }
}

/// The slug produced from the number of existing matches.
///
/// Zero matches keeps the candidate, `n` matches gives `candidate-(n+1)`.
pub fn count_based_slug(candidate: &str, matches: usize) -> String {
    if matches == 0 {
        candidate.to_string()
    } else {
        format!("{}-{}", candidate, matches + 1)
    }
}

/// The numeric suffix `slug` carries relative to `candidate`.
///
/// The bare candidate counts as 1 so the first suffixed slug is `-2`.
fn suffix_of(candidate: &str, slug: &str) -> Option<u64> {
    let slug = slug.to_lowercase();
    let candidate = candidate.to_lowercase();
    if slug == candidate {
        return Some(1);
    }
    let digits = slug.strip_prefix(&candidate)?.strip_prefix('-')?;
    if digits.is_empty() {
        return Some(0);
    }
    digits.parse::<u64>().ok()
}

/// How many suffixes above the free floor retry `attempt` may land on.
///
/// The window doubles with every retry. Attempt 1 has no window.
pub fn retry_spread(attempt: u32) -> u64 {
    match attempt {
        0 | 1 => 1,
        n => RETRY_SPREAD
            .checked_shl(n - 2)
            .unwrap_or(MAX_RETRY_SPREAD)
            .min(MAX_RETRY_SPREAD),
    }
}

/// A suffixed slug above both the match count and every suffix in use,
/// moved up by `offset`.
pub fn spread_slug(candidate: &str, existing: &[String], offset: u64) -> String {
    let highest = existing
        .iter()
        .filter_map(|slug| suffix_of(candidate, slug))
        .max()
        .unwrap_or(0);
    let next = highest
        .max(existing.len() as u64)
        .saturating_add(1)
        .saturating_add(offset);
    format!("{}-{}", candidate, next)
}
