//! Configuration types for the MasjidService.

/// Default number of slug attempts per save.
pub const DEFAULT_MAX_SLUG_ATTEMPTS: u32 = 5;

/// Configuration for the MasjidService.
#[derive(Debug, Clone)]
pub struct MasjidServiceConfig {
    /// How many slugs a save may try before giving up with `SlugExhausted`.
    ///
    /// The first attempt always uses the count of existing matches; every
    /// further attempt re-reads the matches and picks a random suffix above
    /// the highest one in use.
    /// Values below 1 are treated as 1.
    pub max_slug_attempts: u32,
}

impl Default for MasjidServiceConfig {
    fn default() -> Self {
        Self {
            max_slug_attempts: DEFAULT_MAX_SLUG_ATTEMPTS,
        }
    }
}

impl MasjidServiceConfig {
    /// Create a config with a custom attempt bound.
    pub fn with_max_slug_attempts(max_slug_attempts: u32) -> Self {
        Self { max_slug_attempts }
    }

    /// Create a config that never retries a slug.
    ///
    /// A collision then fails the save instead of being resolved, which is
    /// only useful to observe the count-based slug on its own.
    pub fn single_attempt() -> Self {
        Self::with_max_slug_attempts(1)
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_slug_attempts.max(1)
    }
}
