//! Review types.
//!
//! Reviews reference their masjid by id. The entry does not own them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MasjidId, ReviewId, UserId};
use crate::validation::{optional_text, FieldError, Validator};

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// A stored review of a masjid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: ReviewId,
    /// The reviewed entry.
    pub masjid: MasjidId,
    pub author: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub rating: f64,
    pub created: DateTime<Utc>,
}

/// A review as submitted, before it is given an id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub masjid: MasjidId,
    pub author: UserId,
    #[serde(default)]
    pub text: Option<String>,
    pub rating: f64,
}

impl NewReview {
    /// Validate the submission and turn it into a storable review.
    pub fn into_review(self) -> Result<Review, Vec<FieldError>> {
        let mut validator = Validator::new();
        if !self.rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            validator.missing("rating");
        }
        validator.finish()?;

        Ok(Review {
            id: Uuid::new_v4(),
            masjid: self.masjid,
            author: self.author,
            text: optional_text(self.text),
            rating: self.rating,
            created: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(rating: f64) -> NewReview {
        NewReview {
            masjid: Uuid::new_v4(),
            author: Uuid::new_v4(),
            text: Some("  Clean wudu area ".to_string()),
            rating,
        }
    }

    #[test]
    fn test_into_review_trims_text() {
        let review = submission(4.0).into_review().unwrap();
        assert_eq!(review.text.as_deref(), Some("Clean wudu area"));
        assert_eq!(review.rating, 4.0);
    }

    #[test]
    fn test_into_review_rejects_out_of_range() {
        for rating in [0.0, 5.5, f64::NAN, f64::INFINITY] {
            let errors = submission(rating).into_review().unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "rating");
        }
    }

    #[test]
    fn test_into_review_accepts_bounds() {
        assert!(submission(MIN_RATING).into_review().is_ok());
        assert!(submission(MAX_RATING).into_review().is_ok());
    }
}
