//! Result shapes of the reporting queries.

use serde::{Deserialize, Serialize};

use super::{MasjidId, Review};

/// One row of the tag frequency report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

impl TagCount {
    pub fn new(tag: impl Into<String>, count: u64) -> Self {
        Self {
            tag: tag.into(),
            count,
        }
    }
}

/// One row of the top-rated report.
///
/// Only the identifier, photo, name, joined reviews, slug and the computed
/// average are projected; every other entry field is dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopMasjid {
    pub id: MasjidId,
    pub photo: Option<String>,
    pub name: String,
    pub reviews: Vec<Review>,
    pub slug: String,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_top_masjid_uses_camel_case_average() {
        let row = TopMasjid {
            id: Uuid::new_v4(),
            photo: None,
            name: "Al Noor".to_string(),
            reviews: vec![],
            slug: "al-noor".to_string(),
            average_rating: 4.0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["averageRating"], 4.0);
        assert!(json.get("average_rating").is_none());
    }

    #[test]
    fn test_tag_count_serialization() {
        let json = serde_json::to_string(&TagCount::new("friday", 2)).unwrap();
        assert_eq!(json, r#"{"tag":"friday","count":2}"#);
    }
}
