//! Reporting pipelines over in-process collections.
//!
//! These functions are the reference form of the two aggregation queries and
//! of the review join. The in-process store runs them directly; the
//! PostgreSQL store expresses the same stages in SQL.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use masjid_directory_shared::{Masjid, MasjidId, MasjidView, Review, TagCount, TopMasjid};

/// Entries with fewer reviews than this never appear in the top-rated report.
pub const TOP_RATED_MIN_REVIEWS: usize = 2;

/// Maximum number of rows in the top-rated report.
pub const TOP_RATED_LIMIT: usize = 10;

/// Unwind → group → count → sort by count descending.
///
/// Ties come out in tag order, which callers must not rely on.
pub fn tag_frequency<'a, I>(masajid: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a Masjid>,
{
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for tag in masajid.into_iter().flat_map(|m| m.tags.iter()) {
        *counts.entry(tag.as_str()).or_insert(0) += 1;
    }

    let mut rows: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount::new(tag, count))
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Arithmetic mean of the ratings, `None` for an empty slice.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: f64 = reviews.iter().map(|r| r.rating).sum();
    Some(total / reviews.len() as f64)
}

/// Group reviews by the entry they reference, keeping their order.
pub fn group_reviews(reviews: impl IntoIterator<Item = Review>) -> HashMap<MasjidId, Vec<Review>> {
    let mut grouped: HashMap<MasjidId, Vec<Review>> = HashMap::new();
    for review in reviews {
        grouped.entry(review.masjid).or_default().push(review);
    }
    grouped
}

/// Lookup → match → project → sort → limit.
///
/// Each entry is joined with the reviews referencing it; entries with fewer
/// than `min_reviews` are dropped; the rest are projected to `TopMasjid`,
/// sorted by average rating (highest first, then oldest entry first) and
/// truncated to `limit`.
pub fn top_rated<'a, I>(
    masajid: I,
    reviews: &[Review],
    min_reviews: usize,
    limit: usize,
) -> Vec<TopMasjid>
where
    I: IntoIterator<Item = &'a Masjid>,
{
    let mut by_masjid = group_reviews(reviews.iter().cloned());

    let mut rows: Vec<(&Masjid, TopMasjid)> = masajid
        .into_iter()
        .filter_map(|masjid| {
            let joined = by_masjid.remove(&masjid.id).unwrap_or_default();
            if joined.len() < min_reviews {
                return None;
            }
            let average = average_rating(&joined)?;
            Some((
                masjid,
                TopMasjid {
                    id: masjid.id,
                    photo: masjid.photo.clone(),
                    name: masjid.name.clone(),
                    reviews: joined,
                    slug: masjid.slug.clone(),
                    average_rating: average,
                },
            ))
        })
        .collect();

    rows.sort_by(|(a, a_row), (b, b_row)| {
        b_row
            .average_rating
            .partial_cmp(&a_row.average_rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.created.cmp(&b.created))
            .then_with(|| a.id.cmp(&b.id))
    });
    rows.truncate(limit);
    rows.into_iter().map(|(_, row)| row).collect()
}

/// Attach to each entry exactly the reviews that reference it.
pub fn attach_reviews(masajid: Vec<Masjid>, reviews: Vec<Review>) -> Vec<MasjidView> {
    let mut by_masjid = group_reviews(reviews);
    masajid
        .into_iter()
        .map(|masjid| {
            let joined = by_masjid.remove(&masjid.id).unwrap_or_default();
            MasjidView::with_reviews(masjid, joined)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use masjid_directory_shared::Location;
    use uuid::Uuid;

    fn masjid(name: &str, tags: &[&str]) -> Masjid {
        Masjid {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            imam_name: "Imam".to_string(),
            imam_phone_no: 1,
            sec_name: "Secretary".to_string(),
            sec_phone_no: 2,
            population: 100,
            langservice: "English".to_string(),
            bank: None,
            website: None,
            acctname: None,
            acctno: None,
            madrasah_name: None,
            madrasah_phone_no: None,
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created: Utc::now(),
            location: Location::new([3.38, 6.52], "1 Broad St", "Lagos", "Lagos", "Nigeria"),
            photo: Some(format!("{}.jpg", name)),
            author: Uuid::new_v4(),
        }
    }

    fn review(masjid: &Masjid, rating: f64) -> Review {
        Review {
            id: Uuid::new_v4(),
            masjid: masjid.id,
            author: Uuid::new_v4(),
            text: None,
            rating,
            created: Utc::now(),
        }
    }

    #[test]
    fn test_tag_frequency_example() {
        let masajid = vec![
            masjid("A", &["halal", "friday"]),
            masjid("B", &["friday"]),
            masjid("C", &[]),
        ];
        assert_eq!(
            tag_frequency(&masajid),
            vec![TagCount::new("friday", 2), TagCount::new("halal", 1)]
        );
    }

    #[test]
    fn test_tag_frequency_counts_duplicates_within_an_entry() {
        let masajid = vec![masjid("A", &["quran", "quran"])];
        assert_eq!(tag_frequency(&masajid), vec![TagCount::new("quran", 2)]);
    }

    #[test]
    fn test_tag_frequency_empty() {
        let masajid: Vec<Masjid> = vec![masjid("A", &[])];
        assert!(tag_frequency(&masajid).is_empty());
    }

    #[test]
    fn test_top_rated_floor_and_average() {
        let single = masjid("Single", &[]);
        let pair = masjid("Pair", &[]);
        let reviews = vec![review(&single, 5.0), review(&pair, 5.0), review(&pair, 3.0)];

        let rows = top_rated(&[single, pair.clone()], &reviews, TOP_RATED_MIN_REVIEWS, TOP_RATED_LIMIT);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, pair.id);
        assert_eq!(rows[0].average_rating, 4.0);
        assert_eq!(rows[0].reviews.len(), 2);
        assert_eq!(rows[0].slug, "pair");
        assert_eq!(rows[0].photo.as_deref(), Some("Pair.jpg"));
    }

    #[test]
    fn test_top_rated_cap_and_order() {
        let masajid: Vec<Masjid> = (0..15).map(|i| masjid(&format!("M{}", i), &[])).collect();
        let mut reviews = Vec::new();
        for (i, m) in masajid.iter().enumerate() {
            let rating = 1.0 + (i as f64) * 0.25;
            reviews.push(review(m, rating));
            reviews.push(review(m, rating));
        }

        let rows = top_rated(&masajid, &reviews, TOP_RATED_MIN_REVIEWS, TOP_RATED_LIMIT);

        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].name, "M14");
        assert!(rows
            .windows(2)
            .all(|w| w[0].average_rating >= w[1].average_rating));
    }

    #[test]
    fn test_top_rated_ties_put_the_oldest_entry_first() {
        let mut older = masjid("Older", &[]);
        older.created = Utc::now() - chrono::Duration::days(30);
        let newer = masjid("Newer", &[]);
        let reviews = vec![
            review(&newer, 4.0),
            review(&newer, 5.0),
            review(&older, 5.0),
            review(&older, 4.0),
        ];

        let rows = top_rated(&[newer, older.clone()], &reviews, TOP_RATED_MIN_REVIEWS, TOP_RATED_LIMIT);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, older.id);
        assert_eq!(rows[0].average_rating, rows[1].average_rating);
    }

    #[test]
    fn test_average_rating() {
        let m = masjid("A", &[]);
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[review(&m, 2.0), review(&m, 5.0)]), Some(3.5));
    }

    #[test]
    fn test_attach_reviews_is_exact() {
        let a = masjid("A", &[]);
        let b = masjid("B", &[]);
        let orphan_target = masjid("Gone", &[]);
        let reviews = vec![review(&a, 4.0), review(&b, 2.0), review(&a, 5.0), review(&orphan_target, 1.0)];

        let views = attach_reviews(vec![a.clone(), b.clone()], reviews);

        let a_reviews = views[0].reviews.as_ref().unwrap();
        assert_eq!(a_reviews.len(), 2);
        assert!(a_reviews.iter().all(|r| r.masjid == a.id));
        assert_eq!(a_reviews[0].rating, 4.0);
        let b_reviews = views[1].reviews.as_ref().unwrap();
        assert_eq!(b_reviews.len(), 1);
        assert_eq!(b_reviews[0].masjid, b.id);
    }
}
