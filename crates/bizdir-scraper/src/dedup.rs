//! Cross-task record aggregation and merging.
//!
//! Tasks run concurrently but merge through one [`Aggregator`], so the "first
//! seen wins" rule for scalar fields has a single serialized definition of
//! first. Output order is first-seen order, which makes runs with the same
//! page responses reproducible.

use std::collections::HashMap;

use tokio::sync::Mutex;

use bizdir_core::BusinessRecord;

use crate::types::KeyedRecord;

/// Collects normalized records from every crawl task and merges duplicates
/// by dedup key.
#[derive(Debug, Default)]
pub struct Aggregator {
    inner: Mutex<AggregatorState>,
}

#[derive(Debug, Default)]
struct AggregatorState {
    by_key: HashMap<String, BusinessRecord>,
    // Keys in first-seen order; by_key alone would lose it.
    order: Vec<String>,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one keyed record into the aggregate. Returns `true` when the
    /// key was new, `false` when it merged into an existing record.
    pub async fn merge(&self, keyed: KeyedRecord) -> bool {
        let mut state = self.inner.lock().await;
        if let Some(existing) = state.by_key.get_mut(&keyed.dedup_key) {
            merge_into(existing, keyed.record);
            false
        } else {
            state.order.push(keyed.dedup_key.clone());
            state.by_key.insert(keyed.dedup_key, keyed.record);
            true
        }
    }

    /// Number of distinct records seen so far.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.order.is_empty()
    }

    /// Consumes the aggregator, returning records in first-seen order.
    pub fn into_records(self) -> Vec<BusinessRecord> {
        let state = self.inner.into_inner();
        let mut by_key = state.by_key;
        state
            .order
            .into_iter()
            .filter_map(|key| by_key.remove(&key))
            .collect()
    }
}

/// Merges `incoming` into `existing`.
///
/// Scalar fields keep the existing value unless it is empty; collections take
/// the union, keyed so the same fact never appears twice. A merge never
/// removes data already present.
fn merge_into(existing: &mut BusinessRecord, incoming: BusinessRecord) {
    if existing.address.is_empty() {
        existing.address = incoming.address;
    }
    if existing.phone.is_empty() {
        existing.phone = incoming.phone;
    }
    if existing.email.is_none() {
        existing.email = incoming.email;
    }
    if existing.website.is_none() {
        existing.website = incoming.website;
    }
    if existing.general_info.is_none() {
        existing.general_info = incoming.general_info;
    }

    for (source, value) in incoming.ratings {
        existing.ratings.entry(source).or_insert(value);
    }
    for category in incoming.categories {
        if !existing.categories.contains(&category) {
            existing.categories.push(category);
        }
    }
    for entry in incoming.hours {
        if !existing
            .hours
            .iter()
            .any(|h| h.day == entry.day && h.time == entry.time)
        {
            existing.hours.push(entry);
        }
    }
    for url in incoming.gallery {
        if !existing.gallery.contains(&url) {
            existing.gallery.push(url);
        }
    }
    for review in incoming.yp_reviews {
        let duplicate = existing.yp_reviews.iter().any(|r| {
            r.reviewer == review.reviewer
                && r.review_date == review.review_date
                && r.review_content == review.review_content
        });
        if !duplicate {
            existing.yp_reviews.push(review);
        }
    }
}

#[cfg(test)]
mod tests {
    use bizdir_core::{RatingValue, Review};

    use super::*;

    fn keyed(key: &str, name: &str) -> KeyedRecord {
        KeyedRecord {
            dedup_key: key.to_string(),
            record: BusinessRecord {
                name: name.to_string(),
                ..BusinessRecord::default()
            },
        }
    }

    #[tokio::test]
    async fn distinct_keys_stay_distinct_in_first_seen_order() {
        let agg = Aggregator::new();
        assert!(agg.merge(keyed("b", "Beta Spa")).await);
        assert!(agg.merge(keyed("a", "Alpha Spa")).await);
        assert!(!agg.merge(keyed("b", "Beta Spa")).await);

        let records = agg.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Beta Spa");
        assert_eq!(records[1].name, "Alpha Spa");
    }

    #[tokio::test]
    async fn scalar_fields_fill_only_when_empty() {
        let agg = Aggregator::new();
        let mut first = keyed("k", "ZaSpa");
        first.record.phone = "+12145550123".to_string();
        agg.merge(first).await;

        let mut second = keyed("k", "ZaSpa");
        second.record.phone = "+19995550000".to_string();
        second.record.address = "2332 Victory Ave".to_string();
        second.record.website = Some("https://zaspa.example.com".to_string());
        agg.merge(second).await;

        let records = agg.into_records();
        assert_eq!(records.len(), 1);
        // First-seen phone wins; missing address and website are filled.
        assert_eq!(records[0].phone, "+12145550123");
        assert_eq!(records[0].address, "2332 Victory Ave");
        assert_eq!(
            records[0].website.as_deref(),
            Some("https://zaspa.example.com")
        );
    }

    #[tokio::test]
    async fn collections_union_by_natural_key() {
        let agg = Aggregator::new();
        let mut first = keyed("k", "ZaSpa");
        first.record.categories = vec!["Day Spas".to_string()];
        first
            .record
            .ratings
            .insert("yellowpages".to_string(), RatingValue::Numeric(4.5));
        first.record.yp_reviews = vec![Review {
            reviewer: "Ana".to_string(),
            review_date: "05/14/2024".to_string(),
            review_rating: 5.0,
            review_content: "Great.".to_string(),
        }];
        agg.merge(first).await;

        let mut second = keyed("k", "ZaSpa");
        second.record.categories = vec!["Day Spas".to_string(), "Massage".to_string()];
        second
            .record
            .ratings
            .insert("yellowpages".to_string(), RatingValue::Numeric(1.0));
        second
            .record
            .ratings
            .insert("tripadvisor".to_string(), RatingValue::Numeric(8.0));
        second.record.yp_reviews = vec![
            Review {
                reviewer: "Ana".to_string(),
                review_date: "05/14/2024".to_string(),
                review_rating: 5.0,
                review_content: "Great.".to_string(),
            },
            Review {
                reviewer: "Lee".to_string(),
                review_date: "03/02/2024".to_string(),
                review_rating: 3.0,
                review_content: "Fine.".to_string(),
            },
        ];
        agg.merge(second).await;

        let records = agg.into_records();
        let record = &records[0];
        assert_eq!(record.categories, vec!["Day Spas", "Massage"]);
        assert_eq!(record.ratings["yellowpages"], RatingValue::Numeric(4.5));
        assert_eq!(record.ratings["tripadvisor"], RatingValue::Numeric(8.0));
        assert_eq!(record.yp_reviews.len(), 2);
    }

    #[tokio::test]
    async fn merging_identical_record_is_idempotent() {
        let agg = Aggregator::new();
        let mut full = keyed("k", "ZaSpa");
        full.record.address = "2332 Victory Ave".to_string();
        full.record.categories = vec!["Day Spas".to_string()];
        full.record.gallery = vec!["https://i1.ypcdn.com/a.jpg".to_string()];

        agg.merge(full.clone()).await;
        agg.merge(full.clone()).await;
        agg.merge(full).await;

        let records = agg.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].categories.len(), 1);
        assert_eq!(records[0].gallery.len(), 1);
    }

    #[tokio::test]
    async fn len_counts_distinct_records() {
        let agg = Aggregator::new();
        assert!(agg.is_empty().await);
        agg.merge(keyed("a", "A")).await;
        agg.merge(keyed("a", "A")).await;
        agg.merge(keyed("b", "B")).await;
        assert_eq!(agg.len().await, 2);
    }
}
