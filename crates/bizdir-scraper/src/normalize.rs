//! Raw listing cleanup: trim, canonicalize, and key each listing for merging.
//!
//! Normalization is record-scoped. A listing that fails (no usable name) is
//! discarded with a warning while the rest of the page proceeds; it never
//! fails the task.

use bizdir_core::{BusinessRecord, HoursEntry, RatingValue, Review};
use sha2::{Digest, Sha256};

use crate::error::ScraperError;
use crate::types::{KeyedRecord, RawListing, RawReview};

/// Converts one raw listing into a [`KeyedRecord`].
///
/// The dedup key is the site-assigned listing id when present, otherwise a
/// content hash of the normalized name and address.
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] when the listing has no name.
pub fn normalize_listing(raw: RawListing) -> Result<KeyedRecord, ScraperError> {
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ScraperError::Normalization {
            reason: "listing has no business name".to_string(),
        })?
        .to_string();

    let address = raw.address.as_deref().map(str::trim).unwrap_or_default().to_string();

    let record = BusinessRecord {
        name,
        address,
        phone: raw
            .phone
            .as_deref()
            .map(normalize_phone)
            .unwrap_or_default(),
        email: trimmed_opt(raw.email),
        website: trimmed_opt(raw.website),
        ratings: raw
            .ratings
            .into_iter()
            .filter_map(|(source, value)| {
                let source = source.trim().to_string();
                let value = value.trim().to_string();
                if source.is_empty() || value.is_empty() {
                    return None;
                }
                Some((source, rating_value(&value)))
            })
            // BTreeMap::from_iter keeps the LAST duplicate; collect manually
            // so the first-seen source wins.
            .fold(std::collections::BTreeMap::new(), |mut map, (k, v)| {
                map.entry(k).or_insert(v);
                map
            }),
        categories: dedup_in_order(raw.categories),
        hours: raw
            .hours
            .into_iter()
            .map(|(day, time)| HoursEntry {
                day: day.trim().to_string(),
                time: time.trim().to_string(),
            })
            .filter(|h| !h.day.is_empty() || !h.time.is_empty())
            .collect(),
        gallery: dedup_in_order(raw.gallery),
        yp_reviews: raw.reviews.into_iter().map(normalize_review).collect(),
        general_info: trimmed_opt(raw.general_info),
    };

    let dedup_key = match raw.listing_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => content_key(&record.name, &record.address),
    };

    Ok(KeyedRecord { dedup_key, record })
}

/// Canonicalizes a US/Canada phone number to E.164 (`+1XXXXXXXXXX`).
///
/// Ten digits get a `+1` prefix; eleven digits starting with `1` keep it.
/// Anything else is passed through verbatim so no data is lost.
fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => format!("+1{digits}"),
        11 if digits.starts_with('1') => format!("+{digits}"),
        _ => raw.trim().to_string(),
    }
}

/// Numeric when the raw score parses as a float, otherwise kept as text
/// (some syndicated sources publish letter grades).
fn rating_value(raw: &str) -> RatingValue {
    raw.parse::<f64>()
        .map_or_else(|_| RatingValue::Text(raw.to_string()), RatingValue::Numeric)
}

fn normalize_review(raw: RawReview) -> Review {
    Review {
        reviewer: raw.reviewer.as_deref().map(str::trim).unwrap_or_default().to_string(),
        review_date: raw.date.as_deref().map(str::trim).unwrap_or_default().to_string(),
        review_rating: raw
            .rating
            .as_deref()
            .and_then(|r| r.trim().parse::<f64>().ok())
            .unwrap_or(0.0),
        review_content: raw.content.as_deref().map(str::trim).unwrap_or_default().to_string(),
    }
}

/// Stable content identity for listings the site did not assign an id to:
/// SHA-256 over the lowercased, whitespace-collapsed name and address.
fn content_key(name: &str, address: &str) -> String {
    let canonical = format!("{}|{}", collapse_lower(name), collapse_lower(address));
    let digest = Sha256::digest(canonical.as_bytes());
    format!("{digest:x}")
}

fn collapse_lower(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn dedup_in_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}
