//! Engine-internal types: search tasks, raw parser output, pagination.
//!
//! [`RawListing`] is deliberately loose — every field is optional because the
//! directory's markup omits blocks freely. It lives only between parse and
//! normalize; [`bizdir_core::BusinessRecord`] is the durable shape.

use bizdir_core::{BusinessRecord, SortMode};

/// One keyword+location+sort combination to crawl. Immutable once created;
/// identity is the full triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTask {
    pub keyword: String,
    pub location: String,
    pub sort: SortMode,
}

impl SearchTask {
    /// Short human-readable label for logs and task reports.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} @ {}", self.keyword, self.location)
    }
}

/// Unnormalized field extraction from one listing block on one page.
/// Absent markup anchors simply leave fields unset — never an error.
#[derive(Debug, Clone, Default)]
pub struct RawListing {
    /// Site-assigned listing identifier, when the block carries one.
    pub listing_id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// `(source, raw score)` pairs in page order, e.g. `("yellowpages", "4.5")`.
    pub ratings: Vec<(String, String)>,
    pub categories: Vec<String>,
    /// `(day, time)` pairs exactly as printed.
    pub hours: Vec<(String, String)>,
    pub gallery: Vec<String>,
    pub reviews: Vec<RawReview>,
    pub general_info: Option<String>,
}

/// One review block before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawReview {
    pub reviewer: Option<String>,
    pub date: Option<String>,
    /// Raw star value, e.g. `"4.5"`; coerced to a number during normalization.
    pub rating: Option<String>,
    pub content: Option<String>,
}

/// Pagination signals extracted from a result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationInfo {
    /// `true` when a "next page" control is present on the page.
    pub has_next_page: bool,
    /// Page number from the next control's link, when it carries one.
    pub next_page: Option<u32>,
}

/// Output of parsing one search result page.
#[derive(Debug)]
pub struct ParsedPage {
    pub listings: Vec<RawListing>,
    pub pagination: PaginationInfo,
}

/// A normalized record paired with the stable identity used for merging.
#[derive(Debug, Clone)]
pub struct KeyedRecord {
    pub dedup_key: String,
    pub record: BusinessRecord,
}
