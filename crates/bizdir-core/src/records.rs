use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A business extracted from the directory, normalized for export and
/// cross-page merging.
///
/// Field names serialize in the camelCase shape the export sinks expect
/// (`ypReviews`, `generalInfo`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    /// Display name of the business. Always non-empty after normalization;
    /// listings without a name are discarded before a record is built.
    pub name: String,

    /// Street address plus locality, joined as shown on the page. Empty when
    /// the listing had no address block.
    #[serde(default)]
    pub address: String,

    /// Phone number in E.164 (`+1XXXXXXXXXX`) when the raw value was a
    /// recognizable NANP number, otherwise the raw string unchanged.
    #[serde(default)]
    pub phone: String,

    pub email: Option<String>,

    pub website: Option<String>,

    /// Score per rating source (e.g. `"yellowpages"`, `"tripadvisor"`).
    /// Sources use different scales; no cross-scale conversion is applied.
    #[serde(default)]
    pub ratings: BTreeMap<String, RatingValue>,

    /// Business categories in first-seen page order, deduplicated.
    #[serde(default)]
    pub categories: Vec<String>,

    /// Opening hours exactly as printed — compact day ranges like
    /// `"Mon - Sat"` are not expanded into per-day entries.
    #[serde(default)]
    pub hours: Vec<HoursEntry>,

    /// Gallery image URLs in first-seen order, deduplicated.
    #[serde(default)]
    pub gallery: Vec<String>,

    /// Reviews embedded in the listing, in page order.
    #[serde(default)]
    pub yp_reviews: Vec<Review>,

    pub general_info: Option<String>,
}

/// A raw rating score: numeric when the source's value parses as a number,
/// otherwise the raw string (some sources publish letter grades).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingValue {
    Numeric(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursEntry {
    pub day: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub reviewer: String,

    /// Review date exactly as shown on the page; no date reparsing.
    #[serde(default)]
    pub review_date: String,

    /// Star rating as a number; `0.0` when absent or unparseable.
    #[serde(default)]
    pub review_rating: f64,

    #[serde(default)]
    pub review_content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_camel_case_nested_keys() {
        let record = BusinessRecord {
            name: "ZaSpa".to_string(),
            address: "13th Street, Dallas, TX 75201".to_string(),
            phone: "+12145550123".to_string(),
            yp_reviews: vec![Review {
                reviewer: "Ana".to_string(),
                review_date: "05/14/2024".to_string(),
                review_rating: 4.5,
                review_content: "Great massage.".to_string(),
            }],
            general_info: Some("Day spa.".to_string()),
            ..BusinessRecord::default()
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("ypReviews").is_some(), "expected ypReviews key");
        assert!(value.get("generalInfo").is_some(), "expected generalInfo key");
        assert_eq!(value["ypReviews"][0]["reviewDate"], "05/14/2024");
        assert_eq!(value["ypReviews"][0]["reviewRating"], 4.5);
    }

    #[test]
    fn rating_value_serializes_untagged() {
        let mut ratings = BTreeMap::new();
        ratings.insert("yellowpages".to_string(), RatingValue::Numeric(4.0));
        ratings.insert("bbb".to_string(), RatingValue::Text("A+".to_string()));

        let value = serde_json::to_value(&ratings).unwrap();
        assert_eq!(value["yellowpages"], 4.0);
        assert_eq!(value["bbb"], "A+");
    }

    #[test]
    fn rating_value_round_trips_mixed_scales() {
        let json = r#"{"tripadvisor": 8.0, "yellowpages": "3"}"#;
        let ratings: BTreeMap<String, RatingValue> = serde_json::from_str(json).unwrap();
        assert_eq!(ratings["tripadvisor"], RatingValue::Numeric(8.0));
        assert_eq!(ratings["yellowpages"], RatingValue::Text("3".to_string()));
    }
}
