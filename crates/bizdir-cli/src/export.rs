//! Record export: pretty JSON or flat CSV.
//!
//! CSV cells for nested fields (ratings, hours, reviews) carry the field's
//! JSON encoding, so the flat file loses no data relative to the JSON export.

use std::io::Write;

use anyhow::Context;

use bizdir_core::BusinessRecord;

/// Column order for CSV export. Matches the JSON key order so the two
/// formats line up when eyeballed side by side.
const CSV_COLUMNS: [&str; 11] = [
    "name",
    "address",
    "phone",
    "email",
    "website",
    "ratings",
    "categories",
    "hours",
    "gallery",
    "ypReviews",
    "generalInfo",
];

/// Writes all records as a pretty-printed JSON array.
pub fn write_json<W: Write>(out: &mut W, records: &[BusinessRecord]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, records).context("serializing records to JSON")?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Writes all records as CSV with a header row.
///
/// Scalar fields are written as plain text; collection fields are written as
/// the JSON encoding of the field value.
pub fn write_csv<W: Write>(out: &mut W, records: &[BusinessRecord]) -> anyhow::Result<()> {
    write_csv_row(out, &CSV_COLUMNS.map(String::from))?;
    for record in records {
        let row = csv_row(record)?;
        write_csv_row(out, &row)?;
    }
    Ok(())
}

fn csv_row(record: &BusinessRecord) -> anyhow::Result<[String; 11]> {
    Ok([
        record.name.clone(),
        record.address.clone(),
        record.phone.clone(),
        record.email.clone().unwrap_or_default(),
        record.website.clone().unwrap_or_default(),
        json_cell(&record.ratings, record.ratings.is_empty())?,
        json_cell(&record.categories, record.categories.is_empty())?,
        json_cell(&record.hours, record.hours.is_empty())?,
        json_cell(&record.gallery, record.gallery.is_empty())?,
        json_cell(&record.yp_reviews, record.yp_reviews.is_empty())?,
        record.general_info.clone().unwrap_or_default(),
    ])
}

/// JSON-encodes a nested field for a CSV cell; empty collections become
/// empty cells instead of `[]`/`{}` noise.
fn json_cell<T: serde::Serialize>(value: &T, is_empty: bool) -> anyhow::Result<String> {
    if is_empty {
        return Ok(String::new());
    }
    serde_json::to_string(value).context("serializing nested field for CSV")
}

fn write_csv_row<W: Write>(out: &mut W, cells: &[String; 11]) -> anyhow::Result<()> {
    let line = cells
        .iter()
        .map(|cell| csv_escape(cell))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{line}")?;
    Ok(())
}

/// RFC 4180 quoting: cells containing a comma, quote, or newline are wrapped
/// in double quotes with inner quotes doubled.
fn csv_escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use bizdir_core::{HoursEntry, RatingValue, Review};

    use super::*;

    fn sample_record() -> BusinessRecord {
        let mut record = BusinessRecord {
            name: "ZaSpa".to_string(),
            address: "2332 Victory Ave, Dallas, TX 75219".to_string(),
            phone: "+12145550123".to_string(),
            website: Some("https://zaspa.example.com".to_string()),
            categories: vec!["Day Spas".to_string(), "Massage".to_string()],
            hours: vec![HoursEntry {
                day: "Mon - Fri".to_string(),
                time: "9:00 am - 6:00 pm".to_string(),
            }],
            yp_reviews: vec![Review {
                reviewer: "Ana".to_string(),
                review_date: "05/14/2024".to_string(),
                review_rating: 5.0,
                review_content: "Great, relaxing.".to_string(),
            }],
            ..BusinessRecord::default()
        };
        record
            .ratings
            .insert("yellowpages".to_string(), RatingValue::Numeric(4.5));
        record
    }

    #[test]
    fn json_export_is_an_array_with_camel_case_keys() {
        let mut out = Vec::new();
        write_json(&mut out, &[sample_record()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["name"], "ZaSpa");
        assert!(parsed[0].get("ypReviews").is_some());
    }

    #[test]
    fn csv_header_matches_column_order() {
        let mut out = Vec::new();
        write_csv(&mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "name,address,phone,email,website,ratings,categories,hours,gallery,ypReviews,generalInfo"
        );
    }

    #[test]
    fn csv_quotes_cells_containing_commas_and_quotes() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn csv_nested_fields_are_json_encoded() {
        let mut out = Vec::new();
        write_csv(&mut out, &[sample_record()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let data_line = text.lines().nth(1).unwrap();
        // The ratings cell holds a JSON object (quoted because of its commas
        // and inner quotes).
        assert!(
            data_line.contains("\"{\"\"yellowpages\"\":4.5}\""),
            "line: {data_line}"
        );
        assert!(data_line.contains("reviewRating"), "line: {data_line}");
    }

    #[test]
    fn csv_empty_collections_are_empty_cells() {
        let record = BusinessRecord {
            name: "Bare".to_string(),
            ..BusinessRecord::default()
        };
        let mut out = Vec::new();
        write_csv(&mut out, &[record]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1).unwrap(), "Bare,,,,,,,,,,");
    }
}
