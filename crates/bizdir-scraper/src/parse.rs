//! Structural extraction of business listings from search result pages.
//!
//! Pure functions: HTML in, [`ParsedPage`] out, no I/O. Extraction is
//! anchor-based and tolerant — each field is pulled from its known markup
//! anchor and simply omitted when the anchor is missing. The only hard
//! failure is [`ScraperError::UnrecognizedPage`], raised when the page has
//! no result-list structure at all (error pages, interstitials, CAPTCHAs),
//! which the scheduler treats as a site-side block rather than "no results".

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;
use crate::types::{PaginationInfo, ParsedPage, RawListing, RawReview};

/// Parses one search result page into raw listings plus pagination signals.
///
/// # Errors
///
/// Returns [`ScraperError::UnrecognizedPage`] when the result-list container
/// is absent. A structurally valid page with zero listings is a success.
pub fn parse_search_page(html: &str) -> Result<ParsedPage, ScraperError> {
    let document = Html::parse_document(html);
    let sel = Selectors::get();

    if document.select(&sel.results_container).next().is_none() {
        return Err(ScraperError::UnrecognizedPage);
    }

    let listings: Vec<RawListing> = document
        .select(&sel.listing)
        .map(|el| parse_listing(&el, sel))
        .collect();
    let pagination = parse_pagination(&document, sel);

    tracing::debug!(
        listings = listings.len(),
        has_next = pagination.has_next_page,
        "parsed search page"
    );
    Ok(ParsedPage {
        listings,
        pagination,
    })
}

fn parse_listing(el: &ElementRef<'_>, sel: &Selectors) -> RawListing {
    let block_text = element_text(el);

    let listing_id = el
        .value()
        .attr("data-ypid")
        .or_else(|| el.value().attr("data-listing-id"))
        .map(str::to_string);

    let name = first_text(el, &sel.name_primary)
        .or_else(|| first_text(el, &sel.name_itemprop))
        .or_else(|| first_text(el, &sel.name_heading));

    RawListing {
        listing_id,
        name,
        address: extract_address(el, sel),
        phone: extract_phone(el, sel, &block_text),
        email: email_re().find(&block_text).map(|m| m.as_str().to_string()),
        website: el
            .select(&sel.website)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string),
        ratings: extract_ratings(el, sel),
        categories: extract_categories(el, sel),
        hours: extract_hours(el, sel),
        gallery: extract_gallery(el, sel),
        reviews: extract_reviews(el, sel),
        general_info: first_text(el, &sel.general_info),
    }
}

fn extract_address(el: &ElementRef<'_>, sel: &Selectors) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(street) = first_text(el, &sel.street_address) {
        parts.push(street);
    }
    if let Some(locality) = first_text(el, &sel.locality) {
        parts.push(locality);
    }
    if !parts.is_empty() {
        return Some(parts.join(", "));
    }
    first_text(el, &sel.adr)
}

fn extract_phone(el: &ElementRef<'_>, sel: &Selectors, block_text: &str) -> Option<String> {
    if let Some(text) = first_text(el, &sel.phones) {
        return Some(text);
    }
    if let Some(link) = el.select(&sel.phone_link).next() {
        if let Some(href) = link.value().attr("href") {
            let number = clean_text(href.trim_start_matches("tel:"));
            if !number.is_empty() {
                return Some(number);
            }
        }
    }
    phone_re()
        .find(block_text)
        .map(|m| clean_text(m.as_str()))
}

fn extract_ratings(el: &ElementRef<'_>, sel: &Selectors) -> Vec<(String, String)> {
    let mut ratings = Vec::new();

    // The directory's own star widget exposes the value in an aria-label
    // like "4.5 star rating". Star labels inside review blocks belong to the
    // reviews, not the listing, so those subtrees are skipped.
    for labelled in el.select(&sel.aria_labelled) {
        if inside_review_block(&labelled) {
            continue;
        }
        if let Some(label) = labelled.value().attr("aria-label") {
            if let Some(caps) = star_label_re().captures(label) {
                ratings.push(("yellowpages".to_string(), caps[1].to_string()));
                break;
            }
        }
    }
    if ratings.is_empty() {
        // Older markup prints the stars as plain text inside the ratings
        // widget.
        if let Some(widget_text) = first_text(el, &sel.ratings_widget) {
            if let Some(caps) = star_text_re().captures(&widget_text) {
                ratings.push(("yellowpages".to_string(), caps[1].to_string()));
            }
        }
    }

    // Syndicated TripAdvisor widget; scale differs from the site's own and
    // is passed through raw.
    if let Some(widget) = el.select(&sel.tripadvisor).next() {
        let raw = widget
            .value()
            .attr("data-tripadvisor-rating")
            .map(str::to_string)
            .or_else(|| Some(element_text(&widget)).filter(|t| !t.is_empty()));
        if let Some(raw) = raw {
            ratings.push(("tripadvisor".to_string(), raw));
        }
    }

    ratings
}

fn extract_categories(el: &ElementRef<'_>, sel: &Selectors) -> Vec<String> {
    let mut categories: Vec<String> = el
        .select(&sel.categories_links)
        .map(|a| element_text(&a))
        .filter(|t| !t.is_empty())
        .collect();
    if categories.is_empty() {
        categories = el
            .select(&sel.categories_fallback)
            .map(|a| element_text(&a))
            .filter(|t| !t.is_empty())
            .collect();
    }
    categories
}

fn extract_hours(el: &ElementRef<'_>, sel: &Selectors) -> Vec<(String, String)> {
    let mut items: Vec<ElementRef<'_>> = el.select(&sel.open_hours_li).collect();
    if items.is_empty() {
        items = el.select(&sel.hours_li_fallback).collect();
    }

    items
        .into_iter()
        .filter_map(|li| {
            let text = element_text(&li);
            if text.is_empty() {
                return None;
            }
            // "Mon - Fri: 9:00 am - 6:00 pm" splits into day and time on the
            // first colon; lines without one are all time.
            match text.split_once(':') {
                Some((day, time)) => Some((clean_text(day), clean_text(time))),
                None => Some((String::new(), text)),
            }
        })
        .collect()
}

fn extract_gallery(el: &ElementRef<'_>, sel: &Selectors) -> Vec<String> {
    el.select(&sel.img)
        .filter_map(|img| {
            img.value()
                .attr("src")
                .or_else(|| img.value().attr("data-src"))
        })
        .filter(|src| src.contains("ypcdn.com") || src.contains("yellowpages"))
        .map(str::to_string)
        .collect()
}

fn extract_reviews(el: &ElementRef<'_>, sel: &Selectors) -> Vec<RawReview> {
    el.select(&sel.review_block)
        .map(|block| {
            let rating = block.select(&sel.aria_labelled).find_map(|labelled| {
                labelled
                    .value()
                    .attr("aria-label")
                    .and_then(|label| star_label_re().captures(label))
                    .map(|caps| caps[1].to_string())
            });
            let content = first_text(&block, &sel.review_content)
                .or_else(|| Some(element_text(&block)).filter(|t| !t.is_empty()));
            RawReview {
                reviewer: first_text(&block, &sel.reviewer),
                date: first_text(&block, &sel.review_date),
                rating,
                content,
            }
        })
        .collect()
}

fn parse_pagination(document: &Html, sel: &Selectors) -> PaginationInfo {
    let next = document.select(&sel.next_link).next();
    match next {
        Some(link) => PaginationInfo {
            has_next_page: true,
            next_page: link
                .value()
                .attr("href")
                .and_then(|href| query_param(href, "page"))
                .and_then(|v| v.parse::<u32>().ok()),
        },
        None => PaginationInfo {
            has_next_page: false,
            next_page: None,
        },
    }
}

/// `true` when the element sits inside a review block, whose star labels
/// must not be read as the listing's own rating.
fn inside_review_block(el: &ElementRef<'_>) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
        ancestor
            .value()
            .classes()
            .any(|class| class == "review-item" || class == "review")
    })
}

/// Extracts the value of a named query parameter from a URL or href string.
/// Handles relative hrefs, which `Url::parse` rejects.
fn query_param(href: &str, param: &str) -> Option<String> {
    let query_start = href.find('?')? + 1;
    let query = &href[query_start..];
    let needle = format!("{param}=");
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix(needle.as_str()) {
            let value = value.split('#').next().unwrap_or(value);
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Whole-subtree text with whitespace collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_text(el: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    el.select(selector)
        .next()
        .map(|e| element_text(&e))
        .filter(|t| !t.is_empty())
}

fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\(?\d{3}\)?\s*[-.]?\s*\d{3}\s*[-.]?\s*\d{4}").expect("valid phone regex")
    })
}

fn star_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+(?:\.\d+)?)\s*star rating").expect("valid star label regex")
    })
}

fn star_text_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*star").expect("valid star text regex")
    })
}

/// All selectors are static strings parsed once; `expect` can only fire on a
/// typo caught by the parse tests.
struct Selectors {
    results_container: Selector,
    listing: Selector,
    name_primary: Selector,
    name_itemprop: Selector,
    name_heading: Selector,
    street_address: Selector,
    locality: Selector,
    adr: Selector,
    phones: Selector,
    phone_link: Selector,
    website: Selector,
    aria_labelled: Selector,
    ratings_widget: Selector,
    tripadvisor: Selector,
    categories_links: Selector,
    categories_fallback: Selector,
    open_hours_li: Selector,
    hours_li_fallback: Selector,
    img: Selector,
    review_block: Selector,
    reviewer: Selector,
    review_date: Selector,
    review_content: Selector,
    general_info: Selector,
    next_link: Selector,
}

impl Selectors {
    fn get() -> &'static Selectors {
        static CELL: OnceLock<Selectors> = OnceLock::new();
        CELL.get_or_init(|| {
            let s = |css: &str| Selector::parse(css).expect("static selector");
            Selectors {
                results_container: s("div.search-results"),
                listing: s("div.search-results div.result, div.search-results div.srp-listing"),
                name_primary: s("a.business-name"),
                name_itemprop: s(r#"a[itemprop="name"]"#),
                name_heading: s("h2"),
                street_address: s("div.street-address"),
                locality: s("div.locality"),
                adr: s("p.adr"),
                phones: s("div.phones"),
                phone_link: s(r#"a[href^="tel:"]"#),
                website: s("a.track-visit-website"),
                aria_labelled: s("[aria-label]"),
                ratings_widget: s("div.ratings"),
                tripadvisor: s("span.tripadvisor-rating, [data-tripadvisor-rating]"),
                categories_links: s("div.categories a"),
                categories_fallback: s(r#"span[class*="category"], a[class*="category"]"#),
                open_hours_li: s("div.open-hours li"),
                hours_li_fallback: s(r#"div[class*="hours"] li"#),
                img: s("img"),
                review_block: s("div.review-item, div.review"),
                reviewer: s("span.reviewer"),
                review_date: s("span.date, span.review-date"),
                review_content: s("p"),
                general_info: s("p.body-text, div.general-info"),
                next_link: s(r#"a.next, a[rel="next"]"#),
            }
        })
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
