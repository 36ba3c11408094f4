//! Business directory crawl engine.
//!
//! Pipeline: [`expand`] turns keyword and location lists into search tasks,
//! [`crawl`] schedules them against a rate-limited [`client`], [`parse`]
//! extracts listings from result pages, [`normalize`] cleans and keys them,
//! and [`dedup`] merges duplicates across tasks into the final record set.

pub mod client;
pub mod crawl;
pub mod dedup;
pub mod error;
pub mod expand;
pub mod normalize;
pub mod parse;
mod retry;
pub mod types;

pub use client::{DirectoryClient, FetchSettings};
pub use crawl::{run_crawl, CrawlOptions, TaskOutcome, TaskReport};
pub use dedup::Aggregator;
pub use error::ScraperError;
pub use expand::expand_queries;
pub use normalize::normalize_listing;
pub use parse::parse_search_page;
pub use types::{KeyedRecord, PaginationInfo, ParsedPage, RawListing, RawReview, SearchTask};
