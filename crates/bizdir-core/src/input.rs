use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ConfigError;

/// Result-ordering requested from the directory's search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Relevance,
    Distance,
    Rating,
    Name,
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortMode::Relevance => write!(f, "relevance"),
            SortMode::Distance => write!(f, "distance"),
            SortMode::Rating => write!(f, "rating"),
            SortMode::Name => write!(f, "name"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unsupported output format \"{other}\"")),
        }
    }
}

/// Bad run configuration. Fatal: reported before any fetch is issued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("keyword list must not be empty")]
    EmptyKeywords,

    #[error("location list must not be empty")]
    EmptyLocations,

    #[error("{field} entry {index} is blank")]
    BlankEntry { field: &'static str, index: usize },
}

/// One crawl run's worth of configuration, as consumed from the input JSON
/// file. Operational knobs (timeouts, retry policy, pacing) come from the
/// environment instead — see [`crate::AppConfig`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlInput {
    pub keywords: Vec<String>,
    pub locations: Vec<String>,

    #[serde(default)]
    pub sort_mode: SortMode,

    /// Hard ceiling on pages fetched per search task.
    #[serde(default = "default_max_pages_per_task")]
    pub max_pages_per_task: u32,

    /// Number of search tasks crawled concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Stop paging a task once this many records have been collected from it.
    #[serde(default)]
    pub max_results_per_task: Option<usize>,

    /// `"json"` or `"csv"`. Unrecognized values fall back to JSON with a
    /// warning rather than failing the run.
    #[serde(default)]
    pub output_format: Option<String>,
}

fn default_max_pages_per_task() -> u32 {
    20
}

fn default_concurrency() -> usize {
    4
}

/// Load a [`CrawlInput`] from a JSON file.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or does not parse.
/// List contents are validated later by the query expander, which owns the
/// empty/blank-entry rules.
pub fn load_crawl_input(path: &Path) -> Result<CrawlInput, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InputFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let input: CrawlInput = serde_json::from_str(&content)?;
    Ok(input)
}
