//! Rate-limited HTTP client for the directory's search endpoint.
//!
//! One `DirectoryClient` is shared by every crawl task, so its semaphore and
//! per-host pacing state enforce a single politeness budget for the whole
//! run regardless of task count.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use bizdir_core::{AppConfig, SortMode};

use crate::error::ScraperError;
use crate::retry::retry_with_backoff;
use crate::types::SearchTask;

/// Tuning for a [`DirectoryClient`]. Usually derived from the environment
/// via [`FetchSettings::from_app_config`]; tests construct it directly.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    /// Total attempts per page, counting the first try.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    /// Minimum spacing between requests to the same host.
    pub inter_request_delay_ms: u64,
    /// Global cap on concurrent in-flight requests.
    pub max_in_flight: usize,
}

impl FetchSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            max_attempts: config.fetch_max_attempts,
            backoff_base_ms: config.fetch_backoff_base_ms,
            inter_request_delay_ms: config.inter_request_delay_ms,
            max_in_flight: config.max_in_flight_requests,
        }
    }
}

/// HTTP client for directory search pages.
///
/// Enforces a global in-flight request cap, a minimum inter-request spacing
/// per host, and transparent retry with exponential backoff on transient
/// failures (network errors, 429, 5xx). 404 and other unexpected client
/// statuses fail immediately as [`ScraperError::Permanent`].
pub struct DirectoryClient {
    http: Client,
    base_url: String,
    max_attempts: u32,
    backoff_base_ms: u64,
    inter_request_delay_ms: u64,
    in_flight: Arc<Semaphore>,
    last_request_per_host: Mutex<HashMap<String, Instant>>,
}

impl DirectoryClient {
    /// Creates a client with the configured timeout, headers, and politeness
    /// budget.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(settings: &FetchSettings) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&settings.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| ScraperError::Http {
                url: settings.base_url.clone(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_attempts: settings.max_attempts,
            backoff_base_ms: settings.backoff_base_ms,
            inter_request_delay_ms: settings.inter_request_delay_ms,
            in_flight: Arc::new(Semaphore::new(settings.max_in_flight.max(1))),
            last_request_per_host: Mutex::new(HashMap::new()),
        })
    }

    /// Builds the search URL for one page of a task.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] when the configured base URL is
    /// not parseable.
    pub fn search_url(&self, task: &SearchTask, page: u32) -> Result<String, ScraperError> {
        let mut url = reqwest::Url::parse(&format!("{}/search", self.base_url)).map_err(|e| {
            ScraperError::InvalidUrl {
                keyword: task.keyword.clone(),
                reason: e.to_string(),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("search_terms", &task.keyword)
            .append_pair("geo_location_terms", &task.location)
            .append_pair("page", &page.to_string())
            .append_pair("sort", sort_code(task.sort));
        Ok(url.to_string())
    }

    /// Fetches one search result page for `task`, with retry, pacing, and
    /// cancellation.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Permanent`] — 404 or another non-retriable status.
    /// - [`ScraperError::TransientExhausted`] — retries spent on 429/5xx or
    ///   network failures.
    /// - [`ScraperError::InvalidUrl`] — base URL cannot form a search URL.
    /// - [`ScraperError::Cancelled`] — shutdown signal fired.
    pub async fn fetch_search_page(
        &self,
        task: &SearchTask,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<String, ScraperError> {
        let url = self.search_url(task, page)?;
        self.fetch(&url, cancel).await
    }

    /// Fetches an arbitrary URL under the client's politeness budget.
    ///
    /// # Errors
    ///
    /// Same surface as [`Self::fetch_search_page`].
    pub async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_attempts, self.backoff_base_ms, cancel, || {
            let url = url.to_string();
            async move { self.fetch_once(url).await }
        })
        .await
    }

    /// A single request attempt: acquire an in-flight permit, wait out the
    /// per-host spacing, issue the GET, classify the status.
    async fn fetch_once(&self, url: String) -> Result<String, ScraperError> {
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| ScraperError::Cancelled)?;
        self.pace_host(&url).await;

        tracing::debug!(url = %url, "GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ScraperError::Http {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(ScraperError::TransientStatus {
                status: status.as_u16(),
                url,
            });
        }
        if !status.is_success() {
            return Err(ScraperError::Permanent {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await.map_err(|e| ScraperError::Http {
            url: url.clone(),
            source: e,
        })?;
        tracing::debug!(url = %url, bytes = body.len(), "fetched page");
        Ok(body)
    }

    /// Blocks until at least `inter_request_delay_ms` has passed since the
    /// previous request to this URL's host, then reserves the slot.
    async fn pace_host(&self, url: &str) {
        if self.inter_request_delay_ms == 0 {
            return;
        }
        let host = host_of(url);
        let min_gap = Duration::from_millis(self.inter_request_delay_ms);
        loop {
            let wait = {
                let mut last = self.last_request_per_host.lock().await;
                let now = Instant::now();
                match last.get(&host) {
                    Some(prev) if now.duration_since(*prev) < min_gap => {
                        min_gap - now.duration_since(*prev)
                    }
                    _ => {
                        last.insert(host.clone(), now);
                        return;
                    }
                }
            };
            // Another request claimed the slot; sleep and re-check, since a
            // third caller may claim it again while we wait.
            tokio::time::sleep(wait).await;
        }
    }
}

/// Maps a sort mode to the directory's sort query code.
fn sort_code(sort: SortMode) -> &'static str {
    match sort {
        SortMode::Relevance => "best",
        SortMode::Distance => "distance",
        SortMode::Rating => "rating",
        SortMode::Name => "name",
    }
}

/// Extracts the hostname from a URL for pacing-map keys.
///
/// Falls back to stripping the scheme manually if the URL does not parse.
fn host_of(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            return host.to_string();
        }
    }
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(url)
        .to_string()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
