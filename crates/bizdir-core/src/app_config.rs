/// Operational settings for the crawl engine, sourced from environment
/// variables. Run-specific inputs (keywords, locations, sort) come from the
/// input file instead — see [`crate::CrawlInput`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the directory site, e.g. `https://www.yellowpages.com`.
    pub base_url: String,
    pub log_level: String,
    pub user_agent: String,
    pub accept_language: String,
    pub request_timeout_secs: u64,
    /// Total fetch attempts per page, counting the first try.
    pub fetch_max_attempts: u32,
    /// Base delay for exponential backoff between retries.
    pub fetch_backoff_base_ms: u64,
    /// Minimum spacing between any two requests to the same host.
    pub inter_request_delay_ms: u64,
    /// Global cap on in-flight HTTP requests across all tasks.
    pub max_in_flight_requests: usize,
}
