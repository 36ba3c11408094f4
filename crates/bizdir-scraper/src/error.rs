use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    /// Network-level failure (timeout, connection reset, TLS). Transient:
    /// retried with backoff before surfacing.
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP 429 or 5xx. Transient: retried with backoff before surfacing.
    #[error("transient HTTP status {status} from {url}")]
    TransientStatus { status: u16, url: String },

    /// Non-retriable fetch failure: 404 or any other unexpected client
    /// status. Fails the page immediately.
    #[error("permanent fetch failure for {url} (status {status})")]
    Permanent { status: u16, url: String },

    /// Search URL could not be constructed from the configured base URL.
    /// Treated like a permanent fetch failure.
    #[error("invalid search URL for \"{keyword}\": {reason}")]
    InvalidUrl { keyword: String, reason: String },

    /// All retry attempts consumed on transient failures.
    #[error("transient failures exhausted after {attempts} attempts for {url}: {last_error}")]
    TransientExhausted {
        attempts: u32,
        url: String,
        last_error: String,
    },

    /// The page lacks the result-list structure entirely — an error page,
    /// interstitial, or CAPTCHA. Distinct from a valid page with no results.
    #[error("page structure not recognized (likely a site-side block page)")]
    UnrecognizedPage,

    /// A single listing failed normalization (missing required name).
    /// Record-scoped: the listing is discarded, the task continues.
    #[error("listing rejected during normalization: {reason}")]
    Normalization { reason: String },

    /// The run-level shutdown signal fired while this fetch was pending.
    #[error("fetch cancelled by shutdown signal")]
    Cancelled,
}

impl ScraperError {
    /// `true` if this error represents a transient condition worth retrying.
    pub(crate) fn is_transient(&self) -> bool {
        matches!(
            self,
            ScraperError::Http { .. } | ScraperError::TransientStatus { .. }
        )
    }

    /// Wraps a final transient failure once the retry budget is spent.
    pub(crate) fn into_exhausted(self, attempts: u32) -> ScraperError {
        let url = match &self {
            ScraperError::Http { url, .. }
            | ScraperError::TransientStatus { url, .. }
            | ScraperError::Permanent { url, .. } => url.clone(),
            _ => String::new(),
        };
        ScraperError::TransientExhausted {
            attempts,
            url,
            last_error: self.to_string(),
        }
    }
}
