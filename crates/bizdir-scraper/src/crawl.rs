//! Crawl scheduling: runs search tasks concurrently, pages each one
//! sequentially, and routes every extracted listing through the shared
//! aggregator.
//!
//! Failure isolation is per task. A task that fails or gets blocked reports
//! that in its [`TaskReport`]; the records it merged before stopping stay in
//! the aggregate, and the other tasks keep running.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::client::DirectoryClient;
use crate::dedup::Aggregator;
use crate::error::ScraperError;
use crate::normalize::normalize_listing;
use crate::parse::parse_search_page;
use crate::types::SearchTask;

#[derive(Debug, Clone, Copy)]
pub struct CrawlOptions {
    /// Upper bound on result pages fetched per task.
    pub max_pages_per_task: u32,
    /// Number of tasks crawled concurrently.
    pub max_concurrent_tasks: usize,
    /// Optional cap on listings extracted per task, counted before
    /// cross-task deduplication.
    pub max_records_per_task: Option<usize>,
}

/// How one task ended.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Ran out of pages, results, or budget normally.
    Completed,
    /// The site served a page with no recognizable result structure, which
    /// usually means a CAPTCHA or block interstitial.
    Blocked { reason: String },
    /// A page-level fetch failure ended the task early.
    Failed { error: ScraperError },
}

/// Per-task result: what happened plus how much was harvested before it
/// stopped.
#[derive(Debug)]
pub struct TaskReport {
    pub task: SearchTask,
    pub outcome: TaskOutcome,
    /// Pages successfully fetched and parsed.
    pub pages_fetched: u32,
    /// Listings this task normalized and submitted to the aggregator,
    /// counted before deduplication.
    pub records_extracted: usize,
}

impl TaskReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Completed)
    }
}

/// Crawls every task, merging extracted records into `aggregator`.
///
/// Reports come back in the same order as `tasks` regardless of completion
/// order. Cancellation stops new fetches promptly; records already merged
/// are kept.
pub async fn run_crawl(
    client: Arc<DirectoryClient>,
    tasks: Vec<SearchTask>,
    options: CrawlOptions,
    aggregator: &Aggregator,
    cancel: &CancellationToken,
) -> Vec<TaskReport> {
    let concurrency = options.max_concurrent_tasks.max(1);
    let mut reports: Vec<(usize, TaskReport)> = stream::iter(tasks.into_iter().enumerate())
        .map(|(index, task)| {
            let client = Arc::clone(&client);
            let cancel = cancel.clone();
            async move {
                let report = crawl_task(&client, task, options, aggregator, &cancel).await;
                (index, report)
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    reports.sort_by_key(|(index, _)| *index);
    reports.into_iter().map(|(_, report)| report).collect()
}

/// Crawls one task page by page until a stop condition is hit.
async fn crawl_task(
    client: &DirectoryClient,
    task: SearchTask,
    options: CrawlOptions,
    aggregator: &Aggregator,
    cancel: &CancellationToken,
) -> TaskReport {
    let label = task.label();
    tracing::info!(task = %label, "task started");

    let mut pages_fetched = 0u32;
    let mut records_extracted = 0usize;
    let mut page = 1u32;

    let outcome = loop {
        if cancel.is_cancelled() {
            break TaskOutcome::Failed {
                error: ScraperError::Cancelled,
            };
        }

        let html = match client.fetch_search_page(&task, page, cancel).await {
            Ok(html) => html,
            // A permanent fetch failure past the first page means pagination
            // ran off the end of the result set (404, or the site refusing
            // deep pages); the task is done, keeping what it has.
            Err(ScraperError::Permanent { .. }) if page > 1 => {
                break TaskOutcome::Completed;
            }
            Err(error) => {
                break TaskOutcome::Failed { error };
            }
        };

        let parsed = match parse_search_page(&html) {
            Ok(parsed) => parsed,
            Err(err @ ScraperError::UnrecognizedPage) => {
                break TaskOutcome::Blocked {
                    reason: err.to_string(),
                };
            }
            Err(error) => {
                break TaskOutcome::Failed { error };
            }
        };
        pages_fetched += 1;

        let listing_count = parsed.listings.len();
        let mut capped = false;
        for raw in parsed.listings {
            if options
                .max_records_per_task
                .is_some_and(|cap| records_extracted >= cap)
            {
                capped = true;
                break;
            }
            match normalize_listing(raw) {
                Ok(keyed) => {
                    aggregator.merge(keyed).await;
                    records_extracted += 1;
                }
                Err(err) => {
                    tracing::warn!(task = %label, page, error = %err, "listing discarded");
                }
            }
        }
        tracing::debug!(
            task = %label,
            page,
            listings = listing_count,
            total = records_extracted,
            "page processed"
        );

        let cap_reached = options
            .max_records_per_task
            .is_some_and(|cap| records_extracted >= cap);
        // The page ceiling counts pages actually processed, so it holds even
        // when the site's next links loop back on themselves.
        if capped
            || cap_reached
            || listing_count == 0
            || !parsed.pagination.has_next_page
            || pages_fetched >= options.max_pages_per_task
        {
            break TaskOutcome::Completed;
        }
        // Only ever move forward; a next link pointing at the current or an
        // earlier page would otherwise refetch it.
        page = parsed
            .pagination
            .next_page
            .filter(|&next| next > page)
            .unwrap_or(page + 1);
    };

    match &outcome {
        TaskOutcome::Completed => {
            tracing::info!(task = %label, pages_fetched, records_extracted, "task completed");
        }
        TaskOutcome::Blocked { reason } => {
            tracing::warn!(task = %label, pages_fetched, reason = %reason, "task blocked");
        }
        TaskOutcome::Failed { error } => {
            tracing::error!(task = %label, pages_fetched, error = %error, "task failed");
        }
    }

    TaskReport {
        task,
        outcome,
        pages_fetched,
        records_extracted,
    }
}
