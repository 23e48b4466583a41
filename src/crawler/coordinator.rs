//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the frontier, the fingerprint store, the result list
//! and the statistics. Fetch and extraction run concurrently in a `JoinSet`,
//! one batch at a time; every outcome is folded back into shared state here,
//! in the order the tasks complete.

use crate::config::{validate, validate_start_url, Config, CrawlBudget};
use crate::crawler::extractor::{Extraction, Extractor};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::fingerprint::FingerprintStore;
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::output::stats::CrawlStatistics;
use crate::output::{serialize, ExportFormat, ExportResult};
use crate::record::PageRecord;
use crate::state::{PageState, RunState};
use crate::url::{normalize_url, same_host};
use crate::HarvestError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Accepted records in completion order
    pub records: Vec<PageRecord>,

    /// Counters and final run state
    pub stats: CrawlStatistics,
}

impl CrawlReport {
    pub fn run_state(&self) -> RunState {
        self.stats.run_state
    }

    /// Serializes the records in the given format
    pub fn export(&self, format: ExportFormat) -> ExportResult<String> {
        serialize(&self.records, format)
    }
}

/// Result of one fetch task
struct PageOutcome {
    entry: FrontierEntry,
    result: PageResult,
}

enum PageResult {
    Extracted { extraction: Extraction, final_url: Url },
    Skipped { state: PageState, reason: String },
}

/// Main crawler coordinator structure
#[derive(Debug)]
pub struct Coordinator {
    start_url: Url,
    budget: CrawlBudget,
    client: Client,
    extractor: Arc<Extractor>,
    frontier: Frontier,
    fingerprints: Arc<FingerprintStore>,
    max_redirects: u32,
    scope: Vec<Url>,
    same_host_only: bool,
    concurrency: usize,
    cancel_grace: Duration,
    state: RunState,
    results: Vec<PageRecord>,
    stats: CrawlStatistics,
}

impl Coordinator {
    /// Creates a coordinator seeded with the start URL
    ///
    /// Configuration and the start URL are validated here, so a bad value is
    /// reported before any request is made.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - In the `Seeded` state, frontier holding the start URL
    /// * `Err(HarvestError)` - Invalid configuration or start URL
    pub fn new(config: &Config, start_url: &str) -> Result<Self, HarvestError> {
        validate(config)?;
        let start_url = validate_start_url(start_url)?;
        let budget = CrawlBudget::from_config(config)?;
        let client = build_http_client(&config.crawler, &config.user_agent)?;

        let frontier = Frontier::new(budget.max_depth);
        let fingerprints = Arc::new(FingerprintStore::new());
        fingerprints.mark(&start_url);
        frontier.push(start_url.clone(), 0);

        tracing::debug!(
            "Seeded frontier with {} (max_pages={}, max_depth={}, max_attempts={})",
            start_url,
            budget.max_pages,
            budget.max_depth,
            budget.max_attempts
        );

        Ok(Self {
            scope: vec![start_url.clone()],
            start_url,
            extractor: Arc::new(Extractor::new(budget.keywords.clone())),
            budget,
            client,
            frontier,
            fingerprints,
            max_redirects: config.crawler.max_redirects,
            same_host_only: config.crawler.same_host_only,
            concurrency: config.crawler.max_concurrent_fetches.max(1) as usize,
            cancel_grace: Duration::from_millis(config.crawler.cancel_grace_ms),
            state: RunState::Seeded,
            results: Vec::new(),
            stats: CrawlStatistics::new(),
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn budget(&self) -> &CrawlBudget {
        &self.budget
    }

    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    /// Number of entries waiting in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// Cancellation is checked between batches and while waiting on a batch.
    /// In-flight fetches get the configured grace period to finish; anything
    /// still running after that is aborted and contributes nothing.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<CrawlReport, HarvestError> {
        tracing::info!(
            "Starting crawl of {} (max_pages={}, max_depth={}, keywords={:?})",
            self.start_url,
            self.budget.max_pages,
            self.budget.max_depth,
            self.budget.keywords
        );

        if cancel.is_cancelled() {
            tracing::info!("Crawl cancelled before the first fetch");
            self.state.transition(RunState::Cancelled)?;
            return Ok(self.finish());
        }

        self.state.transition(RunState::Running)?;

        let final_state = loop {
            if cancel.is_cancelled() {
                tracing::info!("Crawl cancelled, stopping dispatch");
                break RunState::Cancelled;
            }

            if self.results.len() >= self.budget.max_pages {
                tracing::info!("Page budget of {} reached", self.budget.max_pages);
                break RunState::PageBudgetReached;
            }

            if self.attempts() >= self.budget.max_attempts {
                tracing::info!("Attempt budget of {} reached", self.budget.max_attempts);
                break RunState::AttemptBudgetReached;
            }

            let batch = self.frontier.pop_batch(self.next_batch_size());
            if batch.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break RunState::Completed;
            }

            for outcome in self.dispatch(batch, &cancel).await {
                self.absorb(outcome);
            }

            tracing::info!(
                "Progress: {} accepted, {} attempts, {} in frontier",
                self.results.len(),
                self.stats.attempts,
                self.frontier.len()
            );
        };

        self.state.transition(final_state)?;
        Ok(self.finish())
    }

    fn attempts(&self) -> usize {
        self.stats.attempts as usize
    }

    /// Entries to dispatch next so neither budget can be overshot
    fn next_batch_size(&self) -> usize {
        let remaining_pages = self.budget.max_pages.saturating_sub(self.results.len());
        let remaining_attempts = self.budget.max_attempts.saturating_sub(self.attempts());

        self.concurrency
            .min(remaining_pages)
            .min(remaining_attempts)
            .max(1)
    }

    /// Runs one batch of fetches and collects outcomes in completion order
    async fn dispatch(
        &mut self,
        batch: Vec<FrontierEntry>,
        cancel: &CancellationToken,
    ) -> Vec<PageOutcome> {
        let mut tasks = JoinSet::new();
        for entry in batch {
            tracing::debug!("Fetching {} (depth {})", entry.url, entry.depth);
            self.stats.record_attempt();
            tasks.spawn(process_entry(
                self.client.clone(),
                Arc::clone(&self.extractor),
                Arc::clone(&self.fingerprints),
                self.max_redirects,
                entry,
            ));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok(outcome)) => outcomes.push(outcome),
                    Some(Err(e)) => self.task_failed(e),
                    None => break,
                },
                _ = cancel.cancelled() => {
                    self.drain(&mut tasks, &mut outcomes).await;
                    break;
                }
            }
        }

        outcomes
    }

    /// Waits up to the grace period for in-flight tasks, then aborts the rest
    async fn drain(&mut self, tasks: &mut JoinSet<PageOutcome>, outcomes: &mut Vec<PageOutcome>) {
        tracing::info!(
            "Cancellation requested, waiting up to {:?} for {} in-flight fetches",
            self.cancel_grace,
            tasks.len()
        );

        let deadline = tokio::time::sleep(self.cancel_grace);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok(outcome)) => outcomes.push(outcome),
                    Some(Err(e)) => self.task_failed(e),
                    None => break,
                },
                _ = &mut deadline => {
                    tracing::warn!("Abandoning {} in-flight fetches", tasks.len());
                    tasks.abort_all();
                    break;
                }
            }
        }
    }

    /// Accounts for a fetch task that ended without an outcome
    fn task_failed(&mut self, error: JoinError) {
        tracing::error!("Fetch task failed: {}", error);
        self.stats.record_task_failure();
    }

    /// Folds one task outcome into the crawl state
    fn absorb(&mut self, outcome: PageOutcome) {
        let PageOutcome { entry, result } = outcome;

        let (extraction, final_url) = match result {
            PageResult::Skipped { state, reason } => {
                tracing::warn!("Skipping {} ({}): {}", entry.url, state, reason);
                self.stats.record_outcome(state, entry.depth);
                return;
            }
            PageResult::Extracted {
                extraction,
                final_url,
            } => (extraction, final_url),
        };

        // Every redirect hop was claimed in the fingerprint store by the fetch
        if final_url != entry.url {
            tracing::debug!("{} redirected to {}", entry.url, final_url);
            if entry.depth == 0 {
                self.scope.push(final_url.clone());
            }
        }

        self.schedule_links(&entry, &extraction.record().links);

        match extraction {
            Extraction::Accepted(record) => {
                if self.results.len() >= self.budget.max_pages {
                    tracing::debug!("Page budget full, dropping {}", record.url);
                    return;
                }
                tracing::debug!("Accepted {} (depth {})", record.url, record.depth);
                self.stats.record_outcome(PageState::Accepted, entry.depth);
                self.results.push(record);
            }
            Extraction::Rejected(record) => {
                tracing::debug!("Rejected {} (no keyword match)", record.url);
                self.stats.record_outcome(PageState::Rejected, entry.depth);
            }
        }
    }

    /// Queues the unseen, in-scope links of a traversed page
    fn schedule_links(&mut self, entry: &FrontierEntry, links: &[String]) {
        let depth = entry.depth + 1;
        if depth > self.budget.max_depth {
            return;
        }

        for link in links {
            let url = match normalize_url(link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::trace!("Ignoring link {}: {}", link, e);
                    continue;
                }
            };

            if !self.in_scope(&url) {
                tracing::trace!("Ignoring off-host link {}", url);
                continue;
            }

            if !self.fingerprints.check_and_mark(&url) {
                continue;
            }

            if self.frontier.push(url, depth) {
                self.stats.links_scheduled += 1;
            }
        }
    }

    fn in_scope(&self, url: &Url) -> bool {
        !self.same_host_only || self.scope.iter().any(|allowed| same_host(allowed, url))
    }

    fn finish(mut self) -> CrawlReport {
        self.stats.finish(self.state);

        tracing::info!(
            "Crawl finished ({}): {} records from {} attempts",
            self.state,
            self.results.len(),
            self.stats.attempts
        );

        CrawlReport {
            records: self.results,
            stats: self.stats,
        }
    }
}

/// Fetches and extracts one frontier entry
async fn process_entry(
    client: Client,
    extractor: Arc<Extractor>,
    fingerprints: Arc<FingerprintStore>,
    max_redirects: u32,
    entry: FrontierEntry,
) -> PageOutcome {
    let admit = |hop: &Url| fingerprints.check_and_mark(hop);

    let result = match fetch_url(&client, &entry.url, max_redirects, admit).await {
        FetchResult::Success {
            final_url, body, ..
        } => match extractor.extract(&body, &entry, &final_url) {
            Ok(extraction) => PageResult::Extracted {
                extraction,
                final_url,
            },
            Err(e) => PageResult::Skipped {
                state: PageState::ExtractionFailed,
                reason: e.to_string(),
            },
        },
        failure => PageResult::Skipped {
            state: failure.failure_state().unwrap_or(PageState::Unreachable),
            reason: failure.describe(),
        },
    };

    PageOutcome { entry, result }
}

/// Runs a complete crawl with no external cancellation
///
/// # Example
///
/// ```no_run
/// use sumi_harvest::{run_crawl, Config};
///
/// # async fn demo() -> Result<(), sumi_harvest::HarvestError> {
/// let mut config = Config::default();
/// config.crawler.max_pages = 5;
/// let report = run_crawl(&config, "https://example.com/").await?;
/// println!("{} pages", report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, start_url: &str) -> Result<CrawlReport, HarvestError> {
    run_crawl_with_cancel(config, start_url, CancellationToken::new()).await
}

/// Runs a complete crawl that stops early when `cancel` fires
pub async fn run_crawl_with_cancel(
    config: &Config,
    start_url: &str,
    cancel: CancellationToken,
) -> Result<CrawlReport, HarvestError> {
    Coordinator::new(config, start_url)?.run(cancel).await
}
