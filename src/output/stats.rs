//! Crawl statistics
//!
//! Per-page outcomes never fail a run; they are counted here and returned
//! alongside the records.

use crate::state::{PageState, RunState};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Frontier entries dispatched to the fetcher (successes and failures)
    pub attempts: u64,

    /// Pages returned with a textual body
    pub fetched: u64,

    /// Records added to the result collection
    pub accepted: u64,

    /// Pages excluded by the keyword filter (waypoints)
    pub rejected: u64,

    /// Pages skipped because of a fetch or extraction failure
    pub skipped: u64,

    /// Links pushed onto the frontier
    pub links_scheduled: u64,

    /// Count of pages by outcome
    pub pages_by_state: HashMap<PageState, u64>,

    /// Accepted records per depth
    pub depth_breakdown: BTreeMap<u32, u64>,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Lifecycle state when the statistics were taken
    pub run_state: RunState,
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlStatistics {
    /// Creates empty statistics stamped with the current time
    pub fn new() -> Self {
        Self {
            attempts: 0,
            fetched: 0,
            accepted: 0,
            rejected: 0,
            skipped: 0,
            links_scheduled: 0,
            pages_by_state: HashMap::new(),
            depth_breakdown: BTreeMap::new(),
            started_at: Utc::now(),
            finished_at: None,
            run_state: RunState::Seeded,
        }
    }

    /// Records that an entry was dispatched
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Records the outcome of one dispatched entry
    pub fn record_outcome(&mut self, state: PageState, depth: u32) {
        *self.pages_by_state.entry(state).or_insert(0) += 1;

        match state {
            PageState::Accepted => {
                self.fetched += 1;
                self.accepted += 1;
                *self.depth_breakdown.entry(depth).or_insert(0) += 1;
            }
            PageState::Rejected => {
                self.fetched += 1;
                self.rejected += 1;
            }
            PageState::ExtractionFailed => {
                self.fetched += 1;
                self.skipped += 1;
            }
            _ => self.skipped += 1,
        }
    }

    /// Records an entry whose task panicked before producing an outcome
    pub fn record_task_failure(&mut self) {
        *self
            .pages_by_state
            .entry(PageState::ExtractionFailed)
            .or_insert(0) += 1;
        self.skipped += 1;
    }

    /// Number of pages that ended in `state`
    pub fn count(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Stamps the finish time and final state
    pub fn finish(&mut self, run_state: RunState) {
        self.run_state = run_state;
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run, if finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Accepted records as a percentage of attempts
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        (self.accepted as f64 / self.attempts as f64) * 100.0
    }
}

/// Formats statistics as plain text
pub fn format_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Statistics ===\n\n");
    out.push_str(&format!("Run state: {}\n", stats.run_state));
    if let Some(duration) = stats.duration_seconds() {
        out.push_str(&format!("Duration: {:.2}s\n", duration));
    }
    out.push('\n');

    out.push_str("Overview:\n");
    out.push_str(&format!("  Attempts: {}\n", stats.attempts));
    out.push_str(&format!("  Fetched: {}\n", stats.fetched));
    out.push_str(&format!("  Accepted: {}\n", stats.accepted));
    out.push_str(&format!("  Rejected by keywords: {}\n", stats.rejected));
    out.push_str(&format!("  Skipped: {}\n", stats.skipped));
    out.push_str(&format!("  Links scheduled: {}\n", stats.links_scheduled));
    out.push('\n');

    let errors: Vec<_> = PageState::ALL
        .iter()
        .filter(|state| state.is_error())
        .map(|state| (state, stats.count(*state)))
        .filter(|(_, count)| *count > 0)
        .collect();
    if !errors.is_empty() {
        out.push_str("Skipped by reason:\n");
        for (state, count) in errors {
            out.push_str(&format!("  {}: {}\n", state, count));
        }
        out.push('\n');
    }

    if !stats.depth_breakdown.is_empty() {
        out.push_str("Accepted by depth:\n");
        for (depth, count) in &stats.depth_breakdown {
            out.push_str(&format!("  {}: {}\n", depth, count));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Success Rate: {:.1}% ({} / {} attempts accepted)\n",
        stats.success_rate(),
        stats.accepted,
        stats.attempts
    ));

    out
}

/// Prints statistics to stderr, leaving stdout free for exported data
pub fn print_statistics(stats: &CrawlStatistics) {
    eprint!("{}", format_statistics(stats));
}

/// Formats statistics as a markdown summary
pub fn format_statistics_markdown(stats: &CrawlStatistics) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Harvest Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
    if let Some(finished) = &stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    md.push_str(&format!("- **Status**: {}\n\n", stats.run_state));

    md.push_str("## Page Outcome Breakdown\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    for state in PageState::ALL {
        md.push_str(&format!("| {} | {} |\n", state, stats.count(state)));
    }
    md.push('\n');

    if !stats.depth_breakdown.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (depth, count) in &stats.depth_breakdown {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    md
}
