//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The breadth-first frontier and URL fingerprint store
//! - HTTP fetching with outcome classification
//! - HTML extraction and keyword filtering
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod fingerprint;
mod frontier;

pub use coordinator::{run_crawl, run_crawl_with_cancel, Coordinator, CrawlReport};
pub use extractor::{parse_html, ExtractError, Extraction, Extractor, ParsedPage};
pub use fetcher::{build_http_client, fetch_url, is_textual_content_type, FetchResult};
pub use fingerprint::FingerprintStore;
pub use frontier::{Frontier, FrontierEntry};
