//! Page records produced by the crawl
//!
//! A `PageRecord` is created once by the extractor when a page is fetched,
//! parsed and passes the keyword filter. It is never mutated afterwards.

use crate::output::ExportError;
use serde::{Deserialize, Serialize};
use url::Url;

/// One successfully extracted page
///
/// Field order is the export order used by every serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// The URL that was fetched (unique within a crawl run)
    pub url: String,

    /// Number of link hops from the start URL
    pub depth: u32,

    /// Extracted page title, possibly empty
    pub title: String,

    /// Extracted visible text, possibly empty
    pub content: String,

    /// Absolute URLs discovered on the page, in document order
    pub links: Vec<String>,
}

impl PageRecord {
    /// Checks the record against the data model invariants
    ///
    /// The URL and every link must be an absolute http(s) URL. Records built by
    /// the extractor always pass; a failure here indicates a programming defect
    /// upstream of the serializer.
    pub fn validate(&self) -> Result<(), ExportError> {
        check_absolute(&self.url).map_err(|reason| ExportError::InvalidRecord {
            url: self.url.clone(),
            reason,
        })?;

        for link in &self.links {
            check_absolute(link).map_err(|reason| ExportError::InvalidRecord {
                url: self.url.clone(),
                reason: format!("link '{}': {}", link, reason),
            })?;
        }

        Ok(())
    }

    /// Returns true if any of the lowercased keywords occurs in the title or content
    ///
    /// An empty keyword list matches every record.
    pub fn matches_keywords(&self, keywords: &[String]) -> bool {
        if keywords.is_empty() {
            return true;
        }

        let title = self.title.to_lowercase();
        let content = self.content.to_lowercase();

        keywords
            .iter()
            .any(|keyword| title.contains(keyword.as_str()) || content.contains(keyword.as_str()))
    }
}

fn check_absolute(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}
