//! HTML extraction
//!
//! This module turns a fetched HTML document into a `PageRecord`:
//! - Title (from `<title>`, falling back to the first `<h1>`)
//! - Visible text content
//! - Outbound links, resolved to absolute URLs
//!
//! It also applies the keyword filter. A page that fails the filter is still
//! parsed so its links can be followed.

use crate::crawler::frontier::FrontierEntry;
use crate::record::PageRecord;
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;
use url::Url;

/// Elements whose text is never part of the visible content
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "head", "iframe", "object",
];

/// Elements that start a new line of content
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Errors raised while extracting a page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is empty")]
    EmptyDocument,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Whitespace-collapsed title, empty if the page has none
    pub title: String,

    /// Visible text, one line per block element
    pub content: String,

    /// All links found on the page (absolute http(s) URLs, fragments removed)
    pub links: Vec<String>,
}

/// Outcome of extracting one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The page passed the keyword filter and belongs in the results
    Accepted(PageRecord),

    /// The page failed the keyword filter; only its links are used
    Rejected(PageRecord),
}

impl Extraction {
    pub fn record(&self) -> &PageRecord {
        match self {
            Self::Accepted(record) | Self::Rejected(record) => record,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Builds page records and applies the keyword filter
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    keywords: Vec<String>,
}

impl Extractor {
    /// Creates an extractor for already-normalized (lowercased) keywords
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Extracts a record for a fetched frontier entry
    ///
    /// The record carries the entry's URL and depth. Relative links are
    /// resolved against `base_url`, the final URL after redirects.
    pub fn extract(
        &self,
        html: &str,
        entry: &FrontierEntry,
        base_url: &Url,
    ) -> Result<Extraction, ExtractError> {
        let parsed = parse_html(html, base_url)?;

        let mut url = entry.url.clone();
        url.set_fragment(None);

        let record = PageRecord {
            url: url.to_string(),
            depth: entry.depth,
            title: parsed.title,
            content: parsed.content,
            links: parsed.links,
        };

        if record.matches_keywords(&self.keywords) {
            Ok(Extraction::Accepted(record))
        } else {
            tracing::debug!("{} does not match keywords {:?}", record.url, self.keywords);
            Ok(Extraction::Rejected(record))
        }
    }
}

/// Parses HTML content and extracts title, text and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that is not http(s) after resolution
///
/// # Example
///
/// ```
/// use sumi_harvest::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url).unwrap();
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> Result<ParsedPage, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let document = Html::parse_document(html);

    Ok(ParsedPage {
        title: extract_title(&document),
        content: extract_content(&document),
        links: extract_links(&document, base_url),
    })
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_title(document: &Html) -> String {
    first_text(document, "title")
        .or_else(|| first_text(document, "h1"))
        .unwrap_or_default()
}

fn extract_content(document: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut raw = String::new();
    collect_text(body, &mut raw);

    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
                out.push_str(text);
            }
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }

                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts all valid links from the HTML document, in document order
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);

    Some(absolute_url.to_string())
}
