//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the crawler's user agent
//! - Bounded redirect following, with every hop checked against the
//!   URLs already seen in the run
//! - Content-Type screening
//! - Error classification into page states

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::state::PageState;
use crate::url::fingerprint;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Response};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Upper bound on the TCP/TLS connect phase
const MAX_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched a textual page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value, empty if absent
        content_type: String,
        /// Decoded page body
        body: String,
    },

    /// Page is not HTML or text
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// The per-request timeout elapsed
    Timeout,

    /// Connection refused, DNS failure, TLS failure or a broken body stream
    NetworkError {
        /// Error description
        error: String,
    },

    /// Redirect loop, too many redirects or an unusable `Location`
    RedirectError {
        /// Error description
        error: String,
    },

    /// A redirect pointed at a URL another entry already claimed
    Duplicate {
        /// The redirect target that was not requested
        url: Url,
    },
}

impl FetchResult {
    /// The page state a failed fetch ends in, `None` for `Success`
    pub fn failure_state(&self) -> Option<PageState> {
        match self {
            Self::Success { .. } => None,
            Self::ContentMismatch { .. } => Some(PageState::ContentMismatch),
            Self::HttpError { .. } => Some(PageState::HttpError),
            Self::Timeout => Some(PageState::Timeout),
            Self::NetworkError { .. } => Some(PageState::Unreachable),
            Self::RedirectError { .. } => Some(PageState::RedirectError),
            Self::Duplicate { .. } => Some(PageState::Duplicate),
        }
    }

    /// Short human-readable description for logging
    pub fn describe(&self) -> String {
        match self {
            Self::Success { status_code, .. } => format!("HTTP {}", status_code),
            Self::ContentMismatch { content_type } => {
                format!("non-textual content type '{}'", content_type)
            }
            Self::HttpError { status_code } => format!("HTTP {}", status_code),
            Self::Timeout => "request timeout".to_string(),
            Self::NetworkError { error } => error.clone(),
            Self::RedirectError { error } => error.clone(),
            Self::Duplicate { url } => format!("redirects to already seen {}", url),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client is shared by every fetch task of a run; reqwest pools
/// connections internally so cloning it is cheap. It never follows redirects
/// itself, `fetch_url` does.
///
/// # Arguments
///
/// * `crawler` - Timeout settings
/// * `user_agent` - Identity sent with every request
///
/// # Example
///
/// ```no_run
/// use sumi_harvest::config::Config;
/// use sumi_harvest::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(crawler.request_timeout_secs);
    let connect_timeout =
        Duration::from_secs(crawler.request_timeout_secs.min(MAX_CONNECT_TIMEOUT_SECS));

    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// Redirects are followed by hand, up to `max_redirects` hops. Before a hop
/// is requested, `admit` is asked whether the target may be claimed (the
/// crawler passes the fingerprint store's check-and-mark). Hops that share a
/// fingerprint with an earlier URL of the same chain, such as a trailing
/// slash redirect, skip that check.
///
/// # Outcome Mapping
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with textual Content-Type | Success |
/// | 2xx with other Content-Type | ContentMismatch |
/// | Any other final status | HttpError |
/// | Request or body read timed out | Timeout |
/// | Redirect limit exceeded, loop or bad `Location` | RedirectError |
/// | Redirect target refused by `admit` | Duplicate |
/// | Connect, DNS, TLS or stream failure | NetworkError |
///
/// Nothing is retried.
pub async fn fetch_url<F>(client: &Client, url: &Url, max_redirects: u32, admit: F) -> FetchResult
where
    F: Fn(&Url) -> bool,
{
    let mut chain = vec![url.clone()];
    let mut chain_keys = HashSet::from([fingerprint(url)]);

    loop {
        let current = &chain[chain.len() - 1];
        let response = match client.get(current.clone()).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(e),
        };

        let status = response.status();
        if !status.is_redirection() {
            return read_page(response, current.clone()).await;
        }

        let next = match redirect_target(&response, current) {
            Ok(next) => next,
            Err(error) => return FetchResult::RedirectError { error },
        };

        if chain.contains(&next) {
            return FetchResult::RedirectError {
                error: format!("redirect loop at {}", next),
            };
        }

        if chain.len() > max_redirects as usize {
            return FetchResult::RedirectError {
                error: format!("more than {} redirects", max_redirects),
            };
        }

        if chain_keys.insert(fingerprint(&next)) && !admit(&next) {
            return FetchResult::Duplicate { url: next };
        }

        tracing::trace!("{} redirects to {}", current, next);
        chain.push(next);
    }
}

/// Resolves the `Location` header of a redirect response
fn redirect_target(response: &Response, current: &Url) -> Result<Url, String> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| format!("HTTP {} without a Location header", response.status().as_u16()))?;

    let mut next = current
        .join(location)
        .map_err(|e| format!("bad redirect target '{}': {}", location, e))?;

    if next.scheme() != "http" && next.scheme() != "https" {
        return Err(format!("redirect to unsupported scheme '{}'", next.scheme()));
    }
    next.set_fragment(None);

    Ok(next)
}

/// Screens and reads the body of a final, non-redirect response
async fn read_page(response: Response, final_url: Url) -> FetchResult {
    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_textual_content_type(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => classify_error(e),
    }
}

/// Returns true for content types the extractor can handle
///
/// HTML, XHTML and any `text/*` type are accepted. A missing header is
/// treated as HTML.
pub fn is_textual_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime.is_empty() || mime == "application/xhtml+xml" || mime.starts_with("text/")
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::Timeout
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("connection failed: {}", e),
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
        }
    }
}
