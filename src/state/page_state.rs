/// Page state definitions for tracking crawl outcomes
///
/// Every frontier entry that is dispatched ends in exactly one of these states.
use std::fmt;

/// Represents the outcome of processing a single page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Success States =====
    /// Page was fetched, extracted and passed the keyword filter
    Accepted,

    /// Page was fetched and extracted but failed the keyword filter (waypoint)
    Rejected,

    // ===== Skip States =====
    /// Request exceeded the configured timeout
    Timeout,

    /// Page could not be reached (connection refused, DNS failure, TLS error)
    Unreachable,

    /// Page returned an HTTP 4xx or 5xx status
    HttpError,

    /// Redirect chain exceeded the limit or looped
    RedirectError,

    /// Page Content-Type is not textual
    ContentMismatch,

    /// Page body could not be turned into a record
    ExtractionFailed,

    /// A redirect led to a URL that was already scheduled or visited
    Duplicate,
}

impl PageState {
    /// All states, in reporting order
    pub const ALL: [PageState; 9] = [
        Self::Accepted,
        Self::Rejected,
        Self::Timeout,
        Self::Unreachable,
        Self::HttpError,
        Self::RedirectError,
        Self::ContentMismatch,
        Self::ExtractionFailed,
        Self::Duplicate,
    ];

    /// Returns true if the page produced a record in the result collection
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns true if the page was fetched and parsed, so its links were followed
    pub fn was_traversed(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Returns true if this represents a fetch or extraction failure
    pub fn is_error(&self) -> bool {
        !self.was_traversed()
    }

    /// Returns a stable lowercase label for this state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Timeout => "timeout",
            Self::Unreachable => "unreachable",
            Self::HttpError => "http_error",
            Self::RedirectError => "redirect_error",
            Self::ContentMismatch => "content_mismatch",
            Self::ExtractionFailed => "extraction_failed",
            Self::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
