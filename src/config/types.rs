use crate::output::ExportFormat;
use crate::ConfigError;
use serde::Deserialize;

/// Main configuration structure for Sumi-Harvest
///
/// Every section has defaults, so an empty file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    /// Case-insensitive relevance filter; empty means no filtering
    pub keywords: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Hard cap on accepted records
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Hard cap on link hops from the start URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Cap on total fetch attempts (successes + failures); defaults to `max_pages * 10`
    #[serde(rename = "max-attempts")]
    pub max_attempts: Option<u32>,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Redirect hops followed before a fetch is treated as failed
    #[serde(rename = "max-redirects")]
    pub max_redirects: u32,

    /// Only follow links on the start URL's host
    #[serde(rename = "same-host-only")]
    pub same_host_only: bool,

    /// How long in-flight fetches may run after cancellation (milliseconds)
    #[serde(rename = "cancel-grace-ms")]
    pub cancel_grace_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_depth: 3,
            max_concurrent_fetches: 10,
            max_attempts: None,
            request_timeout_secs: 10,
            max_redirects: 5,
            same_host_only: true,
            cancel_grace_ms: 2000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/sumi-harvest".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// One of `csv`, `markdown`, `json`, `xml`
    pub format: String,

    /// Output file; stdout when absent
    pub path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            path: None,
        }
    }
}

impl Config {
    /// Parses the configured export format
    pub fn export_format(&self) -> Result<ExportFormat, ConfigError> {
        self.output.format.parse()
    }
}

/// Run-scoped page, depth, attempt and keyword budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlBudget {
    /// Hard cap on accepted records (>= 1)
    pub max_pages: usize,

    /// Hard cap on the depth of any processed entry
    pub max_depth: u32,

    /// Lowercased, trimmed, non-empty keywords
    pub keywords: Vec<String>,

    /// Hard cap on fetch attempts, guaranteeing forward progress
    pub max_attempts: usize,
}

/// Multiplier applied to `max_pages` when no attempt cap is configured
pub const DEFAULT_ATTEMPT_FACTOR: usize = 10;

impl CrawlBudget {
    /// Creates a budget, rejecting a zero page cap
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_harvest::config::CrawlBudget;
    ///
    /// let budget = CrawlBudget::new(5, 2, &[" Rust ".to_string(), "".to_string()]).unwrap();
    /// assert_eq!(budget.keywords, vec!["rust".to_string()]);
    /// assert_eq!(budget.max_attempts, 50);
    /// ```
    pub fn new(max_pages: usize, max_depth: u32, keywords: &[String]) -> Result<Self, ConfigError> {
        if max_pages < 1 {
            return Err(ConfigError::Validation(
                "max_pages must be >= 1, got 0".to_string(),
            ));
        }

        Ok(Self {
            max_pages,
            max_depth,
            keywords: normalize_keywords(keywords.iter().map(String::as_str)),
            max_attempts: max_pages.saturating_mul(DEFAULT_ATTEMPT_FACTOR),
        })
    }

    /// Overrides the attempt cap; it can never drop below `max_pages`
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(self.max_pages);
        self
    }

    /// Builds the budget described by a configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let budget = Self::new(
            config.crawler.max_pages as usize,
            config.crawler.max_depth,
            &config.keywords,
        )?;

        Ok(match config.crawler.max_attempts {
            Some(attempts) => budget.with_max_attempts(attempts as usize),
            None => budget,
        })
    }
}

/// Splits a comma-separated keyword string
///
/// ```
/// use sumi_harvest::config::parse_keywords;
///
/// assert_eq!(parse_keywords("Rust, tokio,,"), vec!["rust", "tokio"]);
/// ```
pub fn parse_keywords(raw: &str) -> Vec<String> {
    normalize_keywords(raw.split(','))
}

fn normalize_keywords<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in raw {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() && !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    keywords
}
