use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host, or `None` if the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_harvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs share host and effective port
///
/// This is the crawl scope used when `same-host-only` is enabled. Schemes
/// are not compared, so `http://site` and `https://site` stay in scope.
pub fn same_host(a: &Url, b: &Url) -> bool {
    extract_domain(a).is_some()
        && extract_domain(a) == extract_domain(b)
        && a.port_or_known_default() == b.port_or_known_default()
}
