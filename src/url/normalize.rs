use crate::UrlError;
use url::{form_urlencoded, Url};

/// Tracking query parameters dropped from fingerprints
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Parses and validates a URL that the crawler may fetch
///
/// # Rules
///
/// 1. Parse the URL; reject if malformed
/// 2. Only `http` and `https` schemes are accepted
/// 3. A host is required
/// 4. The fragment is removed
///
/// The host is lowercased and dot segments are resolved by the `url` crate
/// during parsing. Everything else is kept as written so the URL still points
/// at the exact resource the page linked to.
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/a/../docs#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    url.set_fragment(None);

    Ok(url)
}

/// Computes the deduplication fingerprint of a URL
///
/// # Fingerprint Steps
///
/// 1. Keep the scheme and the lowercased host
/// 2. Keep the port only when it is not the scheme default
/// 3. Normalize the path:
///    - Remove dot segments and empty segments (collapses `//`)
///    - Remove the trailing slash (except for root `/`)
/// 4. Drop the fragment
/// 5. Drop tracking query parameters (`utm_*`, `fbclid`, `gclid`, `mc_eid`)
/// 6. Sort the remaining query parameters and re-encode them
///
/// Two URLs with the same fingerprint are treated as the same resource.
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::{fingerprint, normalize_url};
///
/// let a = normalize_url("https://example.com/docs/?b=2&a=1#top").unwrap();
/// let b = normalize_url("https://Example.com/docs?a=1&b=2&utm_source=feed").unwrap();
/// assert_eq!(fingerprint(&a), fingerprint(&b));
/// ```
pub fn fingerprint(url: &Url) -> String {
    let mut key = String::with_capacity(url.as_str().len());

    key.push_str(url.scheme());
    key.push_str("://");
    key.push_str(&url.host_str().unwrap_or_default().to_lowercase());

    if let Some(port) = url.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }

    key.push_str(&normalize_path(url.path()));

    let params = filter_and_sort_query_params(url);
    if !params.is_empty() {
        // Re-encode so a decoded `&` or `=` cannot fake a parameter boundary
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &params {
            query.append_pair(k, v);
        }
        key.push('?');
        key.push_str(&query.finish());
    }

    key
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();

    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
