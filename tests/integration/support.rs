//! Fixture helpers shared by the integration tests

use std::time::Duration;
use sumi_harvest::config::Config;
use sumi_harvest::CrawlReport;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts
pub fn create_test_config(max_pages: u32, max_depth: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_pages = max_pages;
    config.crawler.max_depth = max_depth;
    config.crawler.request_timeout_secs = 5;
    config.crawler.cancel_grace_ms = 200;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

/// Builds a small HTML page
pub fn html_page(title: &str, text: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();

    format!(
        "<html><head><title>{}</title></head><body><p>{}</p>{}</body></html>",
        title, text, anchors
    )
}

/// Serves an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

/// Serves an HTML page at `route` after a delay
pub async fn mount_slow_page(server: &MockServer, route: &str, html: String, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html, "text/html")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Serves an empty response with the given status at `route`
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts the reference site: `/` links to `/b` and `/c`, `/b` links to `/d`
pub async fn mount_reference_site(server: &MockServer) {
    mount_page(server, "/", html_page("A", "Start page", &["/b", "/c"])).await;
    mount_page(server, "/b", html_page("B", "Second page", &["/d"])).await;
    mount_page(server, "/c", html_page("C", "Third page", &[])).await;
    mount_page(server, "/d", html_page("D", "Deep page", &[])).await;
}

pub fn start_url(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

/// Record URL paths in result order
pub fn record_paths(report: &CrawlReport) -> Vec<String> {
    report
        .records
        .iter()
        .map(|record| {
            Url::parse(&record.url)
                .expect("record URL should be absolute")
                .path()
                .to_string()
        })
        .collect()
}

/// Record URL paths, sorted
pub fn sorted_paths(report: &CrawlReport) -> Vec<String> {
    let mut paths = record_paths(report);
    paths.sort();
    paths
}
