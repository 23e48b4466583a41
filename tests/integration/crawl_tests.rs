//! End-to-end crawl behavior

use crate::support::*;
use std::collections::HashSet;
use std::time::Duration;
use sumi_harvest::crawler::{run_crawl_with_cancel, Coordinator};
use sumi_harvest::{fingerprint, run_crawl, ConfigError, HarvestError, PageState, RunState};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let config = create_test_config(10, 1);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(sorted_paths(&report), vec!["/", "/b", "/c"]);
    assert_eq!(report.run_state(), RunState::Completed);

    for record in &report.records {
        let expected_depth = if record.title == "A" { 0 } else { 1 };
        assert_eq!(record.depth, expected_depth, "depth of {}", record.url);
    }
}

#[tokio::test]
async fn test_deeper_budget_reaches_all_pages() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let config = create_test_config(10, 2);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(sorted_paths(&report), vec!["/", "/b", "/c", "/d"]);
    let d = report.records.iter().find(|r| r.title == "D").unwrap();
    assert_eq!(d.depth, 2);
}

#[tokio::test]
async fn test_page_budget_stops_crawl() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let config = create_test_config(2, 3);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    let paths = record_paths(&report);
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0], "/");
    assert!(paths[1] == "/b" || paths[1] == "/c");
    assert_eq!(report.run_state(), RunState::PageBudgetReached);
}

#[tokio::test]
async fn test_single_page_budget() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let config = create_test_config(1, 3);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(record_paths(&report), vec!["/"]);
    assert_eq!(report.stats.attempts, 1);
}

#[tokio::test]
async fn test_keyword_filter_uses_waypoints() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("A", "all about foo", &["/b"])).await;
    mount_page(&server, "/b", html_page("B", "nothing relevant", &["/c"])).await;
    mount_page(&server, "/c", html_page("C", "more FOO here", &[])).await;

    let mut config = create_test_config(10, 2);
    config.keywords = vec!["foo".to_string()];
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(sorted_paths(&report), vec!["/", "/c"]);
    assert_eq!(report.stats.rejected, 1);
    assert_eq!(report.stats.count(PageState::Rejected), 1);
    assert_eq!(report.run_state(), RunState::Completed);
}

#[tokio::test]
async fn test_rejected_start_page_still_expands() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Index", "table of contents", &["/hit"])).await;
    mount_page(&server, "/hit", html_page("Rust", "tokio internals", &[])).await;

    let mut config = create_test_config(10, 1);
    config.keywords = vec!["tokio".to_string()];
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(record_paths(&report), vec!["/hit"]);
}

#[tokio::test]
async fn test_invalid_start_url_is_config_error() {
    let config = create_test_config(10, 2);
    let result = run_crawl(&config, "not a url").await;

    assert!(matches!(
        result,
        Err(HarvestError::Config(ConfigError::InvalidStartUrl { .. }))
    ));
}

#[tokio::test]
async fn test_unsupported_scheme_is_config_error() {
    let config = create_test_config(10, 2);
    let result = run_crawl(&config, "ftp://example.com/").await;

    assert!(matches!(result, Err(HarvestError::Config(_))));
}

#[tokio::test]
async fn test_sequential_crawl_is_deterministic() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let mut config = create_test_config(10, 2);
    config.crawler.max_concurrent_fetches = 1;

    let first = run_crawl(&config, &start_url(&server)).await.unwrap();
    let second = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(record_paths(&first), vec!["/", "/b", "/c", "/d"]);
    assert_eq!(first.records, second.records);
}

#[tokio::test]
async fn test_concurrency_does_not_change_result_set() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let mut sequential = create_test_config(10, 2);
    sequential.crawler.max_concurrent_fetches = 1;
    let mut parallel = create_test_config(10, 2);
    parallel.crawler.max_concurrent_fetches = 4;

    let a = run_crawl(&sequential, &start_url(&server)).await.unwrap();
    let b = run_crawl(&parallel, &start_url(&server)).await.unwrap();

    assert_eq!(sorted_paths(&a), sorted_paths(&b));
}

#[tokio::test]
async fn test_http_error_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("A", "start", &["/missing", "/c"])).await;
    mount_status(&server, "/missing", 404).await;
    mount_page(&server, "/c", html_page("C", "still here", &[])).await;

    let config = create_test_config(10, 1);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(sorted_paths(&report), vec!["/", "/c"]);
    assert_eq!(report.stats.count(PageState::HttpError), 1);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.run_state(), RunState::Completed);
}

#[tokio::test]
async fn test_start_page_failure_yields_empty_result() {
    let server = MockServer::start().await;
    mount_status(&server, "/", 500).await;

    let config = create_test_config(10, 2);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.stats.count(PageState::HttpError), 1);
    assert_eq!(report.run_state(), RunState::Completed);
}

#[tokio::test]
async fn test_timeout_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("A", "start", &["/slow"])).await;
    mount_slow_page(
        &server,
        "/slow",
        html_page("Slow", "late", &[]),
        Duration::from_secs(3),
    )
    .await;

    let mut config = create_test_config(10, 1);
    config.crawler.request_timeout_secs = 1;
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(record_paths(&report), vec!["/"]);
    assert_eq!(report.stats.count(PageState::Timeout), 1);
}

#[tokio::test]
async fn test_redirect_loop_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("A", "start", &["/loop"])).await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .mount(&server)
        .await;

    let config = create_test_config(10, 1);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(record_paths(&report), vec!["/"]);
    assert_eq!(report.stats.count(PageState::RedirectError), 1);
}

#[tokio::test]
async fn test_non_html_content_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("A", "start", &["/paper.pdf"])).await;
    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&server)
        .await;

    let config = create_test_config(10, 1);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(record_paths(&report), vec!["/"]);
    assert_eq!(report.stats.count(PageState::ContentMismatch), 1);
}

#[tokio::test]
async fn test_empty_document_is_extraction_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("A", "start", &["/blank"])).await;
    mount_page(&server, "/blank", "   ".to_string()).await;

    let config = create_test_config(10, 1);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(record_paths(&report), vec!["/"]);
    assert_eq!(report.stats.count(PageState::ExtractionFailed), 1);
}

#[tokio::test]
async fn test_duplicate_links_fetched_once() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page("A", "start", &["/b", "/b/", "/b#section", "/b?utm_source=feed", "/"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(html_page("B", "once", &["/"]), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(10, 2);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(sorted_paths(&report), vec!["/", "/b"]);
    assert_eq!(report.stats.links_scheduled, 1);

    // Duplicates stay in the recorded links
    let start = report.records.iter().find(|r| r.title == "A").unwrap();
    assert_eq!(start.links.len(), 5);
}

#[tokio::test]
async fn test_off_host_links_are_recorded_but_not_followed() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page("A", "start", &["https://elsewhere.invalid/page", "/b"]),
    )
    .await;
    mount_page(&server, "/b", html_page("B", "local", &[])).await;

    let config = create_test_config(10, 1);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(sorted_paths(&report), vec!["/", "/b"]);
    let start = report.records.iter().find(|r| r.title == "A").unwrap();
    assert!(start
        .links
        .contains(&"https://elsewhere.invalid/page".to_string()));
    assert_eq!(report.stats.links_scheduled, 1);
}

#[tokio::test]
async fn test_redirected_start_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/docs/intro"))
        .mount(&server)
        .await;
    mount_page(&server, "/docs/intro", html_page("Intro", "welcome", &["next"])).await;
    mount_page(&server, "/docs/next", html_page("Next", "chapter two", &["intro"])).await;

    let config = create_test_config(10, 2);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    // The record keeps the scheduled URL; links resolve against the final URL
    assert_eq!(sorted_paths(&report), vec!["/", "/docs/next"]);
    let start = report.records.iter().find(|r| r.title == "Intro").unwrap();
    assert_eq!(start.depth, 0);
    assert_eq!(start.links, vec![format!("{}/docs/next", server.uri())]);
}

#[tokio::test]
async fn test_redirect_to_queued_page_fetches_it_once() {
    for concurrency in [1, 4] {
        let server = MockServer::start().await;
        mount_page(&server, "/", html_page("A", "start", &["/old", "/new"])).await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(html_page("New", "moved here", &[]), "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = create_test_config(10, 2);
        config.crawler.max_concurrent_fetches = concurrency;
        let report = run_crawl(&config, &start_url(&server)).await.unwrap();

        assert_eq!(sorted_paths(&report), vec!["/", "/new"]);
        assert_eq!(
            report.records.iter().filter(|r| r.title == "New").count(),
            1
        );
        assert_eq!(report.stats.count(PageState::Duplicate), 1);
        assert_eq!(
            report.stats.attempts,
            report.stats.accepted + report.stats.rejected + report.stats.skipped
        );
    }
}

#[tokio::test]
async fn test_attempt_budget_stops_crawl() {
    let server = MockServer::start().await;
    let links: Vec<String> = (0..10).map(|i| format!("/gone{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&server, "/", html_page("A", "start", &link_refs)).await;

    let mut config = create_test_config(2, 1);
    config.crawler.max_attempts = Some(3);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(record_paths(&report), vec!["/"]);
    assert_eq!(report.stats.attempts, 3);
    assert_eq!(report.run_state(), RunState::AttemptBudgetReached);
}

#[tokio::test]
async fn test_cancel_before_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(10, 2);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = run_crawl_with_cancel(&config, &start_url(&server), cancel)
        .await
        .unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.run_state(), RunState::Cancelled);
}

#[tokio::test]
async fn test_cancel_mid_crawl_keeps_complete_records() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("A", "start", &["/slow"])).await;
    mount_slow_page(
        &server,
        "/slow",
        html_page("Slow", "never arrives", &[]),
        Duration::from_secs(4),
    )
    .await;

    let mut config = create_test_config(10, 2);
    config.crawler.cancel_grace_ms = 100;

    let coordinator = Coordinator::new(&config, &start_url(&server)).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(3), coordinator.run(cancel))
        .await
        .expect("cancelled crawl should stop within the grace period")
        .unwrap();

    assert_eq!(record_paths(&report), vec!["/"]);
    assert_eq!(report.run_state(), RunState::Cancelled);
    assert_eq!(report.stats.attempts, 2);
}

#[tokio::test]
async fn test_crawl_invariants_on_larger_site() {
    let server = MockServer::start().await;

    // Every page links to the next three, plus the start page
    for i in 0..20 {
        let links: Vec<String> = (1..=3)
            .map(|step| format!("/p{}", (i + step) % 20))
            .chain(std::iter::once("/".to_string()))
            .collect();
        let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
        let route = if i == 0 { "/".to_string() } else { format!("/p{}", i) };
        mount_page(&server, &route, html_page(&format!("P{}", i), "page", &link_refs)).await;
    }

    let mut config = create_test_config(7, 3);
    config.crawler.max_concurrent_fetches = 4;
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert!(report.records.len() <= 7);
    assert!(report.records.iter().all(|r| r.depth <= 3));

    let fingerprints: HashSet<String> = report
        .records
        .iter()
        .map(|r| fingerprint(&Url::parse(&r.url).unwrap()))
        .collect();
    assert_eq!(fingerprints.len(), report.records.len());

    assert_eq!(report.stats.accepted as usize, report.records.len());
    assert!(report.stats.attempts >= report.stats.accepted);
}
