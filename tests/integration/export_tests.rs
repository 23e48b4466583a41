//! Exporting crawl results

use crate::support::*;
use std::io::Write;
use sumi_harvest::config::load_config;
use sumi_harvest::output::{parse_json, write_export, write_markdown_pages};
use sumi_harvest::{run_crawl, ExportFormat};
use tempfile::{tempdir, NamedTempFile};
use wiremock::MockServer;

const CSV_HEADER_LINE: &str = "url,depth,title,content,links";

#[tokio::test]
async fn test_json_export_round_trip() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let config = create_test_config(10, 2);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    let json = report.export(ExportFormat::Json).unwrap();
    let parsed = parse_json(&json).unwrap();

    assert_eq!(parsed, report.records);
}

#[tokio::test]
async fn test_every_format_exports_crawl() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let config = create_test_config(10, 1);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    let csv = report.export(ExportFormat::Csv).unwrap();
    assert!(csv.starts_with(CSV_HEADER_LINE));
    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    assert_eq!(reader.records().count(), report.records.len());

    let markdown = report.export(ExportFormat::Markdown).unwrap();
    assert!(markdown.contains("## A"));
    assert!(markdown.contains("Start page"));

    let xml = report.export(ExportFormat::Xml).unwrap();
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert_eq!(xml.matches("<page>").count(), report.records.len());
}

#[tokio::test]
async fn test_empty_crawl_exports_empty_documents() {
    let server = MockServer::start().await;
    mount_status(&server, "/", 404).await;

    let config = create_test_config(10, 2);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();
    assert!(report.records.is_empty());

    assert_eq!(report.export(ExportFormat::Json).unwrap().trim(), "[]");
    assert_eq!(report.export(ExportFormat::Csv).unwrap().trim(), CSV_HEADER_LINE);
}

#[tokio::test]
async fn test_write_export_to_file() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let config = create_test_config(10, 1);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("pages.xml");
    write_export(&report.records, ExportFormat::Xml, &path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, report.export(ExportFormat::Xml).unwrap());
}

#[tokio::test]
async fn test_markdown_pages_written_per_record() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let config = create_test_config(10, 1);
    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    let dir = tempdir().unwrap();
    let files = write_markdown_pages(&report.records, dir.path()).unwrap();

    assert_eq!(files.len(), report.records.len());
    for file in &files {
        assert!(file.exists());
        assert_eq!(file.extension().and_then(|e| e.to_str()), Some("md"));
    }
}

#[tokio::test]
async fn test_crawl_from_config_file() {
    let server = MockServer::start().await;
    mount_reference_site(&server).await;

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
keywords = ["third"]

[crawler]
max-pages = 5
max-depth = 1
request-timeout-secs = 5

[output]
format = "csv"
"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.export_format().unwrap(), ExportFormat::Csv);

    let report = run_crawl(&config, &start_url(&server)).await.unwrap();

    assert_eq!(record_paths(&report), vec!["/c"]);
    assert_eq!(report.stats.rejected, 2);
}
