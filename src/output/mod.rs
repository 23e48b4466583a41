//! Output module for exporting crawl results
//!
//! This module handles:
//! - Serializing page records to CSV, Markdown, JSON and XML
//! - Writing exports to disk
//! - Recording crawl statistics

mod csv_export;
mod json_export;
mod markdown;
pub mod stats;
mod traits;
mod xml_export;

pub use csv_export::{CsvSerializer, CSV_HEADER};
pub use json_export::{parse_json, JsonSerializer};
pub use markdown::{format_page, markdown_file_name, write_markdown_pages, MarkdownSerializer};
pub use stats::{format_statistics, format_statistics_markdown, print_statistics, CrawlStatistics};
pub use traits::{ExportError, ExportFormat, ExportResult, RecordSerializer};
pub use xml_export::XmlSerializer;

use crate::record::PageRecord;
use std::path::Path;

/// Returns the serializer for a format
pub fn serializer_for(format: ExportFormat) -> Box<dyn RecordSerializer + Send + Sync> {
    match format {
        ExportFormat::Csv => Box::new(CsvSerializer),
        ExportFormat::Markdown => Box::new(MarkdownSerializer),
        ExportFormat::Json => Box::new(JsonSerializer),
        ExportFormat::Xml => Box::new(XmlSerializer),
    }
}

/// Serializes records in the given format
///
/// Every record is validated first; a record that breaks the data model is
/// reported as `ExportError::InvalidRecord` and nothing is produced.
///
/// # Example
///
/// ```
/// use sumi_harvest::output::{serialize, ExportFormat};
/// use sumi_harvest::PageRecord;
///
/// let records = vec![PageRecord {
///     url: "https://example.com/".to_string(),
///     depth: 0,
///     title: "Home".to_string(),
///     content: "Welcome".to_string(),
///     links: vec![],
/// }];
/// let csv = serialize(&records, ExportFormat::Csv).unwrap();
/// assert!(csv.starts_with("url,depth,title,content,links"));
/// ```
pub fn serialize(records: &[PageRecord], format: ExportFormat) -> ExportResult<String> {
    for record in records {
        record.validate()?;
    }

    serializer_for(format).serialize(records)
}

/// Serializes records and writes them to `path`
pub fn write_export(records: &[PageRecord], format: ExportFormat, path: &Path) -> ExportResult<()> {
    let text = serialize(records, format)?;
    std::fs::write(path, text)?;
    Ok(())
}
