//! Markdown export
//!
//! This module renders records as a single markdown document, or as one
//! markdown file per page.

use crate::output::traits::{ExportFormat, ExportResult, RecordSerializer};
use crate::record::PageRecord;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Longest file stem produced by `markdown_file_name`
const MAX_FILE_STEM: usize = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownSerializer;

impl RecordSerializer for MarkdownSerializer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Markdown
    }

    fn serialize(&self, records: &[PageRecord]) -> ExportResult<String> {
        let mut md = String::new();

        md.push_str("# Sumi-Harvest Export\n\n");
        md.push_str(&format!("- **Pages**: {}\n\n", records.len()));

        for record in records {
            md.push_str("---\n\n");
            md.push_str(&format_page(record, 2));
        }

        Ok(md)
    }
}

/// Formats a single record as markdown
///
/// `level` is the heading level of the page title; sub-sections use one
/// level deeper.
pub fn format_page(record: &PageRecord, level: usize) -> String {
    let heading = "#".repeat(level.max(1));
    let sub_heading = "#".repeat(level.max(1) + 1);
    let mut md = String::new();

    md.push_str(&format!("{} {}\n\n", heading, heading_text(record)));
    md.push_str(&format!("- **URL**: <{}>\n", record.url));
    md.push_str(&format!("- **Depth**: {}\n\n", record.depth));

    if !record.links.is_empty() {
        md.push_str(&format!("{} Links\n\n", sub_heading));
        for link in &record.links {
            md.push_str(&format!("- <{}>\n", link));
        }
        md.push('\n');
    }

    md.push_str(&format!("{} Content\n\n", sub_heading));
    let content = record.content.trim();
    if content.is_empty() {
        md.push_str("_No content_\n\n");
    } else {
        md.push_str(content);
        md.push_str("\n\n");
    }

    md
}

/// Title used as the page heading: the title on a single line, or the URL when empty
fn heading_text(record: &PageRecord) -> String {
    let title = record.title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        record.url.clone()
    } else {
        title
    }
}

/// Derives a unique markdown file name from a page title
///
/// Spaces become underscores, characters outside `[A-Za-z0-9_-]` are dropped,
/// and the stem is truncated to 50 characters. Collisions with names in
/// `used` get a numeric suffix. Untitled pages are named `page`.
pub fn markdown_file_name(record: &PageRecord, used: &mut HashSet<String>) -> String {
    let stem: String = record
        .title
        .trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .take(MAX_FILE_STEM)
        .collect();
    let stem = if stem.is_empty() {
        "page".to_string()
    } else {
        stem
    };

    let extension = ExportFormat::Markdown.extension();
    let mut name = format!("{}.{}", stem, extension);
    let mut suffix = 2;
    while used.contains(&name) {
        name = format!("{}_{}.{}", stem, suffix, extension);
        suffix += 1;
    }

    used.insert(name.clone());
    name
}

/// Writes one markdown file per record into `dir`
///
/// The directory is created if needed. Returns the written paths in record order.
pub fn write_markdown_pages(records: &[PageRecord], dir: &Path) -> ExportResult<Vec<PathBuf>> {
    for record in records {
        record.validate()?;
    }

    fs::create_dir_all(dir)?;

    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(records.len());

    for record in records {
        let path = dir.join(markdown_file_name(record, &mut used));
        fs::write(&path, format_page(record, 1))?;
        written.push(path);
    }

    Ok(written)
}
