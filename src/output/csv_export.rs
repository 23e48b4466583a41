//! CSV serializer
//!
//! One row per record with the header `url,depth,title,content,links`.
//! Links are joined by a single space, which never occurs inside a valid URL.

use crate::output::traits::{ExportError, ExportFormat, ExportResult, RecordSerializer};
use crate::record::PageRecord;

/// Column order shared by every row
pub const CSV_HEADER: [&str; 5] = ["url", "depth", "title", "content", "links"];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSerializer;

impl RecordSerializer for CsvSerializer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn serialize(&self, records: &[PageRecord]) -> ExportResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;

        for record in records {
            let depth = record.depth.to_string();
            let links = record.links.join(" ");
            writer.write_record([
                record.url.as_str(),
                depth.as_str(),
                record.title.as_str(),
                record.content.as_str(),
                links.as_str(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Write(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ExportError::Encoding(e.to_string()))
    }
}
