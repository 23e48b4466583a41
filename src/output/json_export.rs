//! JSON serializer
//!
//! Emits a pretty-printed array of records. `parse_json` reads the same
//! text back into records.

use crate::output::traits::{ExportFormat, ExportResult, RecordSerializer};
use crate::record::PageRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl RecordSerializer for JsonSerializer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn serialize(&self, records: &[PageRecord]) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(records)?)
    }
}

/// Parses a JSON export back into records
pub fn parse_json(text: &str) -> ExportResult<Vec<PageRecord>> {
    Ok(serde_json::from_str(text)?)
}
