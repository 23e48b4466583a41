//! Serializer traits and types
//!
//! This module defines the trait interface for export serializers and
//! the supported export formats.

use crate::record::PageRecord;
use crate::ConfigError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export
///
/// A well-formed record never produces one of these; they indicate either an
/// invariant violation upstream or a failing writer.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Record {url} violates the data model: {reason}")]
    InvalidRecord { url: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Output is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Supported interchange formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Markdown,
    Json,
    Xml,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Csv, Self::Markdown, Self::Json, Self::Xml];

    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for export serializers
///
/// Implementations are pure: the same records always produce the same text,
/// and no state is shared between calls.
pub trait RecordSerializer {
    /// The format this serializer produces
    fn format(&self) -> ExportFormat;

    /// Converts the records to text, in record order
    ///
    /// Records are assumed valid; `output::serialize` checks them first.
    fn serialize(&self, records: &[PageRecord]) -> ExportResult<String>;
}
