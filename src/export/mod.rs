//! Export of stored activity records

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::gateway::ActivityRecord;

pub mod csv;
pub mod json;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self, ExportError> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }

    /// Guess the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| Self::from_str(ext).ok())
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] ::csv::Error),
}

/// Render records in the requested format
pub fn render_records(records: &[ActivityRecord], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => csv::records_to_string(records),
        ExportFormat::Json => json::to_pretty_string(records),
    }
}

/// Write records to a file in the requested format
pub fn export_records<P: AsRef<Path>>(
    records: &[ActivityRecord],
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => csv::export_records(records, output_path),
        ExportFormat::Json => json::export_json(&records, output_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::from_str("CSV").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_str("json").unwrap(), ExportFormat::Json);
        assert!(ExportFormat::from_str("pdf").is_err());
        assert_eq!(ExportFormat::from_path("out/records.json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path("records"), None);
    }
}
