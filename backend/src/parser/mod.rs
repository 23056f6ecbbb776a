//! Decode uploaded result files into rows.
//!
//! Two decoders share the [`SheetDecoder`] capability:
//!
//! - [`WorkbookDecoder`] - `.xlsx` / `.xls` / `.ods` via calamine
//! - [`CsvDecoder`] - delimited text with encoding and delimiter auto-detection
//!
//! [`parse_bytes_auto`] sniffs the content and picks one. Every row becomes a
//! [`RawRecord`] keyed by the header row, in column order. No curriculum
//! logic lives here.

pub mod delimited;
pub mod workbook;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DecodeError, DecodeResult};
use crate::models::RawRecord;

pub use delimited::{decode_content, detect_delimiter, detect_encoding, parse_text, CsvDecoder};
pub use workbook::WorkbookDecoder;

/// Kind of source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Workbook,
    Csv,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Workbook => write!(f, "workbook"),
            SourceFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Decoded rows with metadata about the source.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub records: Vec<RawRecord>,
    pub format: SourceFormat,
    pub headers: Vec<String>,
    /// Detected text encoding (CSV only).
    pub encoding: Option<String>,
    /// Detected or given delimiter (CSV only).
    pub delimiter: Option<char>,
    /// Worksheet the rows were read from (workbooks only).
    pub sheet: Option<String>,
}

/// Turns raw file bytes into rows.
pub trait SheetDecoder {
    fn decode(&self, bytes: &[u8]) -> DecodeResult<ParseResult>;
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Guess the format from the leading bytes. Anything that is not a zip
/// container or an OLE2 compound file is treated as delimited text.
pub fn detect_format(bytes: &[u8]) -> SourceFormat {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        SourceFormat::Workbook
    } else {
        SourceFormat::Csv
    }
}

/// Decode bytes with format auto-detection.
pub fn parse_bytes_auto(bytes: &[u8]) -> DecodeResult<ParseResult> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyFile);
    }

    match detect_format(bytes) {
        SourceFormat::Workbook => WorkbookDecoder::default().decode(bytes),
        SourceFormat::Csv => CsvDecoder::default().decode(bytes),
    }
}

/// Read and decode a file with format auto-detection.
///
/// # Example
/// ```ignore
/// let result = parse_file_auto("results.xlsx")?;
/// println!("{} rows from sheet {:?}", result.records.len(), result.sheet);
/// ```
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> DecodeResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_zip_as_workbook() {
        assert_eq!(detect_format(b"PK\x03\x04rest"), SourceFormat::Workbook);
    }

    #[test]
    fn test_detect_ole_as_workbook() {
        let mut bytes = OLE_MAGIC.to_vec();
        bytes.extend_from_slice(&[0, 0, 0]);
        assert_eq!(detect_format(&bytes), SourceFormat::Workbook);
    }

    #[test]
    fn test_detect_text_as_csv() {
        assert_eq!(detect_format(b"RegNo;Code\n1;CS101"), SourceFormat::Csv);
    }

    #[test]
    fn test_empty_bytes() {
        assert!(matches!(parse_bytes_auto(b""), Err(DecodeError::EmptyFile)));
    }

    #[test]
    fn test_auto_csv() {
        let result = parse_bytes_auto(b"RegNo,Code,Result\n1,CS101,PASS\n").unwrap();
        assert_eq!(result.format, SourceFormat::Csv);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0]["Code"], "CS101");
    }

    #[test]
    fn test_broken_workbook_is_decode_error() {
        let result = parse_bytes_auto(b"PK\x03\x04 not really a zip");
        assert!(matches!(result, Err(DecodeError::Workbook(_))));
    }
}
