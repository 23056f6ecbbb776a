//! Delimited text decoding with encoding and delimiter auto-detection.

use serde_json::{Map, Value};

use super::{ParseResult, SheetDecoder, SourceFormat};
use crate::error::{DecodeError, DecodeResult};

/// CSV decoder. `delimiter: None` means auto-detect from the header line.
#[derive(Debug, Clone, Default)]
pub struct CsvDecoder {
    pub delimiter: Option<char>,
}

impl CsvDecoder {
    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }
}

impl SheetDecoder for CsvDecoder {
    fn decode(&self, bytes: &[u8]) -> DecodeResult<ParseResult> {
        let encoding = detect_encoding(bytes);
        let content = decode_content(bytes, &encoding)?;
        let delimiter = self.delimiter.unwrap_or_else(|| detect_delimiter(&content));
        parse_text(&content, delimiter, encoding)
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding.
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> DecodeResult<String> {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.into_owned(),
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded text with an explicit delimiter.
pub fn parse_text(content: &str, delimiter: char, encoding: String) -> DecodeResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(DecodeError::EmptyFile);
    }
    if !delimiter.is_ascii() {
        return Err(DecodeError::Csv(format!("delimiter '{}' is not ASCII", delimiter)));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DecodeError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().trim_matches('"').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DecodeError::NoHeaders);
    }

    let mut records = Vec::new();

    for (line_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            DecodeError::Csv(format!("line {}: {}", line_idx + 2, e))
        })?;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let raw_value = record.get(i).map(|s| s.trim()).unwrap_or("");
            obj.insert(header.clone(), Value::String(raw_value.to_string()));
        }

        records.push(obj);
    }

    Ok(ParseResult {
        records,
        format: SourceFormat::Csv,
        headers,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
        sheet: None,
    })
}
