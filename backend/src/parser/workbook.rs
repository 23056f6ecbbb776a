//! Spreadsheet decoding (xlsx / xls / ods) via calamine.
//!
//! Reads one worksheet (the first by default). The first row is the header;
//! empty cells are left out of the record and blank rows are skipped.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::{Map, Number, Value};
use std::io::Cursor;

use super::{ParseResult, SheetDecoder, SourceFormat};
use crate::error::{DecodeError, DecodeResult};

/// Workbook decoder. `sheet: None` reads the first worksheet.
#[derive(Debug, Clone, Default)]
pub struct WorkbookDecoder {
    pub sheet: Option<String>,
}

impl WorkbookDecoder {
    pub fn with_sheet(sheet: impl Into<String>) -> Self {
        Self {
            sheet: Some(sheet.into()),
        }
    }
}

impl SheetDecoder for WorkbookDecoder {
    fn decode(&self, bytes: &[u8]) -> DecodeResult<ParseResult> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| DecodeError::Workbook(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        let used_sheet = match &self.sheet {
            Some(name) if sheet_names.iter().any(|s| s == name) => name.clone(),
            Some(name) => {
                return Err(DecodeError::Workbook(format!(
                    "sheet '{}' not found, available: {}",
                    name,
                    sheet_names.join(", ")
                )))
            }
            None => sheet_names.first().cloned().ok_or(DecodeError::NoWorksheet)?,
        };

        let range = workbook
            .worksheet_range(&used_sheet)
            .map_err(|e| DecodeError::Workbook(e.to_string()))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or(DecodeError::NoHeaders)?
            .iter()
            .map(|cell| cell_string(cell).unwrap_or_default())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(DecodeError::NoHeaders);
        }

        let mut records = Vec::new();
        for row in rows {
            let mut obj = Map::new();
            for (header, cell) in headers.iter().zip(row.iter()) {
                if header.is_empty() {
                    continue;
                }
                if let Some(value) = cell_value(cell) {
                    obj.insert(header.clone(), value);
                }
            }
            if !obj.is_empty() {
                records.push(obj);
            }
        }

        Ok(ParseResult {
            records,
            format: SourceFormat::Workbook,
            headers,
            encoding: None,
            delimiter: None,
            sheet: Some(used_sheet),
        })
    }
}

fn cell_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string().trim().to_string()),
    }
}

/// JSON value of a cell, `None` for empty or error cells.
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Int(i) => Some(Value::Number((*i).into())),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number),
        Data::Bool(b) => Some(Value::Bool(*b)),
        other => Some(Value::String(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook_bytes(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Results").unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_reads_first_sheet() {
        let bytes = workbook_bytes(&[
            &["RegNo", "Name", "Code", "Result"],
            &["21CS001", "Anitha", "CS101", "PASS"],
            &["21CS001", "", "CS102", "F"],
        ]);

        let result = WorkbookDecoder::default().decode(&bytes).unwrap();
        assert_eq!(result.format, SourceFormat::Workbook);
        assert_eq!(result.sheet.as_deref(), Some("Results"));
        assert_eq!(result.headers, vec!["RegNo", "Name", "Code", "Result"]);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0]["Name"], "Anitha");
        assert!(!result.records[1].contains_key("Name"));
    }

    #[test]
    fn test_numeric_cells_stay_numbers() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "RegNo").unwrap();
        sheet.write_string(0, 1, "Code").unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_string(1, 1, "CS101").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let result = WorkbookDecoder::default().decode(&bytes).unwrap();
        let reg_no = &result.records[0]["RegNo"];
        assert!(reg_no.is_number());
        assert_eq!(crate::models::cell_text(reg_no).as_deref(), Some("1"));
    }

    #[test]
    fn test_missing_sheet_is_error() {
        let bytes = workbook_bytes(&[&["RegNo"], &["1"]]);
        let result = WorkbookDecoder::with_sheet("Marks").decode(&bytes);
        assert!(matches!(result, Err(DecodeError::Workbook(_))));
    }

    #[test]
    fn test_blank_rows_skipped() {
        let bytes = workbook_bytes(&[&["RegNo", "Code"], &["1", "CS101"], &["", ""], &["2", "CS101"]]);
        let result = WorkbookDecoder::default().decode(&bytes).unwrap();
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn test_garbage_is_workbook_error() {
        let result = WorkbookDecoder::default().decode(b"definitely not a workbook");
        assert!(matches!(result, Err(DecodeError::Workbook(_))));
    }
}
