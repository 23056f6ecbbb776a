//! Serialize department reports.
//!
//! - [`WorkbookEncoder`] - one xlsx sheet per department, in report order
//! - [`JsonEncoder`] - department to row objects, for API / CLI output
//! - [`department_csv`] - single department as delimited text
//!
//! Sheets carry the header row `Reg No`, `Name`, then the course codes.

use rust_xlsxwriter::{Format, Workbook};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{EncodeError, EncodeResult};
use crate::models::{DepartmentReport, ReportSet};

/// File name of the all-departments workbook.
pub const WORKBOOK_FILE_NAME: &str = "Generated_Result_Sheets.xlsx";

/// MIME type of xlsx files.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Longest sheet name Excel accepts.
const MAX_SHEET_NAME: usize = 31;

/// Turns a report set into file bytes.
pub trait ReportEncoder {
    fn encode(&self, reports: &ReportSet) -> EncodeResult<Vec<u8>>;

    /// Encode a single department on its own.
    fn encode_department(&self, report: &DepartmentReport) -> EncodeResult<Vec<u8>> {
        self.encode(&ReportSet::new(vec![report.clone()]))
    }
}

/// xlsx workbook writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookEncoder;

impl ReportEncoder for WorkbookEncoder {
    fn encode(&self, reports: &ReportSet) -> EncodeResult<Vec<u8>> {
        if reports.is_empty() {
            return Err(EncodeError::NothingToExport);
        }

        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let mut used_names = HashSet::new();

        for report in reports {
            let name = unique_sheet_name(&report.department, &mut used_names);
            let sheet = workbook.add_worksheet();
            sheet.set_name(&name)?;

            for (col, header) in report.headers().iter().enumerate() {
                sheet.write_string_with_format(0, col as u16, header, &header_format)?;
            }

            for (i, row) in report.rows.iter().enumerate() {
                let r = (i + 1) as u32;
                sheet.write_string(r, 0, &row.student_id)?;
                if let Some(name) = &row.student_name {
                    sheet.write_string(r, 1, name)?;
                }
                for (j, status) in row.statuses.iter().enumerate() {
                    sheet.write_string(r, (j + 2) as u16, status.label())?;
                }
            }

            sheet.autofit();
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// Pretty JSON: `{ "CSE": [ { "Reg No": .., "Name": .., "CS101": "PASS" } ] }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl JsonEncoder {
    pub fn to_value(&self, reports: &ReportSet) -> Value {
        let mut obj = Map::new();
        for report in reports {
            obj.insert(report.department.clone(), Value::Array(report.to_records()));
        }
        Value::Object(obj)
    }
}

impl ReportEncoder for JsonEncoder {
    fn encode(&self, reports: &ReportSet) -> EncodeResult<Vec<u8>> {
        serde_json::to_vec_pretty(&self.to_value(reports))
            .map_err(|e| EncodeError::Io(e.into()))
    }
}

/// One department as delimited text with a header row.
pub fn department_csv(report: &DepartmentReport, delimiter: u8) -> EncodeResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    let to_err = |e: csv::Error| EncodeError::Csv(e.to_string());

    writer.write_record(report.headers()).map_err(to_err)?;
    for row in &report.rows {
        let mut record = Vec::with_capacity(report.courses.len() + 2);
        record.push(row.student_id.as_str());
        record.push(row.student_name.as_deref().unwrap_or(""));
        record.extend(row.statuses.iter().map(|s| s.label()));
        writer.write_record(&record).map_err(to_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| EncodeError::Csv(e.to_string()))
}

/// Download name of a single-department workbook.
pub fn department_file_name(department: &str) -> String {
    format!("{}_Result_Sheet.xlsx", file_stem(department))
}

/// Download name of a single-department CSV file.
pub fn department_csv_file_name(department: &str) -> String {
    format!("{}_Result_Sheet.csv", file_stem(department))
}

fn file_stem(name: &str) -> String {
    regex::Regex::new(r"[^A-Za-z0-9_-]+")
        .ok()
        .map(|re| re.replace_all(name.trim(), "_").to_string())
        .unwrap_or_else(|| name.trim().to_string())
}

/// Excel-safe sheet name: no `[]:*?/\`, no leading/trailing quote,
/// at most 31 characters, never empty.
pub fn sheet_name(department: &str) -> String {
    let cleaned = regex::Regex::new(r"[\[\]:*?/\\]")
        .ok()
        .map(|re| re.replace_all(department, "_").to_string())
        .unwrap_or_else(|| department.to_string());

    let cleaned: String = cleaned
        .trim()
        .trim_matches('\'')
        .chars()
        .take(MAX_SHEET_NAME)
        .collect();

    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// Sheet names are case-insensitively unique within a workbook.
fn unique_sheet_name(department: &str, used: &mut HashSet<String>) -> String {
    let base = sheet_name(department);
    let mut name = base.clone();
    let mut n = 2;

    while used.contains(&name.to_lowercase()) {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
        name = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }

    used.insert(name.to_lowercase());
    name
}
