//! High-level pipeline API: raw result file to department reports.
//!
//! Combines all steps: decoding, per-student aggregation, department
//! partitioning and status classification.
//!
//! # Example
//!
//! ```rust,ignore
//! use resultsheet::curriculum::Curriculum;
//! use resultsheet::transform::pipeline::{generate_file, GenerateOptions};
//!
//! let curriculum = Curriculum::builtin()?;
//! let outcome = generate_file("results.xlsx", &curriculum, &GenerateOptions::default())?;
//! println!("{} departments", outcome.reports.len());
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::aggregate::{aggregate_with, ColumnAliases};
use super::reports::{build_reports, unassigned_count};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::curriculum::Curriculum;
use crate::error::{CurriculumResult, PipelineError, PipelineResult};
use crate::export::WORKBOOK_FILE_NAME;
use crate::models::{RawRecord, ReportSet};
use crate::parser::{parse_bytes_auto, ParseResult, SourceFormat};

/// Env var naming a curriculum JSON file.
pub const CURRICULUM_ENV: &str = "RESULTSHEET_CURRICULUM";

/// Options for a generation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateOptions {
    /// Curriculum file; the embedded curriculum is used when unset.
    pub curriculum_path: Option<PathBuf>,

    /// Column names recognised in the input.
    pub aliases: ColumnAliases,

    /// File name of the all-departments workbook.
    pub workbook_name: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            curriculum_path: None,
            aliases: ColumnAliases::default(),
            workbook_name: WORKBOOK_FILE_NAME.to_string(),
        }
    }
}

impl GenerateOptions {
    /// Defaults, with the curriculum path taken from `RESULTSHEET_CURRICULUM`.
    pub fn from_env() -> Self {
        let curriculum_path = std::env::var(CURRICULUM_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self {
            curriculum_path,
            ..Self::default()
        }
    }

    /// Load the configured curriculum, or the embedded one.
    pub fn load_curriculum(&self) -> CurriculumResult<Curriculum> {
        Curriculum::load_or_builtin(self.curriculum_path.as_deref())
    }
}

/// Where the rows came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub format: SourceFormat,
    pub headers: Vec<String>,
    pub row_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl SourceInfo {
    fn from_parse(parsed: &ParseResult) -> Self {
        Self {
            format: parsed.format,
            headers: parsed.headers.clone(),
            row_count: parsed.records.len(),
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            sheet: parsed.sheet.clone(),
        }
    }
}

/// Counters for one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub rows_read: usize,
    /// Rows dropped because they had no student id.
    pub rows_without_id: usize,
    pub students_aggregated: usize,
    pub students_reported: usize,
    /// Students with no department, or one the curriculum does not define.
    pub unassigned_students: usize,
    pub departments: usize,
}

/// Result of a complete generation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutcome {
    pub reports: ReportSet,
    pub summary: GenerationSummary,
    pub source: SourceInfo,
}

/// Generate reports from a result file on disk.
pub fn generate_file(
    path: impl AsRef<Path>,
    curriculum: &Curriculum,
    options: &GenerateOptions,
) -> PipelineResult<GenerationOutcome> {
    let path = path.as_ref();
    log_info(format!("📖 Reading {}", path.display()));
    let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode(e.into()))?;
    generate_bytes(&bytes, curriculum, options)
}

/// Generate reports from uploaded file bytes (workbook or CSV).
pub fn generate_bytes(
    bytes: &[u8],
    curriculum: &Curriculum,
    options: &GenerateOptions,
) -> PipelineResult<GenerationOutcome> {
    log_info("Detecting file format...");
    let parsed = parse_bytes_auto(bytes)?;
    generate_parsed(parsed, curriculum, options)
}

/// Generate reports from rows that were already decoded.
pub fn generate_records(
    records: Vec<RawRecord>,
    headers: Vec<String>,
    curriculum: &Curriculum,
    options: &GenerateOptions,
) -> PipelineResult<GenerationOutcome> {
    let parsed = ParseResult {
        records,
        format: SourceFormat::Csv,
        headers,
        encoding: None,
        delimiter: None,
        sheet: None,
    };
    generate_parsed(parsed, curriculum, options)
}

fn generate_parsed(
    parsed: ParseResult,
    curriculum: &Curriculum,
    options: &GenerateOptions,
) -> PipelineResult<GenerationOutcome> {
    let source = SourceInfo::from_parse(&parsed);
    log_source(&source);

    log_info("📦 Grouping rows by student...");
    let aggregation = aggregate_with(&parsed.records, curriculum, &options.aliases);
    log_success(format!("{} students", aggregation.students.len()));
    if aggregation.rows_without_id > 0 {
        log_warning(format!(
            "{} rows skipped (no student id)",
            aggregation.rows_without_id
        ));
    }

    log_info("🗂️  Building department reports...");
    let reports = build_reports(&aggregation.students, curriculum);
    let unassigned = unassigned_count(&aggregation.students, curriculum);
    if unassigned > 0 {
        log_warning(format!("{} students matched no department", unassigned));
    }

    if reports.is_empty() {
        return Err(PipelineError::NoMatchingData);
    }

    for report in &reports {
        log_info_indent(
            format!(
                "{}: {} students × {} courses",
                report.department,
                report.rows.len(),
                report.courses.len()
            ),
            1,
        );
    }

    let summary = GenerationSummary {
        rows_read: aggregation.rows_read,
        rows_without_id: aggregation.rows_without_id,
        students_aggregated: aggregation.students.len(),
        students_reported: reports.student_count(),
        unassigned_students: unassigned,
        departments: reports.len(),
    };

    log_success(format!(
        "Generated reports for {} students across {} departments",
        summary.students_reported, summary.departments
    ));

    Ok(GenerationOutcome {
        reports,
        summary,
        source,
    })
}

fn log_source(source: &SourceInfo) {
    match source.format {
        SourceFormat::Workbook => log_success(format!(
            "Read workbook sheet '{}'",
            source.sheet.as_deref().unwrap_or("?")
        )),
        SourceFormat::Csv => {
            if let Some(encoding) = &source.encoding {
                log_success(format!("Detected encoding: {}", encoding));
            }
            if let Some(d) = source.delimiter {
                log_success(format!("Detected separator: '{}'", format_delimiter(d)));
            }
        }
    }
    log_success(format!(
        "Read {} rows, {} columns",
        source.row_count,
        source.headers.len()
    ));
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use serde_json::{json, Value};

    fn rows(values: Vec<Value>) -> Vec<RawRecord> {
        values
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    fn run(curriculum: &Curriculum, input: Vec<Value>) -> PipelineResult<GenerationOutcome> {
        generate_records(rows(input), vec![], curriculum, &GenerateOptions::default())
    }

    #[test]
    fn test_default_options() {
        let opts = GenerateOptions::default();
        assert_eq!(opts.workbook_name, "Generated_Result_Sheets.xlsx");
        assert!(opts.curriculum_path.is_none());
        assert_eq!(opts.aliases.outcome, vec!["Result", "Grade"]);
    }

    #[test]
    fn test_options_partial_json() {
        let opts: GenerateOptions =
            serde_json::from_value(json!({ "aliases": { "studentId": ["Roll"] } })).unwrap();
        assert_eq!(opts.aliases.student_id, vec!["Roll"]);
        assert_eq!(opts.aliases.subject_code, vec!["Code", "Subject Code"]);
        assert_eq!(opts.workbook_name, WORKBOOK_FILE_NAME);
    }

    #[test]
    fn test_single_department() {
        let curriculum = Curriculum::from_departments(vec![("CSE", vec!["CS101", "CS102"])]).unwrap();
        let outcome = run(
            &curriculum,
            vec![
                json!({ "RegNo": 1, "Name": "A", "Dept": "CSE", "Code": "CS101", "Result": "PASS" }),
                json!({ "RegNo": 1, "Code": "CS102", "Result": "F" }),
            ],
        )
        .unwrap();

        let cse = outcome.reports.get("CSE").unwrap();
        assert_eq!(cse.headers(), vec!["Reg No", "Name", "CS101", "CS102"]);
        assert_eq!(cse.rows[0].statuses, vec![Status::Pass, Status::Fail]);
        assert_eq!(outcome.summary.students_reported, 1);
        assert_eq!(outcome.summary.departments, 1);
    }

    #[test]
    fn test_department_from_later_row() {
        let curriculum = Curriculum::from_departments(vec![("ECE", vec!["EC101", "EC102"])]).unwrap();
        let outcome = run(
            &curriculum,
            vec![
                json!({ "RegNo": 2, "Name": "B", "Code": "EC101", "Result": "P" }),
                json!({ "RegNo": 2, "Dept": "ECE", "Code": "EC102", "Result": "F" }),
            ],
        )
        .unwrap();

        let ece = outcome.reports.get("ECE").unwrap();
        assert_eq!(ece.status("2", "EC101"), Some(&Status::Pass));
        assert_eq!(ece.status("2", "EC102"), Some(&Status::Fail));
    }

    #[test]
    fn test_absent_grade_and_missing() {
        let curriculum =
            Curriculum::from_departments(vec![("CSE", vec!["CS101", "CS102", "CS103"])]).unwrap();
        let outcome = run(
            &curriculum,
            vec![
                json!({ "RegNo": 3, "Dept": "CSE", "Code": "CS101", "Result": "AB" }),
                json!({ "RegNo": 3, "Code": "CS102", "Grade": "B+" }),
            ],
        )
        .unwrap();

        let labels: Vec<&str> = outcome.reports.get("CSE").unwrap().rows[0]
            .statuses
            .iter()
            .map(|s| s.label())
            .collect();
        assert_eq!(labels, vec!["Absent", "B+", "Not Completed"]);
    }

    #[test]
    fn test_no_matching_data() {
        let curriculum = Curriculum::from_departments(vec![("CSE", vec!["CS101"])]).unwrap();
        let result = run(
            &curriculum,
            vec![json!({ "RegNo": 4, "Dept": "MBA", "Code": "MB101", "Result": "P" })],
        );
        assert!(matches!(result, Err(PipelineError::NoMatchingData)));
    }

    #[test]
    fn test_rows_without_id_counted() {
        let curriculum = Curriculum::from_departments(vec![("CSE", vec!["CS101"])]).unwrap();
        let outcome = run(
            &curriculum,
            vec![
                json!({ "Name": "Ghost", "Dept": "CSE", "Code": "CS101" }),
                json!({ "RegNo": 5, "Dept": "CSE", "Code": "CS101", "Result": "P" }),
                json!({ "RegNo": 6, "Code": "CS101" }),
            ],
        )
        .unwrap();

        assert_eq!(outcome.summary.rows_read, 3);
        assert_eq!(outcome.summary.rows_without_id, 1);
        assert_eq!(outcome.summary.students_aggregated, 2);
        assert_eq!(outcome.summary.unassigned_students, 1);
        assert_eq!(outcome.summary.students_reported, 1);
    }

    #[test]
    fn test_no_rows_is_no_matching_data() {
        let curriculum = Curriculum::from_departments(vec![("CSE", vec!["CS101"])]).unwrap();
        assert!(matches!(run(&curriculum, vec![]), Err(PipelineError::NoMatchingData)));
    }

    #[test]
    fn test_header_only_csv_is_no_matching_data() {
        let curriculum = Curriculum::from_departments(vec![("CSE", vec!["CS101"])]).unwrap();
        let options = GenerateOptions::default();

        let result = generate_bytes(b"RegNo,Dept,Code,Result\n", &curriculum, &options);
        assert!(matches!(result, Err(PipelineError::NoMatchingData)));

        let result = generate_bytes(b"RegNo,Dept,Code,Result\n,,,\n  ,,,\n", &curriculum, &options);
        assert!(matches!(result, Err(PipelineError::NoMatchingData)));
    }

    #[test]
    fn test_generate_bytes_csv() {
        let curriculum = Curriculum::from_departments(vec![("CSE", vec!["CS101"])]).unwrap();
        let csv = b"RegNo;Name;Dept;Code;Result\n21CS001;Anitha;CSE;CS101;PASS\n";
        let outcome = generate_bytes(csv, &curriculum, &GenerateOptions::default()).unwrap();

        assert_eq!(outcome.source.format, SourceFormat::Csv);
        assert_eq!(outcome.source.delimiter, Some(';'));
        assert_eq!(outcome.source.row_count, 1);
        assert_eq!(
            outcome.reports.get("CSE").unwrap().status("21CS001", "CS101"),
            Some(&Status::Pass)
        );
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let curriculum = Curriculum::from_departments(vec![("CSE", vec!["CS101"])]).unwrap();
        let result = generate_bytes(b"PK\x03\x04junk", &curriculum, &GenerateOptions::default());
        assert!(matches!(result, Err(PipelineError::Decode(_))));
    }

    #[test]
    fn test_generate_file_missing() {
        let curriculum = Curriculum::from_departments(vec![("CSE", vec!["CS101"])]).unwrap();
        let result = generate_file(
            "/definitely/not/here.xlsx",
            &curriculum,
            &GenerateOptions::default(),
        );
        assert!(matches!(result, Err(PipelineError::Decode(_))));
    }
}
