//! Domain models for result sheet generation.
//!
//! - [`RawRecord`] - One decoded input row (column name to cell value)
//! - [`Status`] - Outcome of one student on one course
//! - [`StudentAggregate`] - All rows of one student folded together
//! - [`DepartmentReport`] - One department's result sheet
//! - [`ReportSet`] - All department reports of a generation pass

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::transform::classify::classify;

/// Header of the student id column in generated sheets.
pub const REG_NO_HEADER: &str = "Reg No";

/// Header of the student name column in generated sheets.
pub const NAME_HEADER: &str = "Name";

/// One decoded input row. Column order follows the source sheet.
pub type RawRecord = Map<String, Value>;

/// Text form of a cell: trimmed, `None` when empty or null.
///
/// Whole numbers render without a fractional part so that a numeric
/// `1.0` registration number and the string `"1"` identify the same student.
pub fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            } else {
                n.to_string()
            }
        }
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// =============================================================================
// Status
// =============================================================================

/// Outcome of one student on one curriculum course.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Pass,
    Fail,
    Absent,
    /// No record for the course.
    NotCompleted,
    /// Unrecognised grade token, kept verbatim (upper-cased).
    Grade(String),
}

impl Status {
    /// Display label used in sheets and API payloads.
    pub fn label(&self) -> &str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Absent => "Absent",
            Status::NotCompleted => "Not Completed",
            Status::Grade(g) => g,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl Status {
    /// Inverse of [`Status::label`]. Anything that is not a label goes
    /// through [`classify`].
    pub fn from_label(label: Option<&str>) -> Status {
        match label {
            Some("PASS") => Status::Pass,
            Some("FAIL") => Status::Fail,
            Some("Absent") => Status::Absent,
            Some("Not Completed") => Status::NotCompleted,
            other => classify(other),
        }
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Status::from_label(raw.as_deref()))
    }
}

/// Per-status tally of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pass: usize,
    pub fail: usize,
    pub absent: usize,
    pub not_completed: usize,
    pub other: usize,
}

impl StatusCounts {
    fn record(&mut self, status: &Status) {
        match status {
            Status::Pass => self.pass += 1,
            Status::Fail => self.fail += 1,
            Status::Absent => self.absent += 1,
            Status::NotCompleted => self.not_completed += 1,
            Status::Grade(_) => self.other += 1,
        }
    }
}

// =============================================================================
// Student Aggregate
// =============================================================================

/// All rows of one student folded together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAggregate {
    pub student_id: String,
    pub student_name: Option<String>,
    /// Department inferred from the rows, if any row supplied one.
    pub department: Option<String>,
    /// Subject code to raw outcome. `None` means the row carried no outcome.
    pub subjects: HashMap<String, Option<String>>,
}

impl StudentAggregate {
    pub fn new(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            student_name: None,
            department: None,
            subjects: HashMap::new(),
        }
    }

    /// Raw outcome recorded for a subject, `None` if absent or empty.
    pub fn outcome(&self, subject_code: &str) -> Option<&str> {
        self.subjects.get(subject_code).and_then(|o| o.as_deref())
    }
}

// =============================================================================
// Reports
// =============================================================================

/// One student's line in a department report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub student_id: String,
    pub student_name: Option<String>,
    /// One status per course, aligned with [`DepartmentReport::courses`].
    pub statuses: Vec<Status>,
}

/// Result sheet of one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentReport {
    pub department: String,
    /// Course codes in curriculum order (report columns).
    pub courses: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl DepartmentReport {
    /// Column headers: `Reg No`, `Name`, then the course codes.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(self.courses.len() + 2);
        headers.push(REG_NO_HEADER.to_string());
        headers.push(NAME_HEADER.to_string());
        headers.extend(self.courses.iter().cloned());
        headers
    }

    /// Status of a student on a course.
    pub fn status(&self, student_id: &str, course: &str) -> Option<&Status> {
        let col = self.courses.iter().position(|c| c == course)?;
        self.rows
            .iter()
            .find(|r| r.student_id == student_id)
            .and_then(|r| r.statuses.get(col))
    }

    /// Rows as JSON objects keyed by column header.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                obj.insert(REG_NO_HEADER.to_string(), Value::String(row.student_id.clone()));
                obj.insert(
                    NAME_HEADER.to_string(),
                    row.student_name.clone().map(Value::String).unwrap_or(Value::Null),
                );
                for (course, status) in self.courses.iter().zip(&row.statuses) {
                    obj.insert(course.clone(), Value::String(status.label().to_string()));
                }
                Value::Object(obj)
            })
            .collect()
    }

    /// Copy keeping only rows whose name or id contains `query`
    /// (case-insensitive). An empty query keeps every row.
    pub fn search(&self, query: &str) -> DepartmentReport {
        let query = query.trim().to_lowercase();
        let rows = if query.is_empty() {
            self.rows.clone()
        } else {
            self.rows
                .iter()
                .filter(|r| {
                    r.student_id.to_lowercase().contains(&query)
                        || r
                            .student_name
                            .as_deref()
                            .is_some_and(|n| n.to_lowercase().contains(&query))
                })
                .cloned()
                .collect()
        };

        DepartmentReport {
            department: self.department.clone(),
            courses: self.courses.clone(),
            rows,
        }
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for status in self.rows.iter().flat_map(|r| &r.statuses) {
            counts.record(status);
        }
        counts
    }
}

/// Department reports of one generation pass, in curriculum order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSet {
    reports: Vec<DepartmentReport>,
}

impl ReportSet {
    pub fn new(reports: Vec<DepartmentReport>) -> Self {
        Self { reports }
    }

    pub fn get(&self, department: &str) -> Option<&DepartmentReport> {
        self.reports.iter().find(|r| r.department == department)
    }

    pub fn departments(&self) -> Vec<&str> {
        self.reports.iter().map(|r| r.department.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DepartmentReport> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Number of students across all reports.
    pub fn student_count(&self) -> usize {
        self.reports.iter().map(|r| r.rows.len()).sum()
    }

    /// Apply [`DepartmentReport::search`] to every report.
    pub fn search(&self, query: &str) -> ReportSet {
        ReportSet::new(self.reports.iter().map(|r| r.search(query)).collect())
    }
}

impl<'a> IntoIterator for &'a ReportSet {
    type Item = &'a DepartmentReport;
    type IntoIter = std::slice::Iter<'a, DepartmentReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_report() -> DepartmentReport {
        DepartmentReport {
            department: "CSE".into(),
            courses: vec!["CS101".into(), "CS102".into()],
            rows: vec![
                ReportRow {
                    student_id: "21CS001".into(),
                    student_name: Some("Anitha R".into()),
                    statuses: vec![Status::Pass, Status::Fail],
                },
                ReportRow {
                    student_id: "21CS002".into(),
                    student_name: Some("Bharath K".into()),
                    statuses: vec![Status::Absent, Status::NotCompleted],
                },
            ],
        }
    }

    #[test]
    fn test_cell_text_numbers() {
        assert_eq!(cell_text(&json!(1)), Some("1".to_string()));
        assert_eq!(cell_text(&json!(1.0)), Some("1".to_string()));
        assert_eq!(cell_text(&json!(7.5)), Some("7.5".to_string()));
    }

    #[test]
    fn test_cell_text_empty() {
        assert_eq!(cell_text(&json!("   ")), None);
        assert_eq!(cell_text(&Value::Null), None);
        assert_eq!(cell_text(&json!("  CSE ")), Some("CSE".to_string()));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(Status::Pass.to_string(), "PASS");
        assert_eq!(Status::NotCompleted.to_string(), "Not Completed");
        assert_eq!(Status::Grade("D+".into()).to_string(), "D+");
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_value(Status::Absent).unwrap();
        assert_eq!(json, json!("Absent"));

        let back: Status = serde_json::from_value(json).unwrap();
        assert_eq!(back, Status::Absent);

        let back: Status = serde_json::from_value(json!("Not Completed")).unwrap();
        assert_eq!(back, Status::NotCompleted);
        let back: Status = serde_json::from_value(json!("b+")).unwrap();
        assert_eq!(back, Status::Grade("B+".into()));
        let back: Status = serde_json::from_value(Value::Null).unwrap();
        assert_eq!(back, Status::NotCompleted);
    }

    #[test]
    fn test_records_keyed_by_header() {
        let records = sample_report().to_records();
        assert_eq!(records[0]["Reg No"], "21CS001");
        assert_eq!(records[0]["Name"], "Anitha R");
        assert_eq!(records[0]["CS102"], "FAIL");

        let keys: Vec<&String> = records[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["Reg No", "Name", "CS101", "CS102"]);
    }

    #[test]
    fn test_search_by_name_and_id() {
        let report = sample_report();
        assert_eq!(report.search("bharath").rows.len(), 1);
        assert_eq!(report.search("CS00").rows.len(), 2);
        assert_eq!(report.search("").rows.len(), 2);
        assert!(report.search("zzz").rows.is_empty());
    }

    #[test]
    fn test_status_counts() {
        let counts = sample_report().status_counts();
        assert_eq!(counts.pass, 1);
        assert_eq!(counts.fail, 1);
        assert_eq!(counts.absent, 1);
        assert_eq!(counts.not_completed, 1);
        assert_eq!(counts.other, 0);
    }

    #[test]
    fn test_status_lookup() {
        let report = sample_report();
        assert_eq!(report.status("21CS002", "CS101"), Some(&Status::Absent));
        assert_eq!(report.status("21CS002", "XX999"), None);
    }
}
