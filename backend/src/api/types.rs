//! REST API types.
//!
//! Reports are sent as row objects keyed by column header (`Reg No`, `Name`,
//! course codes), the same columns the exported sheets carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::state::{Activity, CurrentReports, SessionStats};
use crate::curriculum::Curriculum;
use crate::models::{DepartmentReport, StatusCounts};
use crate::transform::pipeline::{GenerationSummary, SourceInfo};

/// Response sent after an upload, and by the report listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Always "ready"; failures use [`error_response`]
    pub status: String,

    pub generated_at: DateTime<Utc>,

    /// One entry per department, in curriculum order
    pub reports: Vec<ReportPayload>,

    pub metadata: ResponseMetadata,
}

/// One department sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub department: String,
    pub headers: Vec<String>,
    pub rows: Vec<Value>,
    pub counts: StatusCounts,
}

impl From<&DepartmentReport> for ReportPayload {
    fn from(report: &DepartmentReport) -> Self {
        Self {
            department: report.department.clone(),
            headers: report.headers(),
            rows: report.to_records(),
            counts: report.status_counts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub source: SourceInfo,
    pub summary: GenerationSummary,
    /// Search applied to the rows, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl UploadResponse {
    /// Build from the session's current reports, optionally filtered.
    pub fn from_current(current: &CurrentReports, query: Option<&str>) -> Self {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let reports = match query {
            Some(q) => current.outcome.reports.search(q),
            None => current.outcome.reports.clone(),
        };

        UploadResponse {
            job_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            generated_at: current.generated_at,
            reports: reports.iter().map(ReportPayload::from).collect(),
            metadata: ResponseMetadata {
                file_name: current.file_name.clone(),
                source: current.outcome.source.clone(),
                summary: current.outcome.summary.clone(),
                query: query.map(str::to_string),
            },
        }
    }
}

/// Curriculum listing for `GET /api/curriculum`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumListing {
    pub total_departments: usize,
    pub total_courses: usize,
    pub departments: Vec<DepartmentListing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentListing {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub courses: Vec<String>,
}

impl From<&Curriculum> for CurriculumListing {
    fn from(curriculum: &Curriculum) -> Self {
        Self {
            total_departments: curriculum.len(),
            total_courses: curriculum.unique_course_count(),
            departments: curriculum
                .iter()
                .map(|d| DepartmentListing {
                    code: d.code.clone(),
                    title: d.title.clone(),
                    courses: d.course_codes().into_iter().map(str::to_string).collect(),
                })
                .collect(),
        }
    }
}

/// Dashboard counters and recent activity for `GET /api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: SessionStats,
    pub recent_activity: Vec<Activity>,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "reports": [],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::SessionState;
    use crate::transform::pipeline::{generate_records, GenerateOptions};

    fn current() -> CurrentReports {
        let curriculum = Curriculum::from_departments(vec![("CSE", vec!["CS101", "CS102"])]).unwrap();
        let rows = vec![
            json!({ "RegNo": "21CS001", "Name": "Anitha", "Dept": "CSE", "Code": "CS101", "Result": "PASS" }),
            json!({ "RegNo": "21CS002", "Name": "Bala", "Dept": "CSE", "Code": "CS101", "Result": "AB" }),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let outcome =
            generate_records(rows, vec![], &curriculum, &GenerateOptions::default()).unwrap();

        let mut state = SessionState::new();
        state.record_success(outcome, Some("marks.csv".into()));
        state.current().cloned().unwrap()
    }

    #[test]
    fn test_upload_response_shape() {
        let value = serde_json::to_value(UploadResponse::from_current(&current(), None)).unwrap();

        assert_eq!(value["status"], "ready");
        assert_eq!(value["reports"][0]["department"], "CSE");
        assert_eq!(value["reports"][0]["headers"], json!(["Reg No", "Name", "CS101", "CS102"]));
        assert_eq!(value["reports"][0]["rows"][1]["CS101"], "Absent");
        assert_eq!(value["reports"][0]["rows"][1]["CS102"], "Not Completed");
        assert_eq!(value["metadata"]["fileName"], "marks.csv");
        assert_eq!(value["metadata"]["summary"]["studentsReported"], 2);
        assert!(value["metadata"].get("query").is_none());
    }

    #[test]
    fn test_search_filters_rows() {
        let response = UploadResponse::from_current(&current(), Some(" bala "));
        assert_eq!(response.reports[0].rows.len(), 1);
        assert_eq!(response.reports[0].rows[0]["Reg No"], "21CS002");
        assert_eq!(response.metadata.query.as_deref(), Some("bala"));
    }

    #[test]
    fn test_blank_query_keeps_all() {
        let response = UploadResponse::from_current(&current(), Some("   "));
        assert_eq!(response.reports[0].rows.len(), 2);
        assert!(response.metadata.query.is_none());
    }

    #[test]
    fn test_curriculum_listing() {
        let curriculum = Curriculum::builtin().unwrap();
        let listing = CurriculumListing::from(&curriculum);
        assert_eq!(listing.total_departments, curriculum.len());
        assert_eq!(listing.departments[0].code, curriculum.departments()[0]);
    }

    #[test]
    fn test_error_response() {
        let value = error_response("No matching student data found for the defined curriculum");
        assert_eq!(value["status"], "error");
        assert!(value["error"].as_str().unwrap().contains("No matching"));
        assert_eq!(value["reports"], json!([]));
    }
}
