//! Per-server session state.
//!
//! Holds the latest successful generation and a short activity history.
//! A failed generation is recorded in the history but never replaces the
//! current reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::curriculum::Curriculum;
use crate::transform::pipeline::GenerationOutcome;

/// Activity entries kept, newest first.
pub const ACTIVITY_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub kind: ActivityKind,
}

/// The last generation, with when and from what it was produced.
#[derive(Debug, Clone)]
pub struct CurrentReports {
    pub outcome: GenerationOutcome,
    pub file_name: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_departments: usize,
    pub total_courses: usize,
    pub total_students: usize,
    pub reports_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    current: Option<CurrentReports>,
    activity: VecDeque<Activity>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&CurrentReports> {
        self.current.as_ref()
    }

    /// Replace the current reports and log the activity.
    pub fn record_success(&mut self, outcome: GenerationOutcome, file_name: Option<String>) {
        let message = format!(
            "Generated reports for {} students across {} departments",
            outcome.summary.students_reported, outcome.summary.departments
        );
        self.push_activity(message, ActivityKind::Success);
        self.current = Some(CurrentReports {
            outcome,
            file_name,
            generated_at: Utc::now(),
        });
    }

    /// Log a failed attempt; current reports stay as they were.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.push_activity(message.into(), ActivityKind::Error);
    }

    fn push_activity(&mut self, message: String, kind: ActivityKind) {
        self.activity.push_front(Activity {
            timestamp: Utc::now(),
            message,
            kind,
        });
        self.activity.truncate(ACTIVITY_LIMIT);
    }

    /// Newest first.
    pub fn activity(&self) -> impl Iterator<Item = &Activity> {
        self.activity.iter()
    }

    pub fn stats(&self, curriculum: &Curriculum) -> SessionStats {
        let (total_students, reports_count) = match &self.current {
            Some(current) => (
                current.outcome.reports.student_count(),
                current.outcome.reports.len(),
            ),
            None => (0, 0),
        };

        SessionStats {
            total_departments: curriculum.len(),
            total_courses: curriculum.unique_course_count(),
            total_students,
            reports_count,
        }
    }
}
