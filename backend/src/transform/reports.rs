//! Partition student aggregates by department and build result sheets.
//!
//! Departments are visited in curriculum order. A department with no
//! matching student is left out entirely; students whose department is
//! unset (or not in the curriculum) appear in no report.

use crate::curriculum::Curriculum;
use crate::models::{DepartmentReport, ReportRow, ReportSet};
use crate::transform::aggregate::StudentAggregates;
use crate::transform::classify::classify;

/// Build one report per department that has at least one student.
pub fn build_reports(students: &StudentAggregates, curriculum: &Curriculum) -> ReportSet {
    let mut reports = Vec::new();

    for department in curriculum.iter() {
        let courses = department.course_codes();

        let rows: Vec<ReportRow> = students
            .iter()
            .filter(|s| s.department.as_deref() == Some(department.code.as_str()))
            .map(|student| ReportRow {
                student_id: student.student_id.clone(),
                student_name: student.student_name.clone(),
                statuses: courses
                    .iter()
                    .map(|code| classify(student.outcome(code)))
                    .collect(),
            })
            .collect();

        if rows.is_empty() {
            continue;
        }

        reports.push(DepartmentReport {
            department: department.code.clone(),
            courses: courses.iter().map(|c| c.to_string()).collect(),
            rows,
        });
    }

    ReportSet::new(reports)
}

/// Students that ended up in no report.
pub fn unassigned_count(students: &StudentAggregates, curriculum: &Curriculum) -> usize {
    students
        .iter()
        .filter(|s| !s.department.as_deref().is_some_and(|d| curriculum.contains(d)))
        .count()
}
