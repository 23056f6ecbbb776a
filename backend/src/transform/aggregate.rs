//! Fold raw result rows into one aggregate per student.
//!
//! Input has one row per (student, subject). Rows are folded left to right:
//!
//! ```text
//! Raw rows                                  →  Aggregates
//! ┌──────────────────────────────────────┐     ┌──────────────────────────────┐
//! │ RegNo: 1, Dept: CSE, Code: CS101, P  │     │ 1 (CSE)                      │
//! │ RegNo: 1,            Code: CS102, F  │  →  │   CS101: P, CS102: F         │
//! │ RegNo: 2, ...        Code: EC101, AB │     ├──────────────────────────────┤
//! └──────────────────────────────────────┘     │ 2 ...                        │
//!                                              └──────────────────────────────┘
//! ```
//!
//! # Rules
//!
//! - A row with no student id is dropped.
//! - Department comes from an explicit department column, otherwise from the
//!   first cell (in column order) that exactly names a curriculum department.
//!   The first department found for a student is kept; later values are ignored.
//! - The first non-empty name fills an unset name and is never overwritten,
//!   so a blank name on a student's first row is taken from a later row.
//! - Subject outcomes are last-write-wins per subject code.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::curriculum::Curriculum;
use crate::models::{cell_text, RawRecord, StudentAggregate};

/// Accepted column names for each input field, tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnAliases {
    pub student_id: Vec<String>,
    pub student_name: Vec<String>,
    pub department: Vec<String>,
    pub subject_code: Vec<String>,
    /// Outcome columns; an explicit result wins over a grade.
    pub outcome: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            student_id: names(&["RegNo", "Reg No", "HTNO"]),
            student_name: names(&["StudentName", "Name", "Student Name"]),
            department: names(&["Department", "Dept", "Branch"]),
            subject_code: names(&["Code", "Subject Code"]),
            outcome: names(&["Result", "Grade"]),
        }
    }
}

/// Student aggregates in order of first appearance, indexed by student id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentAggregates {
    students: Vec<StudentAggregate>,
    index: HashMap<String, usize>,
}

impl StudentAggregates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate for `student_id`, created on first sighting.
    fn entry(&mut self, student_id: &str) -> &mut StudentAggregate {
        let idx = match self.index.get(student_id) {
            Some(&idx) => idx,
            None => {
                self.students.push(StudentAggregate::new(student_id));
                let idx = self.students.len() - 1;
                self.index.insert(student_id.to_string(), idx);
                idx
            }
        };
        &mut self.students[idx]
    }

    pub fn get(&self, student_id: &str) -> Option<&StudentAggregate> {
        self.index.get(student_id).map(|&idx| &self.students[idx])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StudentAggregate> {
        self.students.iter()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

impl<'a> IntoIterator for &'a StudentAggregates {
    type Item = &'a StudentAggregate;
    type IntoIter = std::slice::Iter<'a, StudentAggregate>;

    fn into_iter(self) -> Self::IntoIter {
        self.students.iter()
    }
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub students: StudentAggregates,
    pub rows_read: usize,
    /// Rows dropped because no student id could be resolved.
    pub rows_without_id: usize,
}

/// Aggregate rows using the default column aliases.
pub fn aggregate(rows: &[RawRecord], curriculum: &Curriculum) -> Aggregation {
    aggregate_with(rows, curriculum, &ColumnAliases::default())
}

/// Aggregate rows with explicit column aliases.
pub fn aggregate_with(
    rows: &[RawRecord],
    curriculum: &Curriculum,
    aliases: &ColumnAliases,
) -> Aggregation {
    let mut students = StudentAggregates::new();
    let mut rows_without_id = 0;

    for row in rows {
        let Some(student_id) = first_text(row, &aliases.student_id) else {
            rows_without_id += 1;
            continue;
        };

        let department = resolve_department(row, &aliases.department, curriculum);
        let name = first_text(row, &aliases.student_name);

        let student = students.entry(&student_id);
        if student.department.is_none() {
            student.department = department;
        }
        if student.student_name.is_none() {
            student.student_name = name;
        }

        if let Some(code) = first_text(row, &aliases.subject_code) {
            student.subjects.insert(code, first_text(row, &aliases.outcome));
        }
    }

    Aggregation {
        students,
        rows_read: rows.len(),
        rows_without_id,
    }
}

/// Text of the first alias column holding a non-empty value.
fn first_text(row: &RawRecord, aliases: &[String]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| row.get(alias))
        .find_map(cell_text)
}

/// Explicit department column first, then a scan of every cell for an exact
/// curriculum department name. The scan follows column order; first match wins.
fn resolve_department(row: &RawRecord, aliases: &[String], curriculum: &Curriculum) -> Option<String> {
    let explicit = aliases
        .iter()
        .filter_map(|alias| match row.get(alias) {
            Some(Value::String(s)) => Some(s.trim()),
            _ => None,
        })
        .find(|s| !s.is_empty());

    if let Some(dept) = explicit {
        return Some(dept.to_string());
    }

    row.values().find_map(|value| match value {
        Value::String(s) if curriculum.contains(s.trim()) => Some(s.trim().to_string()),
        _ => None,
    })
}
