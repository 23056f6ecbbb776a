//! Curriculum Registry - read-only department to course mapping
//!
//! Loaded once at startup from a JSON document (or the embedded default)
//! and handed to the pipeline as an immutable dependency.
//!
//! Department order is the order of the document's keys; course order within
//! a department is the report column order.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::api::logs::{log_info, log_warning};
use crate::error::{CurriculumError, CurriculumResult};
use crate::validation::validate_curriculum;

/// Curriculum shipped with the binary.
const DEFAULT_CURRICULUM: &str = include_str!("../../data/curriculum.json");

/// A course of a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A department with its ordered course set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub courses: Vec<Course>,
}

impl Department {
    fn new(code: impl Into<String>, title: Option<String>) -> Self {
        Self {
            code: code.into(),
            title,
            courses: Vec::new(),
        }
    }

    /// Append a course unless its code is already present.
    /// Returns `false` when the code was a duplicate.
    fn push_course(&mut self, code: &str, title: Option<String>) -> bool {
        let code = code.trim();
        if self.courses.iter().any(|c| c.code == code) {
            return false;
        }
        self.courses.push(Course {
            code: code.to_string(),
            title,
        });
        true
    }

    pub fn course_codes(&self) -> Vec<&str> {
        self.courses.iter().map(|c| c.code.as_str()).collect()
    }
}

/// Registry of departments and their courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Curriculum {
    departments: Vec<Department>,
}

impl Curriculum {
    /// Build from `(department, courses)` pairs, in order.
    ///
    /// Duplicate course codes inside a department keep their first
    /// occurrence. A repeated department merges into the first one.
    pub fn from_departments<D, C, S>(departments: D) -> CurriculumResult<Self>
    where
        D: IntoIterator<Item = (S, C)>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut curriculum = Curriculum {
            departments: Vec::new(),
        };
        for (code, courses) in departments {
            let dept = curriculum.department_entry(code.as_ref().trim(), None);
            for course in courses {
                dept.push_course(course.as_ref(), None);
            }
        }

        if curriculum.departments.is_empty() {
            return Err(CurriculumError::Empty);
        }
        Ok(curriculum)
    }

    /// The curriculum embedded in the binary.
    pub fn builtin() -> CurriculumResult<Self> {
        Self::from_json(DEFAULT_CURRICULUM)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> CurriculumResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let curriculum = Self::from_json(&content)?;
        log_info(format!(
            "Loaded curriculum from {} ({} departments)",
            path.as_ref().display(),
            curriculum.len()
        ));
        Ok(curriculum)
    }

    /// Load from `path` when given, otherwise use the embedded default.
    pub fn load_or_builtin(path: Option<&Path>) -> CurriculumResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> CurriculumResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Build from an already parsed JSON document.
    pub fn from_value(value: &Value) -> CurriculumResult<Self> {
        validate_curriculum(value).map_err(|errors| CurriculumError::Invalid { errors })?;

        let entries = match value.as_object() {
            Some(obj) if !obj.is_empty() => obj,
            _ => return Err(CurriculumError::Empty),
        };

        let mut curriculum = Curriculum {
            departments: Vec::new(),
        };

        for (code, entry) in entries {
            let (title, courses) = match entry {
                Value::Object(obj) => (
                    obj.get("title").and_then(|t| t.as_str()).map(String::from),
                    obj.get("courses").unwrap_or(&Value::Null),
                ),
                other => (None, other),
            };

            let dept = curriculum.department_entry(code.trim(), title);
            let mut duplicates = Vec::new();

            match courses {
                Value::Array(codes) => {
                    for course in codes.iter().filter_map(|c| c.as_str()) {
                        if !dept.push_course(course, None) {
                            duplicates.push(course.trim().to_string());
                        }
                    }
                }
                Value::Object(by_title) => {
                    for (course_title, course) in by_title {
                        if let Some(course) = course.as_str() {
                            if !dept.push_course(course, Some(course_title.clone())) {
                                duplicates.push(course.trim().to_string());
                            }
                        }
                    }
                }
                _ => {}
            }

            if !duplicates.is_empty() {
                log_warning(format!(
                    "{}: duplicate course codes ignored: {}",
                    code,
                    duplicates.join(", ")
                ));
            }
        }

        Ok(curriculum)
    }

    fn department_entry(&mut self, code: &str, title: Option<String>) -> &mut Department {
        let idx = match self.departments.iter().position(|d| d.code == code) {
            Some(idx) => idx,
            None => {
                self.departments.push(Department::new(code, title));
                self.departments.len() - 1
            }
        };
        &mut self.departments[idx]
    }

    /// Department codes in declared order.
    pub fn departments(&self) -> Vec<&str> {
        self.departments.iter().map(|d| d.code.as_str()).collect()
    }

    /// Course codes of a department in declared order. Empty for an
    /// unknown department.
    pub fn courses_of(&self, department: &str) -> Vec<&str> {
        self.department(department)
            .map(|d| d.course_codes())
            .unwrap_or_default()
    }

    pub fn department(&self, code: &str) -> Option<&Department> {
        self.departments.iter().find(|d| d.code == code)
    }

    pub fn contains(&self, department: &str) -> bool {
        self.department(department).is_some()
    }

    pub fn title_of(&self, department: &str) -> Option<&str> {
        self.department(department).and_then(|d| d.title.as_deref())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Department> {
        self.departments.iter()
    }

    /// Number of departments.
    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    /// Sum of per-department course counts.
    pub fn course_count(&self) -> usize {
        self.departments.iter().map(|d| d.courses.len()).sum()
    }

    /// Distinct course codes across all departments.
    pub fn unique_course_count(&self) -> usize {
        self.departments
            .iter()
            .flat_map(|d| d.courses.iter().map(|c| c.code.as_str()))
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_loads() {
        let curriculum = Curriculum::builtin().unwrap();
        assert_eq!(curriculum.departments()[0], "CSE");
        assert!(curriculum.contains("AIML"));
        assert_eq!(curriculum.title_of("ECE"), Some("Electronics & Communication"));
        assert!(!curriculum.courses_of("CSE").is_empty());
    }

    #[test]
    fn test_declared_order_is_kept() {
        let curriculum = Curriculum::from_json(
            r#"{ "MECH": ["ME2", "ME1"], "CSE": ["CS9", "CS1", "CS5"] }"#,
        )
        .unwrap();

        assert_eq!(curriculum.departments(), vec!["MECH", "CSE"]);
        assert_eq!(curriculum.courses_of("CSE"), vec!["CS9", "CS1", "CS5"]);
    }

    #[test]
    fn test_course_map_keeps_titles() {
        let curriculum = Curriculum::from_json(
            r#"{ "ECE": { "title": "Electronics", "courses": { "Signals": "EC102", "Circuits": "EC101" } } }"#,
        )
        .unwrap();

        let dept = curriculum.department("ECE").unwrap();
        assert_eq!(dept.course_codes(), vec!["EC102", "EC101"]);
        assert_eq!(dept.courses[0].title.as_deref(), Some("Signals"));
    }

    #[test]
    fn test_duplicate_courses_collapse() {
        let curriculum =
            Curriculum::from_json(r#"{ "CSE": ["CS101", "CS102", "CS101"] }"#).unwrap();
        assert_eq!(curriculum.courses_of("CSE"), vec!["CS101", "CS102"]);
    }

    #[test]
    fn test_unique_course_count_across_departments() {
        let curriculum = Curriculum::from_departments(vec![
            ("CSE", vec!["CS101", "MA101"]),
            ("IT", vec!["IT101", "MA101"]),
        ])
        .unwrap();

        assert_eq!(curriculum.course_count(), 4);
        assert_eq!(curriculum.unique_course_count(), 3);
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(matches!(Curriculum::from_json("{}"), Err(CurriculumError::Empty)));
    }

    #[test]
    fn test_schema_violation_rejected() {
        let err = Curriculum::from_json(r#"{ "CSE": [101] }"#).unwrap_err();
        assert!(matches!(err, CurriculumError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_department_has_no_courses() {
        let curriculum = Curriculum::from_departments(vec![("CSE", vec!["CS101"])]).unwrap();
        assert!(curriculum.courses_of("ECE").is_empty());
        assert!(!curriculum.contains("ECE"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("curriculum.json");
        fs::write(&path, r#"{ "CSE": ["CS101"] }"#).unwrap();

        let curriculum = Curriculum::load(&path).unwrap();
        assert_eq!(curriculum.courses_of("CSE"), vec!["CS101"]);

        let missing = Curriculum::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(CurriculumError::Io(_))));
    }
}
