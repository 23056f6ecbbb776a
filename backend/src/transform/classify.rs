//! Per-course outcome classification.
//!
//! | Raw outcome (trimmed, any case) | Status          |
//! |---------------------------------|-----------------|
//! | missing / empty                 | `Not Completed` |
//! | `PASS`, `P`                     | `PASS`          |
//! | `FAIL`, `F`                     | `FAIL`          |
//! | `AB`                            | `Absent`        |
//! | anything else                   | verbatim, upper-cased |
//!
//! Unrecognised tokens are grades from another scale, not errors.

use crate::models::Status;

/// Classify a raw outcome value.
pub fn classify(raw: Option<&str>) -> Status {
    let normalized = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_uppercase(),
        _ => return Status::NotCompleted,
    };

    match normalized.as_str() {
        "PASS" | "P" => Status::Pass,
        "FAIL" | "F" => Status::Fail,
        "AB" => Status::Absent,
        _ => Status::Grade(normalized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_fail_tokens() {
        assert_eq!(classify(Some("PASS")), Status::Pass);
        assert_eq!(classify(Some("p")), Status::Pass);
        assert_eq!(classify(Some(" Fail ")), Status::Fail);
        assert_eq!(classify(Some("f")), Status::Fail);
    }

    #[test]
    fn test_absent() {
        assert_eq!(classify(Some("AB")), Status::Absent);
        assert_eq!(classify(Some("ab")), Status::Absent);
    }

    #[test]
    fn test_missing_is_not_completed() {
        assert_eq!(classify(None), Status::NotCompleted);
        assert_eq!(classify(Some("")), Status::NotCompleted);
        assert_eq!(classify(Some("   ")), Status::NotCompleted);
    }

    #[test]
    fn test_grade_passthrough() {
        assert_eq!(classify(Some("D+")), Status::Grade("D+".into()));
        assert_eq!(classify(Some(" a+ ")), Status::Grade("A+".into()));
        assert_eq!(classify(Some("RA")), Status::Grade("RA".into()));
    }

    #[test]
    fn test_spelled_out_absent_is_a_grade() {
        assert_eq!(classify(Some("absent")), Status::Grade("ABSENT".into()));
        assert_eq!(classify(Some("absent")).label(), "ABSENT");
        assert_eq!(classify(Some("Not Completed")).label(), "NOT COMPLETED");
    }

    #[test]
    fn test_pass_fail_and_grades_reclassify_to_themselves() {
        for raw in ["PASS", "p", "F", "fail", "D+", "absent"] {
            let once = classify(Some(raw));
            assert_eq!(classify(Some(once.label())).label(), once.label(), "raw {:?}", raw);
        }
    }

    #[test]
    fn test_reclassifying_settles_after_one_pass() {
        for raw in ["AB", "", "Not Completed", "b"] {
            let twice = classify(Some(classify(Some(raw)).label()));
            let thrice = classify(Some(twice.label()));
            assert_eq!(thrice, twice, "raw {:?}", raw);
        }
        assert_eq!(classify(Some(Status::Absent.label())).label(), "ABSENT");
    }

    #[test]
    fn test_grade_is_stable() {
        let once = classify(Some("b"));
        assert_eq!(classify(Some(once.label())), once);
    }
}
