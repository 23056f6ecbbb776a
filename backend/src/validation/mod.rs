//! JSON Schema validation for curriculum documents.
//!
//! The curriculum schema is embedded at compile time from
//! `schemas/curriculum.schema.json` (Draft 7).
//!
//! # Accepted shapes
//!
//! ```json
//! {
//!   "CSE": ["CS101", "CS102"],
//!   "ECE": {
//!     "title": "Electronics & Communication",
//!     "courses": { "Circuit Theory": "EC101", "Signals": "EC102" }
//!   }
//! }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use resultsheet::validation::validate_curriculum;
//!
//! assert!(validate_curriculum(&json!({ "CSE": ["CS101"] })).is_ok());
//! assert!(validate_curriculum(&json!({ "CSE": [42] })).is_err());
//! ```

use serde_json::Value;

const CURRICULUM_SCHEMA: &str = include_str!("../../schemas/curriculum.schema.json");

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every violation otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick yes/no check.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

fn curriculum_schema() -> Result<Value, Vec<String>> {
    serde_json::from_str(CURRICULUM_SCHEMA)
        .map_err(|e| vec![format!("Invalid embedded curriculum schema: {}", e)])
}

/// Validate a curriculum document.
pub fn validate_curriculum(data: &Value) -> Result<(), Vec<String>> {
    let schema = curriculum_schema()?;
    validate(&schema, data)
}

/// Quick check against the curriculum schema.
pub fn is_valid_curriculum(data: &Value) -> bool {
    curriculum_schema().is_ok_and(|schema| is_valid(&schema, data))
}
