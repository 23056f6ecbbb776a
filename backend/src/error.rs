//! Error types for the result sheet pipeline.
//!
//! - [`DecodeError`] - Spreadsheet / CSV decoding errors
//! - [`CurriculumError`] - Curriculum registry loading errors
//! - [`EncodeError`] - Report export errors
//! - [`PipelineError`] - Top-level generation errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::api::types::error_response;

// =============================================================================
// Decoding Errors
// =============================================================================

/// Errors while turning an uploaded file into rows.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV content.
    #[error("Invalid CSV format: {0}")]
    Csv(String),

    /// Workbook could not be opened or read.
    #[error("Failed to open workbook: {0}")]
    Workbook(String),

    /// Workbook contains no worksheet.
    #[error("Workbook has no worksheet")]
    NoWorksheet,

    /// Empty file.
    #[error("File is empty")]
    EmptyFile,

    /// No header row found.
    #[error("No header row found")]
    NoHeaders,
}

// =============================================================================
// Curriculum Errors
// =============================================================================

/// Errors while loading the curriculum registry.
#[derive(Debug, Error)]
pub enum CurriculumError {
    /// IO error.
    #[error("Curriculum IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Curriculum JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document does not match the curriculum schema.
    #[error("Invalid curriculum: {}", errors.join("; "))]
    Invalid { errors: Vec<String> },

    /// Document declares no department.
    #[error("Curriculum defines no department")]
    Empty,
}

// =============================================================================
// Encoding Errors
// =============================================================================

/// Errors while exporting reports.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Workbook writer failed.
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// CSV writer failed.
    #[error("CSV error: {0}")]
    Csv(String),

    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing to export.
    #[error("No report to export")]
    NothingToExport,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level generation errors.
///
/// This is the error type returned by [`crate::transform::pipeline::generate_bytes`]
/// and friends. `NoMatchingData` is a user-facing outcome, distinct from a
/// decoder failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Decoding error.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// No student matched any curriculum department.
    #[error("No matching student data found for the defined curriculum")]
    NoMatchingData,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Export error.
    #[error("Export error: {0}")]
    Encode(#[from] EncodeError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(PipelineError::NoMatchingData) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(PipelineError::Decode(_)) => StatusCode::BAD_REQUEST,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Pipeline(_) | ServerError::Encode(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(error_response(&self.to_string()))).into_response()
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for curriculum operations.
pub type CurriculumResult<T> = Result<T, CurriculumError>;

/// Result type for export operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
