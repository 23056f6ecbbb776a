//! # Resultsheet - department-wise result sheets from raw exam marks
//!
//! Takes a results export with one row per (student, subject), groups the
//! rows per student, assigns each student a department from the curriculum
//! and builds one sheet per department with a status for every course.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ xlsx / CSV  │────▶│   Parser    │────▶│  Transform  │────▶│   Export    │
//! │  (marks)    │     │ (auto-fmt)  │     │ (aggregate) │     │ (xlsx/csv)  │
//! └─────────────┘     └─────────────┘     └──────▲──────┘     └─────────────┘
//!                                                │
//!                                         ┌──────┴──────┐
//!                                         │ Curriculum  │
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use resultsheet::{generate_file, Curriculum, GenerateOptions, ReportEncoder, WorkbookEncoder};
//!
//! let curriculum = Curriculum::builtin()?;
//! let outcome = generate_file("marks.xlsx", &curriculum, &GenerateOptions::default())?;
//! std::fs::write("Generated_Result_Sheets.xlsx", WorkbookEncoder.encode(&outcome.reports)?)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Status, student aggregates and department reports
//! - [`curriculum`] - Department / course registry
//! - [`parser`] - Workbook and CSV decoding with auto-detection
//! - [`transform`] - Aggregation, classification and the pipeline
//! - [`export`] - Workbook, CSV and JSON output
//! - [`validation`] - Curriculum schema validation
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Curriculum registry
pub mod curriculum;
pub mod validation;

// Decoding
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CurriculumError,
    DecodeError,
    EncodeError,
    PipelineError,
    ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    DepartmentReport,
    RawRecord,
    ReportRow,
    ReportSet,
    Status,
    StatusCounts,
    StudentAggregate,
};

pub use curriculum::{Course, Curriculum, Department};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    detect_format,
    parse_bytes_auto,
    parse_file_auto,
    CsvDecoder,
    ParseResult,
    SheetDecoder,
    SourceFormat,
    WorkbookDecoder,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    aggregate,
    aggregate_with,
    build_reports,
    classify,
    ColumnAliases,
    StudentAggregates,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    generate_bytes,
    generate_file,
    generate_records,
    GenerateOptions,
    GenerationOutcome,
    GenerationSummary,
    SourceInfo,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{
    department_csv,
    department_file_name,
    JsonEncoder,
    ReportEncoder,
    WorkbookEncoder,
    WORKBOOK_FILE_NAME,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid_curriculum, validate_curriculum};

// Server
pub mod server {
    pub use crate::api::server::{
        router, start_server, AppState, DEFAULT_PORT, MAX_UPLOAD_BYTES, PORT_ENV,
    };
}
