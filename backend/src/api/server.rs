//! HTTP server for the result sheet API.
//!
//! # API Endpoints
//!
//! | Method | Path                                 | Description                        |
//! |--------|--------------------------------------|------------------------------------|
//! | GET    | `/health`                            | Health check                       |
//! | GET    | `/api/curriculum`                    | Departments and their courses      |
//! | GET    | `/api/stats`                         | Counters and recent activity       |
//! | POST   | `/api/upload`                        | Upload a result file (multipart)   |
//! | GET    | `/api/reports?q=`                    | Current reports, optional search   |
//! | GET    | `/api/reports/download`              | All departments as one workbook    |
//! | GET    | `/api/reports/{department}/download` | One department (`?format=csv`)     |
//! | GET    | `/api/logs`                          | SSE stream for real-time logs      |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, Method},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::state::SessionState;
use super::types::{CurriculumListing, StatsResponse, UploadResponse};
use crate::curriculum::Curriculum;
use crate::error::{ServerError, ServerResult};
use crate::export::{
    department_csv, department_csv_file_name, department_file_name, ReportEncoder,
    WorkbookEncoder, XLSX_CONTENT_TYPE,
};
use crate::transform::pipeline::{generate_bytes, GenerateOptions};

/// Env var for the listening port.
pub const PORT_ENV: &str = "RESULTSHEET_PORT";

pub const DEFAULT_PORT: u16 = 3000;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub curriculum: Arc<Curriculum>,
    pub options: Arc<GenerateOptions>,
    pub session: Arc<RwLock<SessionState>>,
}

impl AppState {
    pub fn new(curriculum: Curriculum, options: GenerateOptions) -> Self {
        Self {
            curriculum: Arc::new(curriculum),
            options: Arc::new(options),
            session: Arc::new(RwLock::new(SessionState::new())),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/curriculum", get(curriculum))
        .route("/api/stats", get(stats))
        .route(
            "/api/upload",
            post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/reports", get(reports))
        .route("/api/reports/download", get(download_all))
        .route("/api/reports/{department}/download", get(download_department))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(
    port: u16,
    curriculum: Curriculum,
    options: GenerateOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let departments = curriculum.len();
    let app = router(AppState::new(curriculum, options));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Result sheet server running on http://localhost:{}", port);
    println!("   Curriculum: {} departments", departments);
    println!("   POST /api/upload                       - Upload result file");
    println!("   GET  /api/reports                      - Current reports (?q= search)");
    println!("   GET  /api/reports/download             - Workbook of all departments");
    println!("   GET  /api/reports/{{dept}}/download      - Single department");
    println!("   GET  /api/logs                         - SSE log stream");
    println!("   GET  /health                           - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "resultsheet",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "reports": "GET /api/reports",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn curriculum(State(state): State<AppState>) -> Json<CurriculumListing> {
    Json(CurriculumListing::from(state.curriculum.as_ref()))
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let session = state.session.read().await;
    Json(StatsResponse {
        stats: session.stats(&state.curriculum),
        recent_activity: session.activity().cloned().collect(),
    })
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    run_generation(&state, bytes, file_name).await.map(Json)
}

/// Generate outside the session lock; swap the result in only on success.
pub async fn run_generation(
    state: &AppState,
    bytes: Vec<u8>,
    file_name: Option<String>,
) -> ServerResult<UploadResponse> {
    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let curriculum = Arc::clone(&state.curriculum);
    let options = Arc::clone(&state.options);
    let result = tokio::task::spawn_blocking(move || generate_bytes(&bytes, &curriculum, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    let mut session = state.session.write().await;
    match result {
        Ok(outcome) => {
            session.record_success(outcome, file_name);
            let current = session
                .current()
                .ok_or_else(|| ServerError::Internal("session lost the new reports".into()))?;
            Ok(UploadResponse::from_current(current, None))
        }
        Err(e) => {
            log_error(e.to_string());
            session.record_failure(e.to_string());
            Err(e.into())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub q: Option<String>,
}

async fn reports(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ServerResult<Json<UploadResponse>> {
    let session = state.session.read().await;
    let current = session.current().ok_or_else(no_reports)?;
    Ok(Json(UploadResponse::from_current(current, query.q.as_deref())))
}

async fn download_all(State(state): State<AppState>) -> ServerResult<Response> {
    let session = state.session.read().await;
    let current = session.current().ok_or_else(no_reports)?;
    let bytes = WorkbookEncoder.encode(&current.outcome.reports)?;
    Ok(attachment(XLSX_CONTENT_TYPE, &state.options.workbook_name, bytes))
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    /// `xlsx` (default) or `csv`
    pub format: Option<String>,
}

async fn download_department(
    State(state): State<AppState>,
    Path(department): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> ServerResult<Response> {
    let session = state.session.read().await;
    let current = session.current().ok_or_else(no_reports)?;
    let report = current
        .outcome
        .reports
        .get(&department)
        .ok_or_else(|| ServerError::NotFound(format!("No report for department '{}'", department)))?;

    match query.format.as_deref().unwrap_or("xlsx") {
        "xlsx" => {
            let bytes = WorkbookEncoder.encode_department(report)?;
            Ok(attachment(XLSX_CONTENT_TYPE, &department_file_name(&department), bytes))
        }
        "csv" => {
            let bytes = department_csv(report, b',')?;
            Ok(attachment("text/csv; charset=utf-8", &department_csv_file_name(&department), bytes))
        }
        other => Err(ServerError::BadRequest(format!("Unknown format '{}'", other))),
    }
}

fn no_reports() -> ServerError {
    ServerError::NotFound("No reports generated yet".into())
}

fn attachment(content_type: &str, file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}
