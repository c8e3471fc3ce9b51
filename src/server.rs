use crate::config::Config;
use crate::error::ProcessingError;
use crate::files;
use crate::processor::{DocumentProcessor, ProcessingResult};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// File name prefix of buffered uploads
pub const UPLOAD_PREFIX: &str = "upload-";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<DocumentProcessor>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(processor: DocumentProcessor, config: Config) -> Self {
        Self {
            processor: Arc::new(processor),
            config: Arc::new(config),
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: String,
    pub supported_formats: Vec<String>,
    pub languages: Vec<String>,
    pub ocr_workers: usize,
    pub max_file_size_bytes: usize,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let processor = DocumentProcessor::from_config(&config)?;
    let addr = config.bind_address();
    let state = AppState::new(processor, config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/process", post(handle_process))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

struct Upload {
    data: Bytes,
    file_name: Option<String>,
    content_type: Option<String>,
}

/// Handle document uploads
async fn handle_process(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessingResult>, ProcessingError> {
    let start = Instant::now();
    let max_file_size = state.config.max_file_size;
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_file_size))?;

        upload = Some(Upload {
            data,
            file_name,
            content_type,
        });
    }

    let upload = upload.ok_or(ProcessingError::MissingFile)?;

    if upload.data.len() > max_file_size {
        return Err(ProcessingError::FileTooLarge { max: max_file_size });
    }

    // The processor dispatches on the extension, so the temp file keeps it
    let extension = upload_extension(upload.file_name.as_deref(), upload.content_type.as_deref());
    let mut builder = tempfile::Builder::new();
    builder.prefix(UPLOAD_PREFIX).suffix(&extension);
    let mut temp_file = match &state.config.upload_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| ProcessingError::Internal(format!("Failed to create temp file: {}", e)))?;

    temp_file
        .write_all(&upload.data)
        .map_err(|e| ProcessingError::Internal(format!("Failed to write temp file: {}", e)))?;

    tracing::debug!(
        "Received {} ({} bytes)",
        upload.file_name.as_deref().unwrap_or("<unnamed>"),
        upload.data.len()
    );

    // temp_file moves into the task and is deleted when it drops, on every path
    let processor = state.processor.clone();
    let result = tokio::task::spawn_blocking(move || processor.process(temp_file.path()))
        .await
        .map_err(|e| ProcessingError::Internal(format!("Processing task failed: {}", e)))??;

    tracing::info!(
        "Request completed in {}ms: format {}, {} pages",
        start.elapsed().as_millis(),
        result.format,
        result.pages
    );

    Ok(Json(result))
}

fn multipart_error(e: MultipartError, max_file_size: usize) -> ProcessingError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ProcessingError::FileTooLarge { max: max_file_size }
    } else {
        ProcessingError::InvalidRequest(format!("Failed to parse multipart: {}", e))
    }
}

/// Extension for the stored upload: from the client file name when it has
/// one, otherwise from the content type. Empty when neither is known.
fn upload_extension(file_name: Option<&str>, content_type: Option<&str>) -> String {
    if let Some(name) = file_name {
        let extension = files::extension_of(Path::new(name));
        if !extension.is_empty() {
            return extension;
        }
    }

    match content_type.unwrap_or_default() {
        "application/pdf" => ".pdf",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        "application/msword" => ".doc",
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        _ => "",
    }
    .to_string()
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.processor.engine_name().to_string(),
        supported_formats: files::supported_extensions(),
        languages: state.processor.languages().codes().to_vec(),
        ocr_workers: state.processor.ocr_workers(),
        max_file_size_bytes: state.config.max_file_size,
    })
}
