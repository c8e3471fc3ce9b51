use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("OCR extraction failed: {0}")]
    Ocr(String),

    #[error("Failed to rasterize PDF: {0}")]
    Rasterization(String),

    #[error("Failed to parse document: {0}")]
    DocumentParse(String),

    #[error("Failed to initialize: {0}")]
    Initialization(String),

    #[error("File too large (max: {max} bytes)")]
    FileTooLarge { max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProcessingError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProcessingError::MissingFile | ProcessingError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ProcessingError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            // Everything that reached the processor is a processing failure
            ProcessingError::NotFound(_)
            | ProcessingError::UnsupportedFormat(_)
            | ProcessingError::Ocr(_)
            | ProcessingError::Rasterization(_)
            | ProcessingError::DocumentParse(_)
            | ProcessingError::Initialization(_)
            | ProcessingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for ProcessingError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            detail: self.to_string(),
        });

        (self.status(), body).into_response()
    }
}
