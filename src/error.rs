use std::fmt;

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Pipeline stage that talks to an upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcription,
    Evaluation,
    Synthesis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Transcription => "transcription",
            Stage::Evaluation => "evaluation",
            Stage::Synthesis => "synthesis",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{stage} failed: {details}")]
    Upstream { stage: Stage, details: String },

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    pub fn upstream(stage: Stage, details: impl Into<String>) -> Self {
        AppError::Upstream {
            stage,
            details: details.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Upstream { stage, details } => {
                let message = match stage {
                    Stage::Transcription => "Transcription failed".to_string(),
                    Stage::Evaluation => "Evaluation failed".to_string(),
                    Stage::Synthesis => "Synthesis failed".to_string(),
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_ERROR",
                    message,
                    Some(details.clone()),
                )
            }
            // 413 when the body limit was hit, 400 for malformed forms
            AppError::Multipart(e) => (
                e.status(),
                "MULTIPART_ERROR",
                e.body_text(),
                None,
            ),
            AppError::IoError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                e.to_string(),
                None,
            ),
        };

        tracing::error!("Request failed: {} - {}", code, self);

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
                details,
            }),
        )
            .into_response()
    }
}

/// Fallback body for handler panics caught by `CatchPanicLayer`.
pub fn panic_response(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Server error".to_string(),
            code: "INTERNAL_ERROR".to_string(),
            details: None,
        }),
    )
        .into_response()
}
