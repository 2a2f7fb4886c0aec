use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use std::sync::Arc;
use tracing::info;

use super::{HealthResponse, AUDIO_FIELD, LIVENESS_MESSAGE};
use crate::api::routes::AppState;
use crate::assess::{AssessmentResult, StagedUpload};
use crate::error::AppError;

pub async fn index() -> &'static str {
    LIVENESS_MESSAGE
}

pub async fn upload_audio(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AssessmentResult>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    // Only the first audio field counts; anything else is skipped unread
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if upload.is_none() && field.name() == Some(AUDIO_FIELD) {
            upload = Some(StagedUpload::from_field(&state.upload_dir, field).await?);
        }
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("No audio file uploaded".into()))?;
    info!("Received audio upload ({} bytes)", upload.len());

    let result = state.assessor.assess(upload).await?;
    Ok(Json(result))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        synthesis: state.assessor.synthesis_enabled(),
    })
}
