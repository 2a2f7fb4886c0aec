pub mod handlers;
pub mod routes;

use serde::Serialize;

/// Multipart field carrying the recorded answer.
pub const AUDIO_FIELD: &str = "audio";

pub const LIVENESS_MESSAGE: &str = "IELTS AI Assessor running";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub synthesis: bool,
}
