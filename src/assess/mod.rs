//! The assessment pipeline: transcribe, evaluate, then optionally voice the
//! feedback.
//!
//! Transcription and evaluation are required; any failure there aborts the
//! request. Synthesis is best effort and only ever costs the caller the audio URL.

pub mod prompt;
pub mod store;
pub mod upload;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::providers::{ElevenLabsClient, Evaluator, OpenAiClient, Synthesizer, Transcriber};

pub use store::AudioStore;
pub use upload::StagedUpload;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub transcript: String,
    pub feedback: String,
    /// `None` when synthesis is not configured or did not succeed.
    pub audio_url: Option<String>,
}

pub struct Assessor {
    transcriber: Arc<dyn Transcriber>,
    evaluator: Arc<dyn Evaluator>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    store: AudioStore,
}

impl Assessor {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        evaluator: Arc<dyn Evaluator>,
        synthesizer: Option<Arc<dyn Synthesizer>>,
        store: AudioStore,
    ) -> Self {
        Self {
            transcriber,
            evaluator,
            synthesizer,
            store,
        }
    }

    /// Wire the real providers from configuration, sharing one HTTP client.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        let openai = Arc::new(OpenAiClient::new(http.clone(), config.openai.clone()));
        let synthesizer = config.synthesis.clone().map(|synthesis| {
            Arc::new(ElevenLabsClient::new(http, synthesis)) as Arc<dyn Synthesizer>
        });

        Self::new(
            openai.clone(),
            openai,
            synthesizer,
            AudioStore::new(config.public_dir.clone()),
        )
    }

    pub fn synthesis_enabled(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub async fn assess(&self, upload: StagedUpload) -> Result<AssessmentResult, AppError> {
        let transcript = self.transcribe(upload).await?;
        info!("Transcribed {} bytes of text", transcript.len());

        let feedback = self.evaluator.evaluate(&transcript).await?;
        info!("Evaluation returned {} bytes of text", feedback.len());

        let audio_url = self.synthesize(&feedback).await;

        Ok(AssessmentResult {
            transcript,
            feedback,
            audio_url,
        })
    }

    /// Consumes the upload; the staged file is gone once this returns.
    async fn transcribe(&self, upload: StagedUpload) -> Result<String, AppError> {
        if upload.is_empty() {
            upload.discard().await;
            return Err(AppError::BadRequest("No audio file uploaded".into()));
        }

        debug!("Transcribing staged upload {}", upload.path().display());
        let outcome = match upload.read().await {
            Ok(clip) => self.transcriber.transcribe(clip).await,
            Err(e) => Err(e),
        };

        upload.discard().await;
        outcome
    }

    async fn synthesize(&self, feedback: &str) -> Option<String> {
        let Some(synthesizer) = self.synthesizer.as_ref() else {
            debug!("Synthesis not configured, skipping");
            return None;
        };

        let audio = match synthesizer.synthesize(feedback).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Synthesis skipped: {}", e);
                return None;
            }
        };

        match self.store.save(&audio).await {
            Ok(url) => {
                info!("Feedback audio saved to {}", url);
                Some(url)
            }
            Err(e) => {
                warn!("Failed to store feedback audio: {}", e);
                None
            }
        }
    }
}
