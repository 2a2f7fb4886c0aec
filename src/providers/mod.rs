//! Upstream provider contracts.
//!
//! Each provider reply is decoded exactly once into a [`ProviderReply`], so the
//! pipeline never pokes at raw JSON.

pub mod elevenlabs;
pub mod openai;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Stage};

pub use elevenlabs::ElevenLabsClient;
pub use openai::OpenAiClient;

/// Audio handed to the transcription provider.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, AppError>;
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, transcript: &str) -> Result<String, AppError>;
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Returns encoded audio (mp3) for `text`.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AppError>;
}

/// Non-success answer from a provider, kept verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply<T> {
    Success(T),
    Failure(Diagnostic),
}

impl<T> ProviderReply<T> {
    pub fn into_result(self, stage: Stage) -> Result<T, AppError> {
        match self {
            ProviderReply::Success(payload) => Ok(payload),
            ProviderReply::Failure(diagnostic) => {
                tracing::error!(
                    "{} provider returned {}: {}",
                    stage,
                    diagnostic.status,
                    diagnostic.body
                );
                Err(AppError::upstream(stage, diagnostic.body))
            }
        }
    }
}

async fn failure(response: reqwest::Response) -> Diagnostic {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Diagnostic { status, body }
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<ProviderReply<T>, reqwest::Error> {
    if !response.status().is_success() {
        return Ok(ProviderReply::Failure(failure(response).await));
    }
    Ok(ProviderReply::Success(response.json::<T>().await?))
}

pub(crate) async fn decode_bytes(
    response: reqwest::Response,
) -> Result<ProviderReply<Vec<u8>>, reqwest::Error> {
    if !response.status().is_success() {
        return Ok(ProviderReply::Failure(failure(response).await));
    }
    Ok(ProviderReply::Success(response.bytes().await?.to_vec()))
}

/// Transport-level failure (connect, TLS, body decode) on `stage`.
pub(crate) fn transport_error(stage: Stage) -> impl FnOnce(reqwest::Error) -> AppError {
    move |e| AppError::upstream(stage, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_reply_unwraps() {
        let reply = ProviderReply::Success("text".to_string());
        assert_eq!(reply.into_result(Stage::Transcription).unwrap(), "text");
    }

    #[test]
    fn failure_reply_keeps_raw_body() {
        let reply: ProviderReply<String> = ProviderReply::Failure(Diagnostic {
            status: 429,
            body: r#"{"error":{"message":"rate limited"}}"#.to_string(),
        });

        match reply.into_result(Stage::Evaluation) {
            Err(AppError::Upstream { stage, details }) => {
                assert_eq!(stage, Stage::Evaluation);
                assert!(details.contains("rate limited"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
