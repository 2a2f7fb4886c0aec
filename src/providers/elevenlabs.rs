use async_trait::async_trait;
use serde::Serialize;

use super::{decode_bytes, transport_error, Synthesizer};
use crate::config::SynthesisConfig;
use crate::error::{AppError, Stage};

/// Text-to-speech client for a single configured voice.
pub struct ElevenLabsClient {
    http: reqwest::Client,
    config: SynthesisConfig,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsClient {
    pub fn new(http: reqwest::Client, config: SynthesisConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AppError> {
        let url = format!(
            "{}/text-to-speech/{}",
            self.config.base_url, self.config.voice_id
        );

        let request = SpeechRequest {
            text,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let response = self
            .http
            .post(url)
            .header("xi-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error(Stage::Synthesis))?;

        decode_bytes(response)
            .await
            .map_err(transport_error(Stage::Synthesis))?
            .into_result(Stage::Synthesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ElevenLabsClient {
        ElevenLabsClient::new(
            reqwest::Client::new(),
            SynthesisConfig {
                api_key: "eleven-key".to_string(),
                voice_id: "voice-123".to_string(),
                base_url: server.uri(),
                stability: 0.4,
                similarity_boost: 0.2,
            },
        )
    }

    #[tokio::test]
    async fn returns_audio_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/text-to-speech/voice-123"))
            .and(header("xi-api-key", "eleven-key"))
            .and(body_partial_json(json!({ "text": "Band 7 overall" })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90]))
            .expect(1)
            .mount(&server)
            .await;

        let audio = client(&server).synthesize("Band 7 overall").await.unwrap();
        assert_eq!(audio, vec![0xFF, 0xFB, 0x90]);
    }

    #[tokio::test]
    async fn sends_voice_settings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1]))
            .mount(&server)
            .await;

        client(&server).synthesize("hi").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body["voice_settings"]["stability"].is_number());
        assert!(body["voice_settings"]["similarity_boost"].is_number());
    }

    #[tokio::test]
    async fn provider_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = client(&server).synthesize("hi").await.unwrap_err();
        match err {
            AppError::Upstream { stage, details } => {
                assert_eq!(stage, Stage::Synthesis);
                assert_eq!(details, "invalid api key");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
