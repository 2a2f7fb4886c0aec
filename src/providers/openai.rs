use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{decode_json, transport_error, AudioClip, Evaluator, Transcriber};
use crate::assess::prompt;
use crate::config::OpenAiConfig;
use crate::error::{AppError, Stage};

/// Substituted when the completion carries no usable content.
pub const NO_FEEDBACK: &str = "No feedback returned";

/// Client for the transcription and chat completion endpoints.
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Debug, Deserialize)]
struct TranscriptionReply {
    /// Missing text is an empty transcript, not an error.
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletion {
    fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
    }
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("OPENAI_API_KEY not set".into()))
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url, endpoint)
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, AppError> {
        let api_key = self.api_key()?;

        debug!(
            "Transcribing {} ({} bytes) with {}",
            clip.file_name,
            clip.bytes.len(),
            self.config.transcription_model
        );

        let form = Form::new()
            .part("file", Part::bytes(clip.bytes).file_name(clip.file_name))
            .text("model", self.config.transcription_model.clone());

        let response = self
            .http
            .post(self.url("audio/transcriptions"))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error(Stage::Transcription))?;

        let reply: TranscriptionReply = decode_json(response)
            .await
            .map_err(transport_error(Stage::Transcription))?
            .into_result(Stage::Transcription)?;

        Ok(reply.text)
    }
}

#[async_trait]
impl Evaluator for OpenAiClient {
    async fn evaluate(&self, transcript: &str) -> Result<String, AppError> {
        let api_key = self.api_key()?;
        let user_prompt = prompt::evaluation_prompt(transcript);

        let request = ChatRequest {
            model: &self.config.evaluation_model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.config.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .http
            .post(self.url("chat/completions"))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error(Stage::Evaluation))?;

        let completion: ChatCompletion = decode_json(response)
            .await
            .map_err(transport_error(Stage::Evaluation))?
            .into_result(Stage::Evaluation)?;

        Ok(completion
            .first_content()
            .unwrap_or_else(|| NO_FEEDBACK.to_string()))
    }
}
