use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::AppError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_ELEVEN_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Process-wide settings, read once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub public_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub openai: OpenAiConfig,
    pub synthesis: Option<SynthesisConfig>,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Checked lazily: a missing key only fails the request that needs it.
    pub api_key: Option<String>,
    pub base_url: String,
    pub transcription_model: String,
    pub evaluation_model: String,
    pub system_instruction: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    pub api_key: String,
    pub voice_id: String,
    pub base_url: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::Configuration(format!("PORT must be a number, got '{}'", raw)))?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                AppError::Configuration(format!("MAX_UPLOAD_BYTES must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let openai = OpenAiConfig {
            api_key: get("OPENAI_API_KEY"),
            base_url: trim_base_url(get_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)),
            transcription_model: get_or("TRANSCRIPTION_MODEL", "whisper-1"),
            evaluation_model: get_or("EVALUATION_MODEL", "gpt-4o-mini"),
            system_instruction:
                "You are an experienced IELTS examiner. Be concise and numeric when scoring."
                    .to_string(),
            max_tokens: 400,
            temperature: 0.2,
        };

        let synthesis = match (get("ELEVEN_API_KEY"), get("ELEVEN_VOICE_ID")) {
            (Some(api_key), Some(voice_id)) => Some(SynthesisConfig {
                api_key,
                voice_id,
                base_url: trim_base_url(get_or("ELEVEN_BASE_URL", DEFAULT_ELEVEN_BASE_URL)),
                stability: 0.4,
                similarity_boost: 0.2,
            }),
            _ => None,
        };

        Ok(Self {
            host: get_or("HOST", "0.0.0.0"),
            port,
            upload_dir: get_or("UPLOAD_DIR", "uploads").into(),
            public_dir: get_or("PUBLIC_DIR", "public").into(),
            max_upload_bytes,
            openai,
            synthesis,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid address {}:{}", self.host, self.port)))
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.openai.api_key.is_none());
        assert_eq!(config.openai.transcription_model, "whisper-1");
        assert_eq!(config.openai.evaluation_model, "gpt-4o-mini");
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert!(config.synthesis.is_none());
    }

    #[test]
    fn synthesis_requires_key_and_voice() {
        let only_key = config_from(&[("ELEVEN_API_KEY", "k")]).unwrap();
        assert!(only_key.synthesis.is_none());

        let only_voice = config_from(&[("ELEVEN_VOICE_ID", "v")]).unwrap();
        assert!(only_voice.synthesis.is_none());

        let both = config_from(&[("ELEVEN_API_KEY", "k"), ("ELEVEN_VOICE_ID", "v")]).unwrap();
        let synthesis = both.synthesis.unwrap();
        assert_eq!(synthesis.voice_id, "v");
        assert_eq!(synthesis.stability, 0.4);
        assert_eq!(synthesis.similarity_boost, 0.2);
    }

    #[test]
    fn blank_values_are_unset() {
        let config = config_from(&[("OPENAI_API_KEY", "  "), ("ELEVEN_API_KEY", "")]).unwrap();
        assert!(config.openai.api_key.is_none());
        assert!(config.synthesis.is_none());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn base_urls_lose_trailing_slash() {
        let config = config_from(&[("OPENAI_BASE_URL", "http://localhost:9000/v1/")]).unwrap();
        assert_eq!(config.openai.base_url, "http://localhost:9000/v1");
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = config_from(&[("HOST", "127.0.0.1"), ("PORT", "3001")]).unwrap();
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3001");
    }
}
