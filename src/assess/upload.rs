use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::providers::AudioClip;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
    static ref EXTENSION: Regex = Regex::new(r"^[A-Za-z0-9]{1,8}$").unwrap();
}

const FALLBACK_EXTENSION: &str = "webm";

/// An uploaded clip staged on disk for the lifetime of one request.
///
/// The file is removed by [`StagedUpload::discard`] or, failing that, when the
/// value is dropped.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    file_name: String,
    len: u64,
    removed: bool,
}

impl StagedUpload {
    fn reserve(dir: &Path, original_name: Option<&str>, content_type: Option<&str>) -> Self {
        let file_name = client_file_name(original_name, content_type);
        let extension = Path::new(&file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
        let path = dir.join(format!("upload-{}.{}", Uuid::new_v4().simple(), extension));

        Self {
            path,
            file_name,
            len: 0,
            removed: false,
        }
    }

    /// Stream a multipart field into the upload directory.
    pub async fn from_field(dir: &Path, mut field: Field<'_>) -> Result<Self, AppError> {
        let original_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        tokio::fs::create_dir_all(dir).await?;
        let mut staged = Self::reserve(dir, original_name.as_deref(), content_type.as_deref());
        let mut file = File::create(&staged.path).await?;

        while let Some(chunk) = field.chunk().await? {
            file.write_all(&chunk).await?;
            staged.len += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(
            "Staged upload {} ({} bytes) at {}",
            staged.file_name,
            staged.len,
            staged.path.display()
        );
        Ok(staged)
    }

    #[cfg(test)]
    pub async fn from_bytes(dir: &Path, original_name: &str, bytes: &[u8]) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(dir).await?;
        let mut staged = Self::reserve(dir, Some(original_name), None);
        tokio::fs::write(&staged.path, bytes).await?;
        staged.len = bytes.len() as u64;
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Load the staged bytes for the transcription provider.
    pub async fn read(&self) -> Result<AudioClip, AppError> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(AudioClip {
            bytes,
            file_name: self.file_name.clone(),
        })
    }

    pub async fn discard(mut self) {
        self.removed = true;
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove upload {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove upload {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Name forwarded to the transcription provider, which infers the encoding
/// from the extension.
fn client_file_name(original_name: Option<&str>, content_type: Option<&str>) -> String {
    let base = original_name
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(|name| UNSAFE_CHARS.replace_all(name, "_").to_string())
        .filter(|name| !name.trim_matches(['.', '_']).is_empty());

    match base {
        Some(name) if has_extension(&name) => name,
        Some(name) => format!("{}.{}", name, extension_for(content_type)),
        None => format!("audio.{}", extension_for(content_type)),
    }
}

fn has_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|e| EXTENSION.is_match(&e.to_string_lossy()))
        .unwrap_or(false)
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());

    match essence.as_deref() {
        Some("audio/mpeg") | Some("audio/mp3") => "mp3",
        Some("audio/wav") | Some("audio/x-wav") | Some("audio/wave") => "wav",
        Some("audio/mp4") | Some("audio/m4a") | Some("audio/x-m4a") => "m4a",
        Some("audio/ogg") => "ogg",
        Some("audio/flac") => "flac",
        _ => FALLBACK_EXTENSION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_safe_original_name() {
        assert_eq!(client_file_name(Some("answer.mp3"), None), "answer.mp3");
    }

    #[test]
    fn strips_directories_and_odd_characters() {
        assert_eq!(
            client_file_name(Some("../../etc/my answer!.wav"), None),
            "my_answer_.wav"
        );
        assert_eq!(client_file_name(Some(r"C:\clips\take1.m4a"), None), "take1.m4a");
    }

    #[test]
    fn derives_extension_from_content_type() {
        assert_eq!(client_file_name(None, Some("audio/mpeg")), "audio.mp3");
        assert_eq!(
            client_file_name(Some("blob"), Some("audio/ogg; codecs=opus")),
            "blob.ogg"
        );
        assert_eq!(client_file_name(None, None), "audio.webm");
    }

    #[tokio::test]
    async fn staged_file_is_removed_on_discard() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedUpload::from_bytes(dir.path(), "a.wav", b"RIFF").await.unwrap();
        let path = staged.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(staged.len(), 4);
        assert_eq!(path.extension().unwrap(), "wav");

        staged.discard().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn staged_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedUpload::from_bytes(dir.path(), "a.wav", b"RIFF").await.unwrap();
        let path = staged.path().to_path_buf();

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn read_returns_bytes_and_client_name() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedUpload::from_bytes(dir.path(), "take.mp3", b"ID3").await.unwrap();

        let clip = staged.read().await.unwrap();
        assert_eq!(clip.bytes, b"ID3");
        assert_eq!(clip.file_name, "take.mp3");
    }

    #[tokio::test]
    async fn names_are_unique_per_upload() {
        let dir = tempfile::tempdir().unwrap();
        let a = StagedUpload::from_bytes(dir.path(), "a.wav", b"1").await.unwrap();
        let b = StagedUpload::from_bytes(dir.path(), "a.wav", b"2").await.unwrap();
        assert_ne!(a.path(), b.path());
    }
}
