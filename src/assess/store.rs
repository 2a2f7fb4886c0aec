use std::path::PathBuf;

use uuid::Uuid;

use crate::error::AppError;

/// URL prefix the public directory is served under.
pub const PUBLIC_ROUTE: &str = "/public";

/// Writes synthesized feedback audio where the static file service can reach it.
///
/// Files are kept after the request; reclaiming them is left to the host.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Persist `audio` and return the path a client can fetch it from.
    pub async fn save(&self, audio: &[u8]) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = feedback_file_name();
        tokio::fs::write(self.dir.join(&file_name), audio).await?;

        Ok(format!("{}/{}", PUBLIC_ROUTE, file_name))
    }
}

/// Millisecond timestamp plus a random suffix so concurrent requests never collide.
fn feedback_file_name() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("feedback-{}-{}.mp3", millis, &suffix[..8])
}
