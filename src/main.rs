use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod assess;
mod config;
mod error;
mod providers;

use api::routes::{create_router, AppState};
use assess::Assessor;
use config::Config;

#[tokio::main]
async fn main() {
    // Optional .env next to the binary; real environment wins
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");
    let addr = config.socket_addr().expect("Invalid address");

    tracing::info!("Speaking Assessor v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Starting server on http://{}", addr);
    tracing::info!("Upload directory: {}", config.upload_dir.display());
    tracing::info!("Public directory: {}", config.public_dir.display());

    if config.openai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; assessments will fail until it is provided");
    }
    match &config.synthesis {
        Some(synthesis) => tracing::info!("Speech synthesis enabled (voice {})", synthesis.voice_id),
        None => tracing::info!("Speech synthesis disabled (ELEVEN_API_KEY / ELEVEN_VOICE_ID not set)"),
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");
    tokio::fs::create_dir_all(&config.public_dir)
        .await
        .expect("Failed to create public directory");

    // One connection pool shared by every provider
    let http = reqwest::Client::builder()
        .user_agent(concat!("speaking-assessor/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to build HTTP client");

    let state = Arc::new(AppState {
        assessor: Assessor::from_config(&config, http),
        upload_dir: config.upload_dir.clone(),
        public_dir: config.public_dir.clone(),
        max_upload_bytes: config.max_upload_bytes,
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
