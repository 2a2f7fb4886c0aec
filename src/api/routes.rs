use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers;
use crate::assess::{store::PUBLIC_ROUTE, Assessor};
use crate::error::panic_response;

pub struct AppState {
    pub assessor: Assessor,
    pub upload_dir: PathBuf,
    pub public_dir: PathBuf,
    pub max_upload_bytes: usize,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route(
            "/upload-audio",
            post(handlers::upload_audio).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/health", get(handlers::health));

    let routes = Router::new()
        .route("/", get(handlers::index))
        .nest("/api", api_routes);

    with_layers(routes, state)
}

/// Static audio, CORS, request tracing and panic recovery around `routes`.
fn with_layers(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    routes
        .nest_service(PUBLIC_ROUTE, ServeDir::new(&state.public_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}
