pub mod debug;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::config::MAX_UPLOAD_BYTES;
use crate::critique::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/debug/config", get(debug::debug_config_handler))
        .route("/upload", post(handlers::handle_upload))
        .route("/analyze", post(handlers::handle_analyze))
        // Slack over the file limit covers multipart framing; the handler
        // enforces the exact per-file limit.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
        .with_state(state)
}
