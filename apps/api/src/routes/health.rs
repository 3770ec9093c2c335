use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::config::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// GET /health
/// Liveness check with enough configuration detail to diagnose a bad deploy.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "has_groq_key": !state.config.groq_api_key.is_empty(),
        "model": state.config.model,
        "model_fallbacks": state.config.fallback_models,
        "max_upload_mb": MAX_UPLOAD_BYTES / (1024 * 1024),
    }))
}
