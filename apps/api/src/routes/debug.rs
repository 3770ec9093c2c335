use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /debug/config
/// Non-secret configuration values for troubleshooting key loading.
/// Enabled only in development-mode environments; 403 everywhere else.
pub async fn debug_config_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    if !state.config.is_dev() {
        return Err(AppError::Forbidden(
            "Debug endpoint is disabled in non-dev environments.".to_string(),
        ));
    }

    Ok(Json(json!({
        "groq_key_present": !state.config.groq_api_key.is_empty(),
        "groq_key_masked": state.config.masked_api_key(),
        "model": state.config.model,
        "model_fallbacks": state.config.fallback_models,
        "temperature": state.config.temperature,
        "top_p": state.config.top_p,
        "cors_origins": state.config.cors_origins,
        "app_env": state.config.app_env,
        "accepted_aliases": crate::config::API_KEY_ALIASES,
    })))
}
