/// Critique client — the single point of entry for all Groq API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Groq API directly.
/// All model interactions MUST go through this module.
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod prompts;

const MAX_TOKENS: u32 = 2048;
/// Attempts per candidate model before moving on to the next one.
const MAX_RETRIES_PER_MODEL: u32 = 3;

/// Error substrings that mean a model is unavailable to this project.
/// Seeing one skips the remaining retries and advances to the next candidate.
const MODEL_BLOCK_MARKERS: &[&str] = &[
    "model_permission_blocked_project",
    "blocked at the project level",
    "model_not_found",
];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned empty content")]
    EmptyContent,

    #[error("all candidate models failed [{models}]: {last_error}")]
    Exhausted { models: String, last_error: String },
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GroqError {
    error: GroqErrorBody,
}

#[derive(Debug, Deserialize)]
struct GroqErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Chat-completion client with an ordered model-fallback list.
/// Each candidate gets a bounded retry sequence; exhausting the whole list is
/// a single terminal failure.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    models: Vec<String>,
    temperature: f64,
    top_p: f64,
}

impl LlmClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.groq_base_url.trim_end_matches('/').to_string(),
            api_key: config.groq_api_key.clone(),
            models: config.candidate_models(),
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }

    /// The primary model name, for diagnostics endpoints.
    pub fn primary_model(&self) -> &str {
        &self.models[0]
    }

    /// Sends `prompt` to each candidate model in order until one succeeds.
    ///
    /// Per model: up to 3 attempts with exponential backoff (1 s, 2 s). A
    /// model-block rejection skips straight to the next candidate. When every
    /// candidate has failed, exactly one `Exhausted` error is returned.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for model in &self.models {
            for attempt in 0..MAX_RETRIES_PER_MODEL {
                if attempt > 0 {
                    let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                    warn!(
                        "critique attempt {} on {} failed, retrying after {}ms...",
                        attempt,
                        model,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }

                match self.request_once(model, prompt).await {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        let blocked = is_model_block(&e);
                        warn!("critique request to {model} failed: {e}");
                        last_error = Some(e);
                        if blocked {
                            warn!("model {model} unavailable for this project, trying next candidate");
                            break;
                        }
                    }
                }
            }
        }

        Err(LlmError::Exhausted {
            models: self.models.join(", "),
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no candidate models configured".to_string()),
        })
    }

    async fn request_once(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Prefer the structured error message; fall back to the raw body.
            let message = serde_json::from_str::<GroqError>(&body)
                .map(|e| {
                    let GroqErrorBody { message, code } = e.error;
                    match code {
                        Some(code) => format!("{message} ({code})"),
                        None => message,
                    }
                })
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Api {
                status: status.as_u16(),
                message: format!("malformed completion body: {e}"),
            })?;

        if let Some(usage) = &chat.usage {
            debug!(
                "critique call succeeded on {model}: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyContent)?;

        Ok(text)
    }
}

/// Whether an error indicates the model itself is unavailable (as opposed to
/// a transient failure worth retrying on the same model).
fn is_model_block(error: &LlmError) -> bool {
    let LlmError::Api { message, .. } = error else {
        return false;
    };
    MODEL_BLOCK_MARKERS.iter().any(|m| message.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_block_detected_by_code() {
        let err = LlmError::Api {
            status: 404,
            message: "The model `x` does not exist (model_not_found)".to_string(),
        };
        assert!(is_model_block(&err));
    }

    #[test]
    fn test_model_block_detected_by_project_block() {
        let err = LlmError::Api {
            status: 403,
            message: "model_permission_blocked_project".to_string(),
        };
        assert!(is_model_block(&err));
    }

    #[test]
    fn test_transient_api_error_is_not_a_block() {
        let err = LlmError::Api {
            status: 500,
            message: "internal error".to_string(),
        };
        assert!(!is_model_block(&err));
    }

    #[test]
    fn test_empty_content_is_not_a_block() {
        assert!(!is_model_block(&LlmError::EmptyContent));
    }

    #[test]
    fn test_chat_response_deserializes_content() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Rating: 8"}}],
            "usage": {"prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150}
        }"#;
        let chat: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            chat.choices[0].message.content.as_deref(),
            Some("Rating: 8")
        );
        assert_eq!(chat.usage.unwrap().completion_tokens, 50);
    }

    #[test]
    fn test_chat_response_tolerates_missing_usage() {
        let json = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let chat: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(chat.usage.is_none());
    }

    #[test]
    fn test_groq_error_body_parses_message_and_code() {
        let json = r#"{"error": {"message": "boom", "type": "invalid_request_error", "code": "model_not_found"}}"#;
        let err: GroqError = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.message, "boom");
        assert_eq!(err.error.code.as_deref(), Some("model_not_found"));
    }

    #[test]
    fn test_client_builds_candidate_list_from_config() {
        let mut config = Config::for_tests();
        config.model = "primary".to_string();
        config.fallback_models = vec!["secondary".to_string()];
        let client = LlmClient::new(&config);
        assert_eq!(client.models, vec!["primary", "secondary"]);
        assert_eq!(client.primary_model(), "primary");
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let mut config = Config::for_tests();
        config.groq_base_url = "http://127.0.0.1:9/v1/".to_string();
        let client = LlmClient::new(&config);
        assert_eq!(client.base_url, "http://127.0.0.1:9/v1");
    }
}
