use anyhow::{anyhow, Context, Result};
use tracing::warn;

/// Maximum accepted upload size (matches the 5 MB form limit enforced at the router).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Fallback models tried in order if the primary model is blocked at the
/// project level or otherwise unavailable.
const DEFAULT_FALLBACK_MODELS: &[&str] = &[
    "llama-3.1-70b-versatile",
    "llama-3.1-8b-instant",
    "mixtral-8x7b-32768",
];

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5000,http://127.0.0.1:5000";

/// Environment variable names accepted for the API key, checked in order.
/// The aliases cover commonly misnamed variables.
pub const API_KEY_ALIASES: &[&str] = &[
    "GROQ_API_KEY",
    "GROQ_KEY",
    "GROQ_APIKEY",
    "GROQ_SECRET",
    "GROQ",
];

/// Application configuration loaded from environment variables.
/// Startup fails if the API key is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub model: String,
    pub fallback_models: Vec<String>,
    pub temperature: f64,
    pub top_p: f64,
    pub cors_origins: Vec<String>,
    pub app_env: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; real environment wins

        let fallback_models = match std::env::var("GROQ_FALLBACK_MODELS") {
            Ok(raw) if !parse_list(&raw).is_empty() => parse_list(&raw),
            _ => DEFAULT_FALLBACK_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        };

        let cors_origins = parse_list(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
        );

        Ok(Config {
            groq_api_key: resolve_api_key()?,
            groq_base_url: std::env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            fallback_models,
            temperature: float_env("GROQ_TEMPERATURE", 0.2),
            top_p: float_env("GROQ_TOP_P", 0.9),
            cors_origins,
            app_env: std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Candidate models in retry order: primary first, then fallbacks with the
    /// primary filtered out.
    pub fn candidate_models(&self) -> Vec<String> {
        let mut candidates = vec![self.model.clone()];
        candidates.extend(
            self.fallback_models
                .iter()
                .filter(|m| **m != self.model)
                .cloned(),
        );
        candidates
    }

    /// Masked key for diagnostics: first 6 and last 4 characters only.
    pub fn masked_api_key(&self) -> String {
        let key = &self.groq_api_key;
        match (key.get(..6), key.get(key.len().saturating_sub(4)..)) {
            (Some(head), Some(tail)) if key.len() >= 10 => format!("{head}...{tail}"),
            _ => "***".to_string(),
        }
    }

    /// Whether the debug endpoint is enabled for this environment.
    pub fn is_dev(&self) -> bool {
        matches!(
            self.app_env.to_lowercase().as_str(),
            "dev" | "local" | "debug"
        )
    }
}

fn resolve_api_key() -> Result<String> {
    for name in API_KEY_ALIASES {
        if let Ok(value) = std::env::var(name) {
            if !value.trim().is_empty() {
                if *name != "GROQ_API_KEY" {
                    warn!("using alias environment variable {name} for GROQ_API_KEY");
                }
                return Ok(value);
            }
        }
    }
    Err(anyhow!(
        "GROQ_API_KEY is not configured. Set it in the environment or a .env file \
         (also accepted: GROQ_KEY, GROQ_APIKEY, GROQ_SECRET, GROQ)."
    ))
}

fn float_env(name: &str, default: f64) -> f64 {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<f64>().unwrap_or_else(|_| {
            warn!("invalid {name} value {raw:?}, using default {default}");
            default
        }),
        _ => default,
    }
}

/// Splits a comma-separated env value into trimmed, non-empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
impl Config {
    /// Fixture config pointing at an unroutable endpoint so no test ever
    /// reaches the real API.
    pub fn for_tests() -> Self {
        Config {
            groq_api_key: "gsk_test_0123456789abcd".to_string(),
            groq_base_url: "http://127.0.0.1:9/v1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            fallback_models: vec![],
            temperature: 0.2,
            top_p: 0.9,
            cors_origins: parse_list(DEFAULT_CORS_ORIGINS),
            app_env: "dev".to_string(),
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_drops_empties() {
        assert_eq!(
            parse_list(" a, b ,,c , "),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_parse_list_empty_input() {
        assert!(parse_list("").is_empty());
        assert!(parse_list(" , ,").is_empty());
    }

    #[test]
    fn test_candidate_models_primary_first() {
        let mut config = Config::for_tests();
        config.model = "m-primary".to_string();
        config.fallback_models = vec!["m-a".to_string(), "m-b".to_string()];
        assert_eq!(config.candidate_models(), vec!["m-primary", "m-a", "m-b"]);
    }

    #[test]
    fn test_candidate_models_filters_duplicate_primary() {
        let mut config = Config::for_tests();
        config.model = "m-a".to_string();
        config.fallback_models = vec!["m-a".to_string(), "m-b".to_string()];
        assert_eq!(config.candidate_models(), vec!["m-a", "m-b"]);
    }

    #[test]
    fn test_masked_api_key_keeps_ends_only() {
        let config = Config::for_tests();
        let masked = config.masked_api_key();
        assert!(masked.starts_with("gsk_te"));
        assert!(masked.ends_with("abcd"));
        assert!(masked.contains("..."));
        assert!(!masked.contains("0123456789"));
    }

    #[test]
    fn test_masked_api_key_short_key_fully_hidden() {
        let mut config = Config::for_tests();
        config.groq_api_key = "short".to_string();
        assert_eq!(config.masked_api_key(), "***");
    }

    #[test]
    fn test_is_dev_variants() {
        let mut config = Config::for_tests();
        for env in ["dev", "local", "debug", "DEV", "Local"] {
            config.app_env = env.to_string();
            assert!(config.is_dev(), "expected {env} to count as dev");
        }
        config.app_env = "production".to_string();
        assert!(!config.is_dev());
    }
}
