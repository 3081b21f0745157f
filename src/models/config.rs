//! Configuration model loaded from external sources.
//!
//! One immutable struct is the single source of truth for the database path,
//! staging directories and every tunable; components receive it (or a slice
//! of it) at construction time instead of reading scattered globals.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
    /// Plain-text résumé scored against each posting. Similarity is skipped
    /// when unset or unreadable.
    #[serde(default)]
    pub resume_path: Option<PathBuf>,
    /// Search matrix: every position is searched in every location.
    #[serde(default)]
    pub positions: Vec<String>,
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Tunables for the rate-limited search client.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_url: String,
    pub api_host: String,
    pub api_key: String,
    pub country: String,
    pub date_posted: String,
    /// Pages fetched per search term.
    pub pages: u32,
    pub pages_per_call: u32,
    /// Concurrent page fetches in flight for one term.
    pub page_concurrency: usize,
    /// Steady-state throttle applied before every request, independent of
    /// retry state.
    pub pre_request_delay_ms: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: "https://jsearch.p.rapidapi.com/search".to_string(),
            api_host: "jsearch.p.rapidapi.com".to_string(),
            api_key: String::new(),
            country: "us".to_string(),
            date_posted: "today".to_string(),
            pages: 5,
            pages_per_call: 1,
            page_concurrency: 5,
            pre_request_delay_ms: 500,
            max_retries: 5,
            backoff_ms: 1_000,
            max_backoff_ms: 60_000,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Delay between the two provider calls of one similarity scoring,
    /// reducing the chance of tripping the provider's own rate limit.
    pub inter_call_delay_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            inter_call_delay_ms: 200,
        }
    }
}

impl AppConfig {
    /// Layers a YAML file (when present) under `JOBHUNTER__*` environment
    /// overrides. The API key falls back to `RAPID_API_KEY`.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let mut app: AppConfig = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("JOBHUNTER").separator("__"))
            .build()?
            .try_deserialize()?;

        if app.search.api_key.is_empty()
            && let Ok(key) = std::env::var("RAPID_API_KEY")
        {
            app.search.api_key = key;
        }

        Ok(app)
    }
}

fn default_database_url() -> String {
    "all_jobs.db".to_string()
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("temp/data/raw")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("temp/data/processed")
}

fn default_locations() -> Vec<String> {
    vec!["remote".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_config_defaults_apply_to_empty_input() {
        let config: SearchConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.pages, 5);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn partial_search_config_keeps_remaining_defaults() {
        let config: SearchConfig =
            serde_json::from_value(serde_json::json!({"max_retries": 2})).unwrap();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.backoff_ms, 1_000);
    }
}
