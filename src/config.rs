//! Pipeline configuration
//! Plain key-value settings with documented defaults and env overrides

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OpenAI API key not found - set the OPENAI_API_KEY environment variable")]
    MissingApiKey,
}

/// Tunables for one summarization pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model name used by every layer unless overridden below.
    pub model: String,
    /// Optional per-layer model overrides.
    pub extraction_model: Option<String>,
    pub consolidation_model: Option<String>,
    pub generation_model: Option<String>,
    /// API key; required unless a client is injected directly.
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible completion endpoint.
    pub base_url: String,
    /// Retry ceiling for transient model-call errors, per call site.
    pub max_retries: u32,
    /// Maximum simultaneous in-flight extraction requests.
    pub extraction_max_parallel: usize,
    /// Temperature for factual extraction (0 = deterministic).
    pub extraction_temperature: f32,
    /// Temperature for theme consolidation.
    pub consolidation_temperature: f32,
    /// Temperature for section generation.
    pub generation_temperature: f32,
    /// Maximum words per chunk.
    pub chunker_max_words: usize,
    /// Minimum words for a marker-delimited candidate to become a chunk.
    pub chunker_min_words: usize,
    /// Maximum regeneration attempts per failing section.
    pub max_regeneration_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            extraction_model: None,
            consolidation_model: None,
            generation_model: None,
            api_key: None,
            base_url: crate::llm::OpenAiClient::DEFAULT_BASE_URL.to_string(),
            max_retries: 3,
            extraction_max_parallel: 3,
            extraction_temperature: 0.0,
            consolidation_temperature: 0.1,
            generation_temperature: 0.2,
            chunker_max_words: 3000,
            chunker_min_words: 100,
            max_regeneration_attempts: 2,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by environment variables where present.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("LEXBRIEF_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        if let Ok(url) = std::env::var("LEXBRIEF_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        if let Some(n) = env_parse("LEXBRIEF_MAX_PARALLEL") {
            config.extraction_max_parallel = n;
        }
        if let Some(n) = env_parse("LEXBRIEF_MAX_WORDS") {
            config.chunker_max_words = n;
        }
        if let Some(n) = env_parse("LEXBRIEF_MAX_REGENERATIONS") {
            config.max_regeneration_attempts = n;
        }

        config
    }

    /// API key or the fatal configuration error, checked at construction.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.extraction_max_parallel, 3);
        assert_eq!(config.chunker_max_words, 3000);
        assert_eq!(config.max_regeneration_attempts, 2);
        assert!((config.extraction_temperature - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_per_layer_models_default_to_unset() {
        let config = PipelineConfig::default();
        assert!(config.extraction_model.is_none());
        assert!(config.consolidation_model.is_none());
        assert!(config.generation_model.is_none());
    }

    #[test]
    fn test_require_api_key_missing() {
        let config = PipelineConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_require_api_key_present() {
        let config = PipelineConfig {
            api_key: Some("sk-test".to_string()),
            ..PipelineConfig::default()
        };
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }
}
