//! Analysis endpoint configuration.

use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

const fn default_temperature() -> f64 {
    0.2
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_max_attempts() -> u32 {
    3
}

/// Keep prompts safely under the 128k context of the default model.
const fn default_max_prompt_tokens() -> usize {
    120_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API key for the analysis endpoint. Falls back to the `OPENAI_API_KEY`
    /// environment variable when unset (see [`ApiConfig::resolved_key`]).
    #[serde(default)]
    pub key: String,

    /// Base URL of the OpenAI-compatible chat-completion endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for the rubric evaluation.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Per-request timeout, distinct from the retry ceiling.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempt ceiling for one conversation (including the initial attempt).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Prompt budget; transcripts are truncated oldest-first to fit it.
    #[serde(default = "default_max_prompt_tokens")]
    pub max_prompt_tokens: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            max_prompt_tokens: default_max_prompt_tokens(),
        }
    }
}

impl ApiConfig {
    /// The configured key, or the `OPENAI_API_KEY` environment variable.
    #[must_use]
    pub fn resolved_key(&self) -> Option<String> {
        if !self.key.is_empty() {
            return Some(self.key.clone());
        }
        std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_openai() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_attempts, 3);
        assert!(config.max_prompt_tokens <= 128_000);
    }
}
