//! LLM client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// LLM provider type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Ollama API (local, default)
    #[default]
    Ollama,
    /// OpenAI-compatible API (OpenAI, Groq, Together.ai, etc.)
    OpenAI,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

/// Configuration for the LLM-backed analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (ollama or openai)
    #[serde(default)]
    pub provider: LlmProvider,
    /// API endpoint (provider-specific defaults apply)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key for OpenAI-compatible providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model for thorough analysis (comprehensive summaries, risks, comparisons)
    #[serde(default = "default_model")]
    pub model: String,
    /// Cheaper model for brief summaries, bullet points and basic entity
    /// extraction. Falls back to `model`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast_model: Option<String>,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum characters of document content to send per request
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_content_chars() -> usize {
    30000
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            fast_model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_content_chars: default_max_content_chars(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_PROVIDER`: "ollama" (default), "openai", "groq", or "together"
    /// - `LLM_ENDPOINT`: API endpoint (defaults based on provider)
    /// - `LLM_API_KEY`: API key for OpenAI-compatible providers
    /// - `LLM_MODEL`, `LLM_FAST_MODEL`: model names
    /// - `LLM_MAX_TOKENS`: Maximum tokens in response
    /// - `LLM_TEMPERATURE`: Generation temperature (0.0-1.0)
    /// - `LLM_MAX_CONTENT_CHARS`: Max document chars to send
    ///
    /// An explicit `LLM_PROVIDER` wins over auto-detection from
    /// `GROQ_API_KEY` / `OPENAI_API_KEY`.
    pub fn with_env_overrides(mut self) -> Self {
        let explicit_provider = std::env::var("LLM_PROVIDER").ok();
        if let Some(provider) = explicit_provider.as_deref().and_then(LlmProvider::from_str) {
            self.provider = provider;
        }

        let explicit_endpoint = std::env::var("LLM_ENDPOINT").ok();
        if let Some(ref endpoint) = explicit_endpoint {
            self.endpoint = endpoint.clone();
        }

        if let Ok(val) = std::env::var("LLM_API_KEY") {
            self.api_key = Some(val);
        }

        if let Some(ref provider_str) = explicit_provider {
            let provider_lower = provider_str.to_lowercase();
            if explicit_endpoint.is_none() {
                if let Some(endpoint) = provider_endpoint(&provider_lower) {
                    self.endpoint = endpoint.to_string();
                }
            }
            if self.api_key.is_none() {
                self.api_key = match provider_lower.as_str() {
                    "groq" => std::env::var("GROQ_API_KEY").ok(),
                    "openai" => std::env::var("OPENAI_API_KEY").ok(),
                    _ => None,
                };
            }
        } else if self.api_key.is_none() {
            let detected = [("groq", "GROQ_API_KEY"), ("openai", "OPENAI_API_KEY")]
                .into_iter()
                .find_map(|(name, var)| std::env::var(var).ok().map(|key| (name, key)));
            if let Some((name, key)) = detected {
                self.api_key = Some(key);
                self.provider = LlmProvider::OpenAI;
                if explicit_endpoint.is_none() {
                    if let Some(endpoint) = provider_endpoint(name) {
                        self.endpoint = endpoint.to_string();
                    }
                }
            }
        }

        if let Ok(val) = std::env::var("LLM_MODEL") {
            self.model = val;
        }
        if let Ok(val) = std::env::var("LLM_FAST_MODEL") {
            self.fast_model = Some(val);
        }
        if let Some(n) = env_parse("LLM_MAX_TOKENS") {
            self.max_tokens = n;
        }
        if let Some(t) = env_parse("LLM_TEMPERATURE") {
            self.temperature = t;
        }
        if let Some(n) = env_parse("LLM_MAX_CONTENT_CHARS") {
            self.max_content_chars = n;
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Model to use for the cheaper request kinds.
    pub fn fast_model(&self) -> &str {
        self.fast_model.as_deref().unwrap_or(&self.model)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn provider_endpoint(provider: &str) -> Option<&'static str> {
    match provider {
        "groq" => Some("https://api.groq.com/openai"),
        "openai" => Some("https://api.openai.com"),
        "together" => Some("https://api.together.xyz"),
        _ => None,
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!(LlmProvider::from_str("Groq"), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::from_str("ollama"), Some(LlmProvider::Ollama));
        assert_eq!(LlmProvider::from_str("gemini"), None);
    }

    #[test]
    fn test_fast_model_falls_back() {
        let config = LlmConfig::default().with_model("big");
        assert_eq!(config.fast_model(), "big");

        let config = LlmConfig {
            fast_model: Some("small".into()),
            ..config
        };
        assert_eq!(config.fast_model(), "small");
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: LlmConfig = toml::from_str(
            r#"
            provider = "openai"
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, 2048);
    }
}
