//! HTTP client for Ollama and OpenAI-compatible completion APIs.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{LlmConfig, LlmProvider};
use crate::services::ServiceError;

/// Which configured model a request should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Standard,
    Fast,
}

/// LLM client for document processing.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
    error: Option<ChatError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Standard => &self.config.model,
            ModelTier::Fast => self.config.fast_model(),
        }
    }

    /// Check if the LLM service is reachable.
    pub async fn is_available(&self) -> bool {
        let url = match self.config.provider {
            LlmProvider::Ollama => format!("{}/api/tags", self.config.endpoint),
            LlmProvider::OpenAI => format!("{}/v1/models", self.config.endpoint),
        };
        let mut request = self.client.get(&url);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        match request.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Truncate content to the configured maximum number of characters.
    pub fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        truncate_chars(text, self.config.max_content_chars)
    }

    /// Send a prompt and return the raw completion text.
    pub async fn complete(&self, prompt: &str, tier: ModelTier) -> Result<String, ServiceError> {
        let model = self.model(tier);
        debug!("Sending {} char prompt to {}", prompt.len(), model);
        let text = match self.config.provider {
            LlmProvider::Ollama => self.call_ollama(model, prompt).await?,
            LlmProvider::OpenAI => self.call_openai(model, prompt).await?,
        };
        if text.trim().is_empty() {
            return Err(ServiceError::Parse("empty completion".to_string()));
        }
        Ok(text)
    }

    async fn call_ollama(&self, model: &str, prompt: &str) -> Result<String, ServiceError> {
        let request = OllamaRequest {
            model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let resp = check_status(resp).await?;

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;
        Ok(ollama_resp.response)
    }

    async fn call_openai(&self, model: &str, prompt: &str) -> Result<String, ServiceError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ServiceError::Unsupported("no API key configured for OpenAI-compatible provider".into())
        })?;

        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let resp = check_status(resp).await?;

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;
        if let Some(error) = chat.error {
            return Err(ServiceError::Other(format!("API error: {}", error.message)));
        }
        Ok(chat
            .choices
            .and_then(|c| c.into_iter().next())
            .map(|c| c.message.content)
            .unwrap_or_default())
    }

    fn transport_error(&self, err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::Timeout(self.config.request_timeout())
        } else {
            ServiceError::Connection(err.to_string())
        }
    }
}

/// Turn a non-success response into a classified error.
async fn check_status(resp: Response) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let retry_after = parse_retry_after(
        resp.headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok()),
    );
    let body = resp.text().await.unwrap_or_default();
    Err(ServiceError::from_status(
        status.as_u16(),
        body.trim().to_string(),
        retry_after,
    ))
}

/// First `max_chars` characters of `text` (UTF-8 safe).
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Parse a `Retry-After` header given in seconds.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    header_value?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
