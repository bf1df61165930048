//! LLM provider abstraction.
//!
//! The scheduler talks to a generative delegate through the [`LlmProvider`]
//! trait so the pipeline can run against any OpenAI-compatible chat endpoint
//! (Groq, OpenRouter, OpenAI proper) or against a deterministic stub in tests.
//! The provider is treated as untrusted with respect to structural
//! correctness: it only ever returns raw text, which the schedule validator
//! parses and checks downstream.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::PlannerError;

/// Default chat-completions endpoint (Groq's OpenAI-compatible API).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default model for the delegate.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Supported provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmProviderType {
    /// Deterministic canned replies for testing.
    Stub,
    /// Any OpenAI-compatible chat-completions endpoint.
    OpenAiCompatible,
}

/// Configuration passed explicitly into provider constructors. No ambient
/// globals: tests construct this with fake credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    pub provider_type: LlmProviderType,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub timeout_seconds: Option<u64>,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: LlmProviderType::OpenAiCompatible,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: None,
            max_tokens: Some(2048),
            temperature: Some(0.0),
            timeout_seconds: Some(30),
        }
    }
}

/// Information about a provider instance, for logging and display.
#[derive(Debug, Clone)]
pub struct LlmProviderInfo {
    pub name: String,
    pub model: String,
}

/// Abstract interface for generative delegates.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a single prompt and return the raw completion text.
    async fn generate_text(&self, prompt: &str) -> Result<String, PlannerError>;

    /// Get provider information.
    fn info(&self) -> LlmProviderInfo;
}

// Wire shapes for the chat-completions API.

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// OpenAI-compatible provider (works with Groq, OpenRouter and OpenAI).
#[derive(Debug)]
pub struct OpenAiLlmProvider {
    config: LlmProviderConfig,
    client: reqwest::Client,
}

impl OpenAiLlmProvider {
    /// Build the provider. Fails fast with `MissingCredential` when no API
    /// key is configured, before any network call is attempted.
    pub fn new(config: LlmProviderConfig) -> Result<Self, PlannerError> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(PlannerError::MissingCredential(
                "LLM API key is required for the OpenAI-compatible provider".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.timeout_seconds.unwrap_or(30),
            ))
            .build()
            .map_err(|e| {
                PlannerError::DelegateUnavailable(format!("failed to create HTTP client: {}", e))
            })?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlmProvider {
    async fn generate_text(&self, prompt: &str) -> Result<String, PlannerError> {
        // Checked in the constructor; kept as an error rather than a panic.
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            PlannerError::MissingCredential("LLM API key is required".to_string())
        })?;

        let base_url = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let url = format!("{}/chat/completions", base_url);

        let request_body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model = %self.config.model, url = %url, "sending delegate request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlannerError::DelegateUnavailable(format!("request timed out: {}", e))
                } else {
                    PlannerError::DelegateUnavailable(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        let raw_body = response.text().await.map_err(|e| {
            PlannerError::DelegateUnavailable(format!("failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            return Err(PlannerError::DelegateUnavailable(format!(
                "LLM API request failed (HTTP {}): {}",
                status.as_u16(),
                truncate(&raw_body, 500)
            )));
        }

        let response_body: ChatResponse = serde_json::from_str(&raw_body).map_err(|e| {
            PlannerError::DelegateUnavailable(format!(
                "failed to parse LLM API response as JSON: {} (body: {})",
                e,
                truncate(&raw_body, 500)
            ))
        })?;

        let choice = response_body.choices.into_iter().next().ok_or_else(|| {
            PlannerError::DelegateUnavailable("LLM response missing choices".to_string())
        })?;

        if choice.finish_reason.as_deref() == Some("length") {
            warn!(
                max_tokens = ?self.config.max_tokens,
                "LLM reply was truncated (finish_reason: length)"
            );
        }

        Ok(choice.message.content)
    }

    fn info(&self) -> LlmProviderInfo {
        LlmProviderInfo {
            name: "openai-compatible".to_string(),
            model: self.config.model.clone(),
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i < max)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &s[..cut], s.len())
    } else {
        s.to_string()
    }
}

/// Stub provider for testing: returns canned replies in order, repeating the
/// last one once exhausted.
pub struct StubLlmProvider {
    replies: std::sync::Mutex<Vec<String>>,
}

impl StubLlmProvider {
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self::with_replies(vec![reply.into()])
    }

    pub fn with_replies(replies: Vec<String>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies),
        }
    }
}

#[async_trait]
impl LlmProvider for StubLlmProvider {
    async fn generate_text(&self, _prompt: &str) -> Result<String, PlannerError> {
        let mut replies = self
            .replies
            .lock()
            .map_err(|_| PlannerError::DelegateUnavailable("stub lock poisoned".to_string()))?;
        if replies.len() > 1 {
            Ok(replies.remove(0))
        } else {
            replies.first().cloned().ok_or_else(|| {
                PlannerError::DelegateUnavailable("stub has no reply configured".to_string())
            })
        }
    }

    fn info(&self) -> LlmProviderInfo {
        LlmProviderInfo {
            name: "stub".to_string(),
            model: "stub-model".to_string(),
        }
    }
}

/// Factory for creating providers from configuration.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    pub fn create(config: LlmProviderConfig) -> Result<Box<dyn LlmProvider>, PlannerError> {
        match config.provider_type {
            LlmProviderType::Stub => Ok(Box::new(StubLlmProvider::with_reply(String::new()))),
            LlmProviderType::OpenAiCompatible => {
                Ok(Box::new(OpenAiLlmProvider::new(config)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_provider_returns_canned_replies_in_order() {
        let provider =
            StubLlmProvider::with_replies(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(provider.generate_text("x").await.unwrap(), "first");
        assert_eq!(provider.generate_text("x").await.unwrap(), "second");
        // Last reply repeats once exhausted.
        assert_eq!(provider.generate_text("x").await.unwrap(), "second");
    }

    #[test]
    fn test_openai_provider_requires_api_key() {
        let config = LlmProviderConfig {
            api_key: None,
            ..LlmProviderConfig::default()
        };
        let err = OpenAiLlmProvider::new(config).unwrap_err();
        assert!(matches!(err, PlannerError::MissingCredential(_)));

        let config = LlmProviderConfig {
            api_key: Some(String::new()),
            ..LlmProviderConfig::default()
        };
        let err = OpenAiLlmProvider::new(config).unwrap_err();
        assert!(matches!(err, PlannerError::MissingCredential(_)));
    }

    #[test]
    fn test_truncate_keeps_short_bodies_intact() {
        assert_eq!(truncate("short", 500), "short");
        let long = "a".repeat(600);
        let out = truncate(&long, 500);
        assert!(out.starts_with(&"a".repeat(500)));
        assert!(out.contains("600 bytes total"));
    }
}
