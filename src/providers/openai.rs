//! OpenAI-compatible chat completions engine

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::core::config::TranslatorConfig;
use crate::core::engine::{TextStream, TranslationEngine};
use crate::core::errors::{EngineError, Result, TranslationError};
use crate::profile::OpenAiProfileConfig;
use crate::providers::{check_status, sse, with_retry, RetryPolicy, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

/// Public OpenAI API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Engine backed by `POST {base_url}/chat/completions`
#[derive(Clone)]
pub struct OpenAiEngine {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl fmt::Debug for OpenAiEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEngine")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl OpenAiEngine {
    /// Create an engine from a profile and the shared HTTP settings
    pub fn new(config: &OpenAiProfileConfig, settings: &TranslatorConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(TranslationError::ConfigError {
                message: "OpenAI profile requires an API key".to_string(),
            });
        }
        if config.model.is_empty() {
            return Err(TranslationError::ConfigError {
                message: "OpenAI profile requires a model".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build()
            .map_err(|e| TranslationError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            retry: RetryPolicy::from_config(settings),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, system_prompt: &str, user_content: &str, stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_content }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });
        if stream {
            body["stream"] = json!(true);
        }
        body
    }

    async fn send(&self, body: &Value) -> std::result::Result<reqwest::Response, EngineError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        check_status(response).await
    }

    async fn complete(&self, body: &Value) -> std::result::Result<String, EngineError> {
        let json: Value = self.send(body).await?.json().await?;
        message_content(&json)
    }
}

/// `choices[0].message.content` of a completion
fn message_content(json: &Value) -> std::result::Result<String, EngineError> {
    json["choices"]
        .get(0)
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(str::to_string)
        .ok_or_else(|| EngineError::InvalidResponseError {
            message: "No message content in response".to_string(),
        })
}

/// `choices[0].delta.content` of a streamed chunk
fn delta_content(event: &Value) -> Option<String> {
    event["choices"]
        .get(0)
        .and_then(|choice| choice["delta"]["content"].as_str())
        .map(str::to_string)
}

#[async_trait]
impl TranslationEngine for OpenAiEngine {
    fn name(&self) -> &str {
        "openai"
    }

    async fn invoke(&self, system_prompt: &str, user_content: &str) -> std::result::Result<String, EngineError> {
        let body = self.request_body(system_prompt, user_content, false);
        debug!("OpenAI request to {} ({} chars)", self.model, user_content.len());

        with_retry(self.retry, "OpenAI request", || self.complete(&body)).await
    }

    async fn stream(&self, system_prompt: &str, user_content: &str) -> std::result::Result<TextStream, EngineError> {
        let body = self.request_body(system_prompt, user_content, true);
        debug!("OpenAI streaming request to {}", self.model);

        // Only opening the stream is retried; fragments already yielded cannot be taken back.
        let response = with_retry(self.retry, "OpenAI stream", || self.send(&body)).await?;
        Ok(sse::text_stream(response, delta_content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;

    fn profile() -> OpenAiProfileConfig {
        OpenAiProfileConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-4o".to_string(),
            base_url: Some("http://localhost:8080/v1/".to_string()),
            temperature: None,
            max_tokens: None,
        }
    }

    #[test]
    fn test_request_body() {
        let engine = OpenAiEngine::new(&profile(), &TranslatorConfig::default()).unwrap();

        assert_json_eq!(
            engine.request_body("system", "Hello", false),
            json!({
                "model": "gpt-4o",
                "messages": [
                    { "role": "system", "content": "system" },
                    { "role": "user", "content": "Hello" }
                ],
                "temperature": 0.3_f32,
                "max_tokens": 2000
            })
        );
        assert_eq!(engine.request_body("s", "u", true)["stream"], json!(true));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let engine = OpenAiEngine::new(&profile(), &TranslatorConfig::default()).unwrap();
        assert_eq!(engine.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_missing_api_key() {
        let mut config = profile();
        config.api_key.clear();

        assert!(OpenAiEngine::new(&config, &TranslatorConfig::default()).is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let engine = OpenAiEngine::new(&profile(), &TranslatorConfig::default()).unwrap();
        assert!(!format!("{:?}", engine).contains("sk-test"));
    }

    #[test]
    fn test_parse_message_content() {
        let json = json!({ "choices": [{ "message": { "role": "assistant", "content": "Hola" } }] });
        assert_eq!(message_content(&json).unwrap(), "Hola");

        assert!(message_content(&json!({ "choices": [] })).is_err());
    }

    #[test]
    fn test_parse_delta_content() {
        let event = json!({ "choices": [{ "delta": { "content": "Ho" } }] });
        assert_eq!(delta_content(&event).as_deref(), Some("Ho"));

        let role_only = json!({ "choices": [{ "delta": { "role": "assistant" } }] });
        assert_eq!(delta_content(&role_only), None);
    }
}
