//! IBM watsonx.ai chat engine with IAM authentication

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::config::TranslatorConfig;
use crate::core::engine::{TextStream, TranslationEngine};
use crate::core::errors::{EngineError, Result, TranslationError};
use crate::profile::WatsonxProfileConfig;
use crate::providers::{check_status, sse, with_retry, RetryPolicy, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

pub const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";
pub const API_VERSION: &str = "2024-05-31";
pub const DEFAULT_MODEL: &str = "ibm/granite-3-8b-instruct";

pub const API_KEY_ENV: &str = "WATSONX_AI_APIKEY";
pub const PROJECT_ID_ENV: &str = "WATSONX_AI_PROJECT_ID";
pub const SERVICE_URL_ENV: &str = "WATSONX_AI_SERVICE_URL";

const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Refresh this long before the token actually expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

/// Engine backed by `POST {service_url}/ml/v1/text/chat`
pub struct WatsonxEngine {
    client: reqwest::Client,
    api_key: String,
    model: String,
    project_id: String,
    service_url: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryPolicy,
    token: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for WatsonxEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatsonxEngine")
            .field("model", &self.model)
            .field("project_id", &self.project_id)
            .field("service_url", &self.service_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

/// Profile value, or the environment variable when the profile leaves it empty
fn resolve_setting(configured: &str, fallback: Option<String>, env_var: &str) -> Result<String> {
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }
    match fallback {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(TranslationError::ConfigError {
            message: format!("{} is required", env_var),
        }),
    }
}

impl WatsonxEngine {
    /// Create an engine, filling missing credentials from the environment
    pub fn new(config: &WatsonxProfileConfig, settings: &TranslatorConfig) -> Result<Self> {
        Self::with_env(config, settings, |name| std::env::var(name).ok())
    }

    fn with_env<E>(config: &WatsonxProfileConfig, settings: &TranslatorConfig, env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let service_url = resolve_setting(&config.service_url, env(SERVICE_URL_ENV), SERVICE_URL_ENV)?;
        let project_id = resolve_setting(&config.project_id, env(PROJECT_ID_ENV), PROJECT_ID_ENV)?;
        let api_key = resolve_setting(&config.api_key, env(API_KEY_ENV), API_KEY_ENV)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build()
            .map_err(|e| TranslationError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            project_id,
            service_url: service_url.trim_end_matches('/').to_string(),
            temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: config.max_new_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            retry: RetryPolicy::from_config(settings),
            token: Mutex::new(None),
        })
    }

    fn endpoint(&self, stream: bool) -> String {
        let path = if stream { "chat_stream" } else { "chat" };
        format!("{}/ml/v1/text/{}?version={}", self.service_url, path, API_VERSION)
    }

    fn request_body(&self, system_prompt: &str, user_content: &str) -> Value {
        json!({
            "model_id": self.model,
            "project_id": self.project_id,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_content }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature
        })
    }

    /// Bearer token for the chat API, exchanged from the API key on demand
    async fn access_token(&self) -> std::result::Result<String, EngineError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.value.clone());
        }

        debug!("Requesting IAM token");
        let response = self
            .client
            .post(IAM_TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("grant_type", IAM_GRANT_TYPE), ("apikey", self.api_key.as_str())])
            .send()
            .await?;
        let token: IamTokenResponse = check_status(response).await?.json().await?;
        info!("IAM token acquired, valid for {}s", token.expires_in);

        let fresh = CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        };
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn send(&self, body: &Value, stream: bool) -> std::result::Result<reqwest::Response, EngineError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .post(self.endpoint(stream))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let result = check_status(response).await;
        if matches!(result, Err(EngineError::AuthError { .. })) {
            // Revoked or rotated keys: force a new exchange on the next attempt
            *self.token.lock().await = None;
        }
        result
    }

    async fn complete(&self, body: &Value) -> std::result::Result<String, EngineError> {
        let json: Value = self.send(body, false).await?.json().await?;
        message_content(&json)
    }
}

fn message_content(json: &Value) -> std::result::Result<String, EngineError> {
    json["choices"]
        .get(0)
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(str::to_string)
        .ok_or_else(|| EngineError::InvalidResponseError {
            message: "No message content in watsonx response".to_string(),
        })
}

fn delta_content(event: &Value) -> Option<String> {
    event["choices"]
        .get(0)
        .and_then(|choice| choice["delta"]["content"].as_str())
        .map(str::to_string)
}

#[async_trait]
impl TranslationEngine for WatsonxEngine {
    fn name(&self) -> &str {
        "watsonx"
    }

    async fn invoke(&self, system_prompt: &str, user_content: &str) -> std::result::Result<String, EngineError> {
        let body = self.request_body(system_prompt, user_content);
        debug!("watsonx request to {} ({} chars)", self.model, user_content.len());

        with_retry(self.retry, "watsonx request", || self.complete(&body)).await
    }

    async fn stream(&self, system_prompt: &str, user_content: &str) -> std::result::Result<TextStream, EngineError> {
        let body = self.request_body(system_prompt, user_content);
        debug!("watsonx streaming request to {}", self.model);

        let response = with_retry(self.retry, "watsonx stream", || self.send(&body, true)).await?;
        Ok(sse::text_stream(response, delta_content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;

    fn profile() -> WatsonxProfileConfig {
        WatsonxProfileConfig {
            api_key: "wx-key-123456".to_string(),
            model: None,
            project_id: "project".to_string(),
            service_url: "https://us-south.ml.cloud.ibm.com/".to_string(),
            temperature: None,
            max_new_tokens: Some(512),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_endpoints() {
        let engine = WatsonxEngine::with_env(&profile(), &TranslatorConfig::default(), no_env).unwrap();

        assert_eq!(
            engine.endpoint(false),
            "https://us-south.ml.cloud.ibm.com/ml/v1/text/chat?version=2024-05-31"
        );
        assert_eq!(
            engine.endpoint(true),
            "https://us-south.ml.cloud.ibm.com/ml/v1/text/chat_stream?version=2024-05-31"
        );
    }

    #[test]
    fn test_request_body_uses_default_model() {
        let engine = WatsonxEngine::with_env(&profile(), &TranslatorConfig::default(), no_env).unwrap();

        assert_json_eq!(
            engine.request_body("system", "Hello"),
            json!({
                "model_id": "ibm/granite-3-8b-instruct",
                "project_id": "project",
                "messages": [
                    { "role": "system", "content": "system" },
                    { "role": "user", "content": "Hello" }
                ],
                "max_tokens": 512,
                "temperature": 0.3_f32
            })
        );
    }

    #[test]
    fn test_missing_settings_fall_back_to_env() {
        let config = WatsonxProfileConfig {
            api_key: String::new(),
            project_id: String::new(),
            service_url: String::new(),
            ..profile()
        };
        let env = |name: &str| match name {
            API_KEY_ENV => Some("env-key".to_string()),
            PROJECT_ID_ENV => Some("env-project".to_string()),
            SERVICE_URL_ENV => Some("https://eu-de.ml.cloud.ibm.com".to_string()),
            _ => None,
        };

        let engine = WatsonxEngine::with_env(&config, &TranslatorConfig::default(), env).unwrap();

        assert_eq!(engine.api_key, "env-key");
        assert_eq!(engine.project_id, "env-project");
        assert_eq!(engine.service_url, "https://eu-de.ml.cloud.ibm.com");
    }

    #[test]
    fn test_missing_project_id_is_config_error() {
        let config = WatsonxProfileConfig {
            project_id: String::new(),
            ..profile()
        };

        let err = WatsonxEngine::with_env(&config, &TranslatorConfig::default(), no_env).unwrap_err();

        match err {
            TranslationError::ConfigError { message } => assert!(message.contains(PROJECT_ID_ENV)),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_api_key() {
        let engine = WatsonxEngine::with_env(&profile(), &TranslatorConfig::default(), no_env).unwrap();
        assert!(!format!("{:?}", engine).contains("wx-key"));
    }

    #[test]
    fn test_token_freshness() {
        let stale = CachedToken {
            value: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        let fresh = CachedToken {
            value: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };

        assert!(!stale.is_fresh());
        assert!(fresh.is_fresh());
    }

    #[test]
    fn test_parse_responses() {
        let json = json!({ "choices": [{ "message": { "content": "Bonjour" } }] });
        assert_eq!(message_content(&json).unwrap(), "Bonjour");

        let event = json!({ "choices": [{ "delta": { "content": "Bon" } }] });
        assert_eq!(delta_content(&event).as_deref(), Some("Bon"));
    }
}
