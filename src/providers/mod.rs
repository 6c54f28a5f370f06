//! Translation engine implementations
//!
//! - `fake`: canned responses, for tests and offline runs
//! - `openai`: OpenAI-compatible chat completions API
//! - `watsonx`: IBM watsonx.ai chat API with IAM authentication
//!
//! The HTTP engines share the status handling, retry policy and
//! server-sent-event decoding defined here and in `sse`.

pub mod fake;
pub mod openai;
pub mod sse;
pub mod watsonx;

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::config::TranslatorConfig;
use crate::core::errors::EngineError;

/// Default sampling temperature for the HTTP engines
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default completion budget for the HTTP engines
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// How often, and how patiently, a failed request is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        }
    }

    /// Exponential backoff: the base delay doubles after every attempt
    fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(2_u64.saturating_pow(attempt - 1)))
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut operation: F) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!("{} succeeded after {} retries", label, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt < policy.max_retries && e.is_retryable() => {
                attempt += 1;
                let delay = policy.delay(attempt);
                warn!("{} failed: {}, retry {} in {:?}", label, e, attempt, delay);
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Turn non-success HTTP statuses into engine errors
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, EngineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let status_code = status.as_u16();
    // Read before the body consumes the response
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    let message = response.text().await.unwrap_or_default();
    debug!("HTTP {} response body: {}", status_code, message);

    Err(match status_code {
        401 | 403 => EngineError::AuthError { message },
        429 => EngineError::RateLimitError { retry_after },
        _ => EngineError::ApiError {
            status: status_code,
            message,
        },
    })
}

/// Show only the last four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
