//! Custom error types for translation operations

use thiserror::Error;

/// Failures reported by a translation engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// API request failed
    #[error("API error: {status} - {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Retry after {retry_after:?} seconds")]
    RateLimitError {
        retry_after: Option<u64>,
    },

    /// Credentials rejected by the provider
    #[error("Authentication failed: {message}")]
    AuthError {
        message: String,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
    },

    /// Invalid response from API
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        message: String,
    },

    /// Request timeout
    #[error("Request timeout")]
    TimeoutError,
}

impl EngineError {
    /// Whether repeating the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::ApiError { status, .. } => *status >= 500,
            EngineError::RateLimitError { .. }
            | EngineError::NetworkError { .. }
            | EngineError::TimeoutError => true,
            EngineError::AuthError { .. } | EngineError::InvalidResponseError { .. } => false,
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EngineError::TimeoutError
        } else if err.is_decode() {
            EngineError::InvalidResponseError {
                message: err.to_string(),
            }
        } else {
            EngineError::NetworkError {
                message: err.to_string(),
            }
        }
    }
}

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The engine failed while translating one span of the document
    #[error("Failed to translate span {index}: {source}")]
    SpanTranslation {
        index: usize,
        source: EngineError,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// Profile lookup or parsing error
    #[error("Profile error: {name} - {message}")]
    ProfileError {
        name: String,
        message: String,
    },

    /// File operation error
    #[error("File error: {path} - {message}")]
    FileError {
        path: String,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<config::ConfigError> for TranslationError {
    fn from(err: config::ConfigError) -> Self {
        TranslationError::ConfigError {
            message: err.to_string(),
        }
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(EngineError::TimeoutError.is_retryable());
        assert!(EngineError::RateLimitError { retry_after: None }.is_retryable());
        assert!(EngineError::ApiError {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_retryable());
        assert!(!EngineError::ApiError {
            status: 400,
            message: "bad request".to_string()
        }
        .is_retryable());
        assert!(!EngineError::AuthError {
            message: "invalid key".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_span_error_message_names_the_span() {
        let err = TranslationError::SpanTranslation {
            index: 3,
            source: EngineError::TimeoutError,
        };

        assert_eq!(err.to_string(), "Failed to translate span 3: Request timeout");
        assert!(std::error::Error::source(&err).is_some());
    }
}
