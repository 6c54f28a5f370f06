//! Engine with canned responses

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::engine::{TextStream, TranslationEngine};
use crate::core::errors::EngineError;

/// Returns its configured responses in order, starting over after the last.
/// Streaming yields the response one character at a time.
#[derive(Debug)]
pub struct FakeEngine {
    responses: Vec<String>,
    calls: AtomicUsize,
}

impl FakeEngine {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of requests served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> Result<String, EngineError> {
        if self.responses.is_empty() {
            return Err(EngineError::InvalidResponseError {
                message: "Fake engine has no responses configured".to_string(),
            });
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.responses[call % self.responses.len()].clone())
    }
}

#[async_trait]
impl TranslationEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    async fn invoke(&self, _system_prompt: &str, _user_content: &str) -> Result<String, EngineError> {
        self.next_response()
    }

    async fn stream(&self, _system_prompt: &str, _user_content: &str) -> Result<TextStream, EngineError> {
        let response = self.next_response()?;
        let fragments: Vec<Result<String, EngineError>> =
            response.chars().map(|c| Ok(c.to_string())).collect();
        Ok(stream::iter(fragments).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_responses_cycle() {
        let engine = FakeEngine::new(vec!["a".to_string(), "b".to_string()]);

        assert_eq!(engine.invoke("", "x").await.unwrap(), "a");
        assert_eq!(engine.invoke("", "x").await.unwrap(), "b");
        assert_eq!(engine.invoke("", "x").await.unwrap(), "a");
        assert_eq!(engine.calls(), 3);
    }

    #[tokio::test]
    async fn test_stream_per_character() {
        let engine = FakeEngine::new(vec!["Hóla".to_string()]);

        let fragments: Vec<String> = engine.stream("", "x").await.unwrap().try_collect().await.unwrap();

        assert_eq!(fragments, vec!["H", "ó", "l", "a"]);
    }

    #[tokio::test]
    async fn test_no_responses_is_an_error() {
        let engine = FakeEngine::new(vec![]);
        assert!(engine.invoke("", "x").await.is_err());
    }
}
