//! The text-generation capability the translator delegates to

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt::Debug;

use crate::core::errors::EngineError;

/// Fragments of generated text, in the order the engine produced them.
/// A failure ends the sequence.
pub type TextStream = BoxStream<'static, Result<String, EngineError>>;

/// Common trait for all translation engines
///
/// Implementations are chosen once, when a profile is turned into an engine;
/// the translator never branches on which provider sits behind this trait.
#[async_trait]
pub trait TranslationEngine: Send + Sync + Debug {
    /// Short provider name used in logs
    fn name(&self) -> &str;

    /// Run one request to completion and return the generated text
    async fn invoke(&self, system_prompt: &str, user_content: &str) -> Result<String, EngineError>;

    /// Open a streaming request.
    ///
    /// The default implementation waits for [`TranslationEngine::invoke`] and
    /// yields its result as a single fragment.
    async fn stream(&self, system_prompt: &str, user_content: &str) -> Result<TextStream, EngineError> {
        let text = self.invoke(system_prompt, user_content).await?;
        Ok(stream::once(async move { Ok(text) }).boxed())
    }
}
