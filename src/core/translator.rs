//! Translation orchestrator
//!
//! Splits a document, sends the translatable spans to the engine one at a
//! time in document order, and folds everything back together. Engine calls
//! never overlap: span N+1 is only sent once span N has completed (batch) or
//! has been drained by the consumer (stream).

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::engine::TranslationEngine;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{Span, TranslationRequest};
use crate::core::prompts::{interpolate_prompt, MARKDOWN_SYSTEM_PROMPT};
use crate::processors::markdown::MarkdownSplitter;
use crate::processors::Splitter;

/// Translated text fragments, ending at the first error
pub type TranslationStream = BoxStream<'static, Result<String>>;

/// Generic translator: any splitter, any prompt template, any engine
#[derive(Debug, Clone)]
pub struct Translator<S = MarkdownSplitter> {
    engine: Arc<dyn TranslationEngine>,
    splitter: Arc<S>,
    system_prompt_template: Arc<str>,
}

impl Translator<MarkdownSplitter> {
    /// Markdown splitter and prompt with the given chunk size
    pub fn markdown(engine: Arc<dyn TranslationEngine>, chunk_size: usize) -> Self {
        Self::new(engine, MarkdownSplitter::new(chunk_size), MARKDOWN_SYSTEM_PROMPT)
    }
}

impl<S: Splitter> Translator<S> {
    /// Create a new translator
    pub fn new(
        engine: Arc<dyn TranslationEngine>,
        splitter: S,
        system_prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            splitter: Arc::new(splitter),
            system_prompt_template: Arc::from(system_prompt_template.into()),
        }
    }

    /// The spans a request will be cut into
    pub fn spans(&self, request: &TranslationRequest) -> Vec<Span> {
        self.splitter.split(&request.content)
    }

    /// System prompt with both languages filled in
    pub fn system_prompt(&self, request: &TranslationRequest) -> String {
        interpolate_prompt(
            &self.system_prompt_template,
            &request.source_lang,
            &request.target_lang,
        )
    }

    /// Translate a whole document and return it as one string.
    ///
    /// The first engine failure aborts the call; no partial output is returned.
    pub async fn translate(&self, request: &TranslationRequest) -> Result<String> {
        let spans = self.spans(request);
        let prompt = self.system_prompt(request);
        let pending = spans.iter().filter(|span| span.needs_translation()).count();

        info!(
            "Translating {} spans ({} to engine {}) from {} to {}",
            spans.len(),
            pending,
            self.engine.name(),
            request.source_lang,
            request.target_lang
        );

        let mut response = String::with_capacity(request.content.len());
        for (index, span) in spans.iter().enumerate() {
            if span.needs_translation() {
                debug!("Translating span {} ({} chars)", index, span.char_len());
                let translated = self
                    .engine
                    .invoke(&prompt, &span.content)
                    .await
                    .map_err(|source| TranslationError::SpanTranslation { index, source })?;

                response = self.splitter.reconstruct(response, &span.with_content(translated));
            } else {
                debug!("Keeping span {} verbatim", index);
                response = self.splitter.reconstruct(response, span);
            }
        }

        Ok(response)
    }

    /// Translate a document as a lazy stream of text fragments.
    ///
    /// For each span the leading whitespace comes first, then either the
    /// engine's fragments in arrival order or the untouched content, then the
    /// trailing whitespace. Empty fragments are not yielded. Concatenating
    /// everything gives the same text as [`Translator::translate`].
    ///
    /// Dropping the stream drops the in-flight engine stream with it.
    pub fn translate_stream(&self, request: &TranslationRequest) -> TranslationStream {
        let spans = self.spans(request);
        let prompt: Arc<str> = Arc::from(self.system_prompt(request));
        let engine = Arc::clone(&self.engine);

        debug!("Streaming {} spans through {}", spans.len(), engine.name());

        let fragments = stream::iter(spans.into_iter().enumerate()).flat_map(move |(index, span)| {
            span_fragments(Arc::clone(&engine), Arc::clone(&prompt), index, span)
        });

        stop_after_error(fragments).boxed()
    }
}

/// Fragments for a single span
fn span_fragments(
    engine: Arc<dyn TranslationEngine>,
    prompt: Arc<str>,
    index: usize,
    span: Span,
) -> TranslationStream {
    let needs_translation = span.needs_translation();
    let Span {
        content,
        leading_whitespace,
        trailing_whitespace,
        ..
    } = span;

    let leading = non_empty(leading_whitespace);
    let trailing = non_empty(trailing_whitespace);

    let body: TranslationStream = if needs_translation {
        // Opened only when the consumer reaches this span.
        let opened = async move {
            debug!("Opening stream for span {}", index);
            engine.stream(&prompt, &content).await
        };
        stream::once(opened)
            .try_flatten()
            .map_err(move |source| TranslationError::SpanTranslation { index, source })
            .boxed()
    } else {
        stream::iter(non_empty(content)).boxed()
    };

    stream::iter(leading)
        .chain(body)
        .chain(stream::iter(trailing))
        .boxed()
}

fn non_empty(text: String) -> Option<Result<String>> {
    (!text.is_empty()).then(|| Ok(text))
}

/// End the stream right after the first error it yields.
fn stop_after_error<St>(fragments: St) -> impl Stream<Item = Result<String>>
where
    St: Stream<Item = Result<String>>,
{
    fragments.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }
        *failed = item.is_err();
        future::ready(Some(item))
    })
}
