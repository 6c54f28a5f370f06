//! Core data models for translation

use serde::{Deserialize, Serialize};

/// A contiguous piece of a document, annotated with the whitespace that
/// surrounded it and whether it has to go through the translation engine.
///
/// `content` never starts or ends with whitespace when produced by the
/// structural splitter. Fragments produced by the size limiter keep their
/// interior whitespace inside `content`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub content: String,
    pub leading_whitespace: String,
    pub trailing_whitespace: String,
    pub should_translate: bool,
}

impl Span {
    /// Create a span without whitespace margins
    pub fn new(content: impl Into<String>, should_translate: bool) -> Self {
        Self {
            content: content.into(),
            leading_whitespace: String::new(),
            trailing_whitespace: String::new(),
            should_translate,
        }
    }

    /// Build a span from raw text, moving the leading and trailing whitespace
    /// runs into the margins.
    pub fn from_raw(raw: &str, should_translate: bool) -> Self {
        let without_leading = raw.trim_start();
        let leading = &raw[..raw.len() - without_leading.len()];
        let content = without_leading.trim_end();
        let trailing = &without_leading[content.len()..];

        Self {
            content: content.to_string(),
            leading_whitespace: leading.to_string(),
            trailing_whitespace: trailing.to_string(),
            should_translate,
        }
    }

    pub fn with_leading_whitespace(mut self, whitespace: impl Into<String>) -> Self {
        self.leading_whitespace = whitespace.into();
        self
    }

    pub fn with_trailing_whitespace(mut self, whitespace: impl Into<String>) -> Self {
        self.trailing_whitespace = whitespace.into();
        self
    }

    /// Same margins and flag, different content.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            leading_whitespace: self.leading_whitespace.clone(),
            trailing_whitespace: self.trailing_whitespace.clone(),
            should_translate: self.should_translate,
        }
    }

    /// Length of `content` in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// True when the content holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Whether the engine has to be called for this span
    pub fn needs_translation(&self) -> bool {
        self.should_translate && !self.is_blank()
    }
}

/// Append a span, with its whitespace margins, to an accumulator.
pub fn reconstruct(mut accumulator: String, span: &Span) -> String {
    accumulator.push_str(&span.leading_whitespace);
    accumulator.push_str(&span.content);
    accumulator.push_str(&span.trailing_whitespace);
    accumulator
}

/// Fold an ordered span sequence back into text.
pub fn fold_spans<'a, I>(spans: I) -> String
where
    I: IntoIterator<Item = &'a Span>,
{
    spans.into_iter().fold(String::new(), reconstruct)
}

/// Translation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub content: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl TranslationRequest {
    pub fn new(
        content: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }

    /// The same languages applied to another piece of content
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_lang: self.source_lang.clone(),
            target_lang: self.target_lang.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_extracts_margins() {
        let span = Span::from_raw("\n\n# Title\nBody\n\n", true);

        assert_eq!(span.leading_whitespace, "\n\n");
        assert_eq!(span.content, "# Title\nBody");
        assert_eq!(span.trailing_whitespace, "\n\n");
        assert!(span.should_translate);
    }

    #[test]
    fn test_from_raw_without_whitespace() {
        let span = Span::from_raw("plain", false);

        assert_eq!(span.leading_whitespace, "");
        assert_eq!(span.content, "plain");
        assert_eq!(span.trailing_whitespace, "");
    }

    #[test]
    fn test_from_raw_blank_input() {
        let span = Span::from_raw(" \n\t", true);

        assert!(span.is_blank());
        assert_eq!(span.leading_whitespace, " \n\t");
        assert_eq!(span.trailing_whitespace, "");
    }

    #[test]
    fn test_with_content_keeps_margins() {
        let span = Span::from_raw("  hello \n", true);
        let translated = span.with_content("hola");

        assert_eq!(translated.leading_whitespace, "  ");
        assert_eq!(translated.content, "hola");
        assert_eq!(translated.trailing_whitespace, " \n");
        assert!(translated.should_translate);
        // the original is untouched
        assert_eq!(span.content, "hello");
    }

    #[test]
    fn test_fold_spans() {
        let spans = vec![
            Span::new("# A", true).with_trailing_whitespace("\n\n"),
            Span::new("```\ncode\n```", false).with_trailing_whitespace("\n"),
            Span::new("tail", true).with_leading_whitespace("\n"),
        ];

        assert_eq!(fold_spans(&spans), "# A\n\n```\ncode\n```\n\ntail");
    }

    #[test]
    fn test_fold_empty() {
        assert_eq!(fold_spans(&[]), "");
    }

    #[test]
    fn test_char_len_counts_characters() {
        let span = Span::new("Hóla", true);
        assert_eq!(span.char_len(), 4);
        assert_eq!(span.content.len(), 5);
    }
}
