//! Document splitters
//!
//! A splitter cuts a document into [`Span`]s and knows how to put them back
//! together. Folding the spans of any document through
//! [`Splitter::reconstruct`] yields the document again, byte for byte.

pub mod limiter;
pub mod markdown;

use crate::core::models::{self, Span};

/// Common trait for content splitters
pub trait Splitter: Send + Sync {
    /// Split content into ordered spans
    fn split(&self, content: &str) -> Vec<Span>;

    /// Append a span to an accumulator with its whitespace margins
    fn reconstruct(&self, accumulator: String, span: &Span) -> String {
        models::reconstruct(accumulator, span)
    }
}
