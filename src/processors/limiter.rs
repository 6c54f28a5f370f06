//! Size ceiling for spans
//!
//! Oversized spans are cut into smaller ones by trying Markdown-aware
//! separators from the coarsest to the finest. Adjacent pieces are merged
//! back together while they fit, and only pieces that are still too large are
//! cut again with the finer separators. Separators stay attached to the start
//! of the piece that follows them, so concatenating the fragments always gives
//! back the original content with nothing repeated.

use rayon::prelude::*;
use tracing::debug;

use crate::core::models::Span;

/// Separators in priority order. Character boundaries are the final fallback.
pub const MARKDOWN_SEPARATORS: &[&str] = &[
    "\n## ",
    "\n### ",
    "\n#### ",
    "\n##### ",
    "\n###### ",
    "\n\n***\n\n",
    "\n\n---\n\n",
    "\n\n___\n\n",
    "\n\n",
    "\n",
    " ",
];

/// Splits spans whose content exceeds `max_size` characters
#[derive(Debug, Clone)]
pub struct SizeLimiter {
    max_size: usize,
    separators: &'static [&'static str],
}

impl SizeLimiter {
    /// Create a limiter; a ceiling of zero is raised to one character
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            separators: MARKDOWN_SEPARATORS,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Apply the ceiling to every span, keeping document order.
    pub fn limit(&self, spans: Vec<Span>) -> Vec<Span> {
        if spans.iter().all(|span| span.char_len() <= self.max_size) {
            return spans;
        }

        // Indexed parallel collect keeps the input order.
        let groups: Vec<Vec<Span>> = spans
            .into_par_iter()
            .map(|span| self.limit_span(span))
            .collect();

        groups.into_iter().flatten().collect()
    }

    /// Cut one span into fragments that all fit.
    ///
    /// The parent's leading whitespace goes to the first fragment and its
    /// trailing whitespace to the last one; interior fragments have none.
    pub fn limit_span(&self, mut span: Span) -> Vec<Span> {
        if span.char_len() <= self.max_size {
            return vec![span];
        }

        let fragments = self.decompose(&span.content);
        debug!(
            "Split span of {} chars into {} fragments",
            span.char_len(),
            fragments.len()
        );

        let last = fragments.len() - 1;
        let mut leading = std::mem::take(&mut span.leading_whitespace);
        let mut trailing = std::mem::take(&mut span.trailing_whitespace);

        fragments
            .into_iter()
            .enumerate()
            .map(|(i, fragment)| Span {
                content: fragment.to_string(),
                leading_whitespace: if i == 0 { std::mem::take(&mut leading) } else { String::new() },
                trailing_whitespace: if i == last { std::mem::take(&mut trailing) } else { String::new() },
                should_translate: span.should_translate,
            })
            .collect()
    }

    /// Cut text into contiguous fragments of at most `max_size` characters.
    pub fn decompose<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.is_empty() {
            return vec![text];
        }
        self.split_recursive(text, self.separators)
    }

    fn split_recursive<'a>(&self, text: &'a str, separators: &[&str]) -> Vec<&'a str> {
        if char_len(text) <= self.max_size {
            return vec![text];
        }

        let Some(position) = separators.iter().position(|sep| text.contains(sep)) else {
            return self.split_chars(text);
        };
        let finer = &separators[position + 1..];

        let mut fragments = Vec::new();
        let mut run_start = 0;
        let mut run_end = 0;
        let mut run_chars = 0;
        let mut offset = 0;

        for piece in split_keep_separator(text, separators[position]) {
            let piece_start = offset;
            let piece_chars = char_len(piece);
            offset += piece.len();

            if piece_chars > self.max_size {
                if run_end > run_start {
                    fragments.push(&text[run_start..run_end]);
                }
                fragments.extend(self.split_recursive(piece, finer));
                run_start = offset;
                run_end = offset;
                run_chars = 0;
            } else if run_chars + piece_chars > self.max_size {
                fragments.push(&text[run_start..run_end]);
                run_start = piece_start;
                run_end = offset;
                run_chars = piece_chars;
            } else {
                run_end = offset;
                run_chars += piece_chars;
            }
        }

        if run_end > run_start {
            fragments.push(&text[run_start..run_end]);
        }

        fragments
    }

    /// Last resort: fixed windows of `max_size` characters.
    fn split_chars<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let boundaries: Vec<usize> = text
            .char_indices()
            .step_by(self.max_size)
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        boundaries.windows(2).map(|w| &text[w[0]..w[1]]).collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split before every occurrence of `separator`; the separator opens the next piece.
fn split_keep_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
            start = index;
        }
    }
    pieces.push(&text[start..]);

    pieces
}
