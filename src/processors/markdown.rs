//! Markdown splitter for translation
//!
//! Two passes:
//! 1. Structural: frontmatter, fenced code blocks and headers (or `::page`
//!    directives) decide where spans start and whether they are translated.
//! 2. Size: spans larger than the chunk size are cut by [`SizeLimiter`].

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::core::config::DEFAULT_CHUNK_SIZE;
use crate::core::models::Span;
use crate::processors::limiter::SizeLimiter;
use crate::processors::Splitter;

/// Which line pattern starts a new span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// `#`, `##`, ... followed by whitespace
    Headers,
    /// Lines starting with `::page`
    PageDirective,
}

impl SplitMode {
    /// Directive mode as soon as any line of the document starts with `::page`
    pub fn detect(markdown: &str) -> Self {
        if page_directive_in_document().is_match(markdown) {
            SplitMode::PageDirective
        } else {
            SplitMode::Headers
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            SplitMode::Headers => header_line(),
            SplitMode::PageDirective => page_directive_line(),
        }
    }
}

fn code_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^```[\w-]*\s*$").expect("valid code fence pattern"))
}

fn header_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#+\s").expect("valid header pattern"))
}

fn page_directive_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^::page").expect("valid directive pattern"))
}

fn page_directive_in_document() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^::page").expect("valid directive pattern"))
}

/// A contiguous slice of the document as cut by the structural pass
#[derive(Debug, Clone, Copy)]
struct RawSpan<'a> {
    text: &'a str,
    should_translate: bool,
}

/// Markdown splitter that keeps code blocks and frontmatter out of translation
#[derive(Debug, Clone)]
pub struct MarkdownSplitter {
    limiter: SizeLimiter,
}

impl Default for MarkdownSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl MarkdownSplitter {
    /// Create a splitter with the given span size ceiling, in characters
    pub fn new(chunk_size: usize) -> Self {
        Self {
            limiter: SizeLimiter::new(chunk_size),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.limiter.max_size()
    }

    /// Split on headers (`# `, `## `, ...)
    pub fn split_by_headers(&self, markdown: &str) -> Vec<Span> {
        self.split_with(markdown, SplitMode::Headers)
    }

    /// Split on `::page` directives
    pub fn split_by_page_directive(&self, markdown: &str) -> Vec<Span> {
        self.split_with(markdown, SplitMode::PageDirective)
    }

    fn split_with(&self, markdown: &str, mode: SplitMode) -> Vec<Span> {
        let spans = extract_whitespace(structural_split(markdown, mode.pattern()));
        debug!("Structural pass produced {} spans ({:?} mode)", spans.len(), mode);
        self.limiter.limit(spans)
    }
}

impl Splitter for MarkdownSplitter {
    fn split(&self, content: &str) -> Vec<Span> {
        self.split_with(content, SplitMode::detect(content))
    }
}

/// Index of the closing `---` when the document opens with frontmatter
fn frontmatter_end(lines: &[&str]) -> Option<usize> {
    if lines.first()?.trim() != "---" {
        return None;
    }
    lines[1..]
        .iter()
        .position(|line| line.trim() == "---")
        .map(|i| i + 1)
}

/// First pass: cut the document into contiguous raw spans.
///
/// Every byte of the input lands in exactly one raw span. Blank raw spans are
/// kept here so their whitespace can be handed to a neighbour afterwards.
fn structural_split<'a>(markdown: &'a str, split_pattern: &Regex) -> Vec<RawSpan<'a>> {
    let lines: Vec<&str> = markdown.split_inclusive('\n').collect();
    let mut raw = Vec::new();
    let mut push = |start: usize, end: usize, should_translate: bool| {
        if end > start {
            raw.push(RawSpan {
                text: &markdown[start..end],
                should_translate,
            });
        }
    };

    let mut cursor = 0;
    let mut first_line = 0;
    if let Some(end) = frontmatter_end(&lines) {
        cursor = lines[..=end].iter().map(|line| line.len()).sum();
        first_line = end + 1;
        push(0, cursor, false);
    }

    let mut start = cursor;
    let mut should_translate = true;
    let mut in_code_block = false;

    for line in &lines[first_line..] {
        let line_end = cursor + line.len();

        if code_fence().is_match(line) {
            if in_code_block {
                push(start, line_end, should_translate);
                start = line_end;
                should_translate = true;
            } else {
                push(start, cursor, should_translate);
                start = cursor;
                should_translate = false;
            }
            in_code_block = !in_code_block;
        } else if !in_code_block && split_pattern.is_match(line) {
            push(start, cursor, should_translate);
            start = cursor;
            should_translate = true;
        }

        cursor = line_end;
    }

    // An unterminated fence swallows everything up to here.
    push(start, cursor, should_translate);

    raw
}

/// Turn raw spans into trimmed spans with whitespace margins.
///
/// Blank raw spans are dropped; their whitespace becomes leading whitespace of
/// the next span, or trailing whitespace of the last one at end of input.
fn extract_whitespace(raw: Vec<RawSpan<'_>>) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::with_capacity(raw.len());
    let mut pending = String::new();

    for piece in raw {
        if piece.text.trim().is_empty() {
            pending.push_str(piece.text);
            continue;
        }

        let mut span = Span::from_raw(piece.text, piece.should_translate);
        if !pending.is_empty() {
            span.leading_whitespace.insert_str(0, &pending);
            pending.clear();
        }
        spans.push(span);
    }

    if !pending.is_empty() {
        match spans.last_mut() {
            Some(last) => last.trailing_whitespace.push_str(&pending),
            // whitespace-only document
            None => spans.push(Span::new("", false).with_leading_whitespace(pending)),
        }
    }

    spans
}
