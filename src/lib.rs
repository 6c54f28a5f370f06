//! Translation AI - structure-preserving Markdown translation
//!
//! Documents are cut into spans along their Markdown structure, only the
//! prose is sent to a language-model engine, and the result is folded back
//! together so that code, frontmatter and whitespace survive untouched.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod processors;
pub mod profile;
pub mod providers;

// Re-export key types for convenience
pub use crate::core::{
    config::TranslatorConfig,
    engine::{TextStream, TranslationEngine},
    errors::{EngineError, TranslationError},
    models::{Span, TranslationRequest},
    translator::{TranslationStream, Translator},
};

pub use crate::processors::{limiter::SizeLimiter, markdown::MarkdownSplitter, Splitter};

pub use crate::profile::{create_engine, load_profile, Profile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
