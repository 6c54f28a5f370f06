//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::errors::{Result, TranslationError};

/// Default size ceiling for a single span, in characters
pub const DEFAULT_CHUNK_SIZE: usize = 12_000;

/// Prefix of the environment variables that override configuration values
pub const ENV_PREFIX: &str = "TRANSLATION_AI";

/// Base name of the optional configuration file looked up in the working directory
const DEFAULT_CONFIG_NAME: &str = "translation-ai";

/// Configuration for translator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Largest span content, in characters, sent to the engine in one call
    pub chunk_size: usize,
    /// Directory holding `<name>.json` profile files
    pub profiles_dir: PathBuf,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            profiles_dir: default_profiles_dir(),
            timeout_ms: 120_000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// `$HOME/.config/translation-ai-cli/profiles`
pub fn default_profiles_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("translation-ai-cli")
        .join("profiles")
}

impl TranslatorConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Later sources win: built-in defaults, then `path` (or
    /// `translation-ai.{toml,json,yaml}` in the working directory when no
    /// path is given), then `TRANSLATION_AI_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_source = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file_source)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;

        match path {
            Some(path) => info!("Loaded configuration from {}", path.display()),
            None => debug!("Loaded configuration from defaults and environment"),
        }

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load from a configuration file, still honouring environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(Some(path.as_ref()))
    }

    /// Override the span size ceiling
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(TranslationError::ConfigError {
                message: "chunk_size must be greater than 0".to_string(),
            });
        }

        if self.timeout_ms == 0 {
            return Err(TranslationError::ConfigError {
                message: "timeout_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
