//! Named provider profiles
//!
//! A profile is a JSON file `{ "name", "provider", "config" }` where
//! `provider` decides the shape of `config`. Profiles are only read here;
//! [`create_engine`] turns one into a ready-to-use engine.

pub mod factory;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::providers::mask_secret;

pub use factory::create_engine;
pub use store::{list_profiles, load_profile, profile_exists, profile_path};

/// Settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiProfileConfig {
    pub api_key: String,
    pub model: String,
    /// Defaults to the public OpenAI API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Settings for IBM watsonx.ai
///
/// Empty `api_key`, `project_id` or `service_url` fall back to the
/// `WATSONX_AI_APIKEY`, `WATSONX_AI_PROJECT_ID` and `WATSONX_AI_SERVICE_URL`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatsonxProfileConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub service_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,
}

/// Canned responses for the fake engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeProfileConfig {
    pub responses: Vec<String>,
}

/// A named provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum Profile {
    #[serde(rename = "fake")]
    Fake {
        name: String,
        config: FakeProfileConfig,
    },
    #[serde(rename = "openai")]
    OpenAi {
        name: String,
        config: OpenAiProfileConfig,
    },
    #[serde(rename = "watsonx")]
    Watsonx {
        name: String,
        config: WatsonxProfileConfig,
    },
}

impl Profile {
    pub fn name(&self) -> &str {
        match self {
            Profile::Fake { name, .. } | Profile::OpenAi { name, .. } | Profile::Watsonx { name, .. } => name,
        }
    }

    /// Provider tag as written in the profile file
    pub fn provider(&self) -> &'static str {
        match self {
            Profile::Fake { .. } => "fake",
            Profile::OpenAi { .. } => "openai",
            Profile::Watsonx { .. } => "watsonx",
        }
    }

    /// Copy with API keys masked, for display
    pub fn redacted(&self) -> Self {
        let mut profile = self.clone();
        match &mut profile {
            Profile::OpenAi { config, .. } => config.api_key = mask_secret(&config.api_key),
            Profile::Watsonx { config, .. } if !config.api_key.is_empty() => {
                config.api_key = mask_secret(&config.api_key)
            }
            _ => {}
        }
        profile
    }
}
