//! Profile to engine

use std::sync::Arc;
use tracing::info;

use crate::core::config::TranslatorConfig;
use crate::core::engine::TranslationEngine;
use crate::core::errors::Result;
use crate::profile::Profile;
use crate::providers::fake::FakeEngine;
use crate::providers::openai::OpenAiEngine;
use crate::providers::watsonx::WatsonxEngine;

/// Build the engine a profile describes
pub fn create_engine(profile: &Profile, config: &TranslatorConfig) -> Result<Arc<dyn TranslationEngine>> {
    let engine: Arc<dyn TranslationEngine> = match profile {
        Profile::Fake { config: fake, .. } => Arc::new(FakeEngine::new(fake.responses.clone())),
        Profile::OpenAi { config: openai, .. } => Arc::new(OpenAiEngine::new(openai, config)?),
        Profile::Watsonx { config: watsonx, .. } => Arc::new(WatsonxEngine::new(watsonx, config)?),
    };

    info!("Using profile {} ({} engine)", profile.name(), engine.name());
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::TranslationError;
    use crate::profile::{FakeProfileConfig, OpenAiProfileConfig};

    #[tokio::test]
    async fn test_create_fake_engine() {
        let profile = Profile::Fake {
            name: "test".to_string(),
            config: FakeProfileConfig {
                responses: vec!["Hóla".to_string()],
            },
        };

        let engine = create_engine(&profile, &TranslatorConfig::default()).unwrap();

        assert_eq!(engine.name(), "fake");
        assert_eq!(engine.invoke("", "Hello").await.unwrap(), "Hóla");
    }

    #[test]
    fn test_create_openai_engine() {
        let profile = Profile::OpenAi {
            name: "default".to_string(),
            config: OpenAiProfileConfig {
                api_key: "sk-test".to_string(),
                model: "gpt-4o-mini".to_string(),
                base_url: None,
                temperature: Some(0.0),
                max_tokens: None,
            },
        };

        let engine = create_engine(&profile, &TranslatorConfig::default()).unwrap();
        assert_eq!(engine.name(), "openai");
    }

    #[test]
    fn test_openai_without_key_is_config_error() {
        let profile = Profile::OpenAi {
            name: "broken".to_string(),
            config: OpenAiProfileConfig {
                api_key: String::new(),
                model: "gpt-4o".to_string(),
                base_url: None,
                temperature: None,
                max_tokens: None,
            },
        };

        let err = create_engine(&profile, &TranslatorConfig::default()).unwrap_err();
        assert!(matches!(err, TranslationError::ConfigError { .. }));
    }
}
