/*!
 * Tests for application configuration functionality
 */

use lingobatch::app_config::{Config, LogLevel, TranslationProvider};
use std::str::FromStr;
use std::time::Duration;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translation.provider, TranslationProvider::Gemini);
    assert_eq!(config.log_level, LogLevel::Info);

    let common = &config.translation.common;
    assert_eq!(common.batch_size, 50);
    assert_eq!(common.retry_batch_size, 20);
    assert_eq!(common.batch_delay(), Duration::from_secs(1));
    assert_eq!(common.context_chars, 200);
    assert!(common.preserve_context);
}

#[test]
fn test_providerDefaults_shouldCoverEveryProvider() {
    let config = Config::default();
    for provider in [
        TranslationProvider::Gemini,
        TranslationProvider::OpenAI,
        TranslationProvider::OpenRouter,
    ] {
        let provider_config = config
            .translation
            .get_provider_config(&provider)
            .expect("provider config should exist");
        assert!(!provider_config.model.is_empty());
        assert!(provider_config.endpoint.starts_with("https://"));
    }
}

#[test]
fn test_validate_withApiKey_shouldSucceed() {
    assert!(common::test_config().validate().is_ok());
}

#[test]
fn test_validate_withInvalidValues_shouldFail() {
    let mut config = common::test_config();
    config.source_language = "not-a-language".to_string();
    assert!(config.validate().is_err());

    let mut config = common::test_config();
    config.translation.common.batch_size = 0;
    assert!(config.validate().is_err());

    let mut config = common::test_config();
    config.translation.active_provider_config_mut().endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "source_language": "en",
        "target_language": "ja",
        "translation": {
            "provider": "openrouter",
            "available_providers": [
                { "type": "openrouter", "model": "meta/llama", "api_key": "k" }
            ],
            "common": { "batch_size": 10, "tone": "casual" }
        }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.translation.provider, TranslationProvider::OpenRouter);
    assert_eq!(config.translation.get_model(), "meta/llama");
    assert_eq!(config.translation.get_endpoint(), "https://openrouter.ai/api/v1");
    assert_eq!(config.translation.common.batch_size, 10);
    assert_eq!(config.translation.common.retry_batch_size, 20);
    assert_eq!(config.translation.common.tone.as_deref(), Some("casual"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_providerFromStr_shouldAcceptLowercaseNames() {
    assert_eq!(TranslationProvider::from_str("openai").unwrap(), TranslationProvider::OpenAI);
    assert_eq!(TranslationProvider::from_str("Gemini").unwrap(), TranslationProvider::Gemini);
    assert!(TranslationProvider::from_str("nope").is_err());
}

#[test]
fn test_activeProviderConfigMut_withMissingEntry_shouldCreateIt() {
    let mut config = Config::default();
    config.translation.available_providers.clear();

    config.translation.active_provider_config_mut().model = "custom".to_string();

    assert_eq!(config.translation.available_providers.len(), 1);
    assert_eq!(config.translation.get_model(), "custom");
}
