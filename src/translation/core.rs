/*!
 * Core translation service implementation.
 *
 * `TranslationService` turns the active provider configuration into a
 * concrete API client and exposes it through the `CompletionClient`
 * boundary consumed by the pipeline. It sends exactly one request per call.
 */

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::ProviderError;
use crate::providers::gemini::{Gemini, GeminiRequest};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::{CompletionClient, Provider};

/// Token usage statistics for tracking API consumption
#[derive(Debug, Clone)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Number of API requests sent
    pub requests: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl TokenUsageStats {
    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            requests: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider,
            model,
        }
    }

    /// Record one request
    pub fn record(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>, duration: Duration) {
        self.requests += 1;
        self.prompt_tokens += prompt_tokens.unwrap_or(0);
        self.completion_tokens += completion_tokens.unwrap_or(0);
        self.api_duration += duration;
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        format!(
            "Token Usage Summary:\n\
             Provider: {}\n\
             Model: {}\n\
             Requests: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             Elapsed time: {:.2} minutes\n\
             API request time: {:.2} minutes",
            self.provider,
            self.model,
            self.requests,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens(),
            self.start_time.elapsed().as_secs_f64() / 60.0,
            self.api_duration.as_secs_f64() / 60.0
        )
    }
}

/// Translation provider implementation variants
#[derive(Debug)]
enum TranslationProviderImpl {
    /// Google Gemini
    Gemini { client: Gemini },

    /// OpenAI chat completions
    OpenAI { client: OpenAI },

    /// OpenRouter gateway (OpenAI-compatible)
    OpenRouter { client: OpenAI },
}

/// Completion client backed by the configured provider
#[derive(Debug)]
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,

    usage: Mutex<TokenUsageStats>,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let api_key = config.get_api_key();
        if api_key.trim().is_empty() {
            return Err(anyhow!(
                "No API key configured for {} (set it in the config file or {})",
                config.provider.display_name(),
                config.provider.api_key_env_var()
            ));
        }

        let endpoint = config.get_endpoint();
        let timeout = config.get_timeout();

        let provider = match config.provider {
            ConfigTranslationProvider::Gemini => TranslationProviderImpl::Gemini {
                client: Gemini::new(api_key, endpoint, config.get_model(), timeout)?,
            },
            ConfigTranslationProvider::OpenAI => TranslationProviderImpl::OpenAI {
                client: OpenAI::new(api_key, endpoint, timeout)?,
            },
            ConfigTranslationProvider::OpenRouter => TranslationProviderImpl::OpenRouter {
                client: OpenAI::openrouter(api_key, endpoint, timeout)?,
            },
        };

        let usage = TokenUsageStats::with_provider_info(
            config.provider.display_name().to_string(),
            config.get_model(),
        );

        Ok(Self {
            provider,
            config,
            usage: Mutex::new(usage),
        })
    }

    /// Snapshot of the usage recorded so far
    pub fn usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }

    async fn send(&self, prompt: &str) -> Result<(String, Option<u64>, Option<u64>), ProviderError> {
        let temperature = self.config.common.temperature;

        match &self.provider {
            TranslationProviderImpl::Gemini { client } => {
                let request = GeminiRequest::new(prompt).temperature(temperature);
                let response = client.complete(request).await?;
                let usage = response.usage_metadata.as_ref();
                Ok((
                    Gemini::extract_text(&response),
                    usage.map(|u| u.prompt_token_count),
                    usage.map(|u| u.candidates_token_count),
                ))
            }
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::OpenRouter { client } => {
                let request = OpenAIRequest::new(self.config.get_model())
                    .add_message("user", prompt)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                let usage = response.usage.as_ref();
                Ok((
                    OpenAI::extract_text(&response),
                    usage.map(|u| u.prompt_tokens),
                    usage.map(|u| u.completion_tokens),
                ))
            }
        }
    }
}

#[async_trait]
impl CompletionClient for TranslationService {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let start_time = Instant::now();
        let (text, prompt_tokens, completion_tokens) = self.send(prompt).await?;
        let duration = start_time.elapsed();

        self.usage.lock().record(prompt_tokens, completion_tokens, duration);
        debug!(
            "{} response received in {:?} ({} chars)",
            self.config.provider.display_name(),
            duration,
            text.len()
        );

        if text.trim().is_empty() {
            return Err(ProviderError::ParseError(format!(
                "{} returned an empty response",
                self.config.provider.display_name()
            )));
        }

        Ok(text)
    }
}
