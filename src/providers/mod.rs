/*!
 * Provider implementations for the completion services used by the pipeline.
 *
 * This module contains client implementations for the supported LLM APIs:
 * - Gemini: Google Generative Language API
 * - OpenAI: OpenAI chat completions (also used for OpenRouter)
 * - Mock: scripted in-process client for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// Each provider has its own wire request/response types; the translation
/// service converts a plain prompt into the provider's request.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Send a single request; no retry is attempted on failure
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract the generated text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Prompt-in, text-out boundary consumed by the translation pipeline
///
/// Any failure surfaces as a `ProviderError`; callers treat it as a failed
/// batch without inspecting the variant.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub mod gemini;
pub mod mock;
pub mod openai;
