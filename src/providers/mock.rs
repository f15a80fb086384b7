/*!
 * Mock completion client for testing.
 *
 * This module provides a scripted client that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds, echoing a marked translation
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::fail_on_calls(..)` - Fails only on the chosen calls
 * - `MockProvider::truncated(n)` - Answers only the first `n` lines or segments
 * - `MockProvider::with_responder(..)` - Delegates to a closure
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::CompletionClient;
use crate::translation::prompts::{
    parse_segmented_response, payload_of, segment_tag, SEGMENT_SEPARATOR,
};

/// Prefix added to every line the working mock "translates"
pub const MOCK_TRANSLATION_PREFIX: &str = "TR: ";

/// Prefix added to every segment the working mock "improves"
pub const MOCK_IMPROVEMENT_PREFIX: &str = "IMPROVED: ";

type Responder = Arc<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>;

/// Behavior mode for the mock provider
#[derive(Clone)]
pub enum MockBehavior {
    /// Always succeeds with a marked translation of every line or segment
    Working,
    /// Always fails with an error
    Failing,
    /// Fails on the listed 1-based call numbers, works otherwise
    FailOnCalls(Vec<usize>),
    /// Works but returns only the first `keep` lines or segments
    Truncated { keep: usize },
    /// Returns an empty response
    Empty,
    /// Delegates to a closure receiving the full prompt
    Custom(Responder),
}

impl fmt::Debug for MockBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Working => f.write_str("Working"),
            Self::Failing => f.write_str("Failing"),
            Self::FailOnCalls(calls) => f.debug_tuple("FailOnCalls").field(calls).finish(),
            Self::Truncated { keep } => f.debug_struct("Truncated").field("keep", keep).finish(),
            Self::Empty => f.write_str("Empty"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Mock provider for testing pipeline behavior
///
/// Clones share the call counter and the recorded prompts.
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    call_count: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Fail on the given 1-based call numbers
    pub fn fail_on_calls(calls: &[usize]) -> Self {
        Self::new(MockBehavior::FailOnCalls(calls.to_vec()))
    }

    pub fn truncated(keep: usize) -> Self {
        Self::new(MockBehavior::Truncated { keep })
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self::new(MockBehavior::Custom(Arc::new(responder)))
    }

    /// Number of completed calls so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Answer a prompt the way a well-behaved model would, keeping at most `keep` items
    ///
    /// Main-pass payloads get one marked line per input line. Id-tagged
    /// payloads get one tagged segment per input segment; improve segments
    /// are answered with their current translation marked as improved.
    pub fn respond_to(prompt: &str, keep: Option<usize>) -> String {
        let payload = payload_of(prompt);
        let limit = keep.unwrap_or(usize::MAX);

        if payload.trim_start().starts_with("[[ID:") {
            return parse_segmented_response(payload)
                .into_iter()
                .take(limit)
                .filter_map(|segment| {
                    let id = segment.id?;
                    let answer = match segment.text.rfind("CURRENT:") {
                        Some(index) => format!(
                            "{}{}",
                            MOCK_IMPROVEMENT_PREFIX,
                            segment.text[index + "CURRENT:".len()..].trim()
                        ),
                        None => format!("{}{}", MOCK_TRANSLATION_PREFIX, segment.text),
                    };
                    Some(format!("{} {}", segment_tag(id), answer))
                })
                .collect::<Vec<_>>()
                .join(&format!("\n{}\n", SEGMENT_SEPARATOR));
        }

        payload
            .lines()
            .take(limit)
            .map(|line| format!("{}{}", MOCK_TRANSLATION_PREFIX, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl CompletionClient for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().push(prompt.to_string());

        match &self.behavior {
            MockBehavior::Working => Ok(Self::respond_to(prompt, None)),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::FailOnCalls(calls) => {
                if calls.contains(&call) {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated failure (request #{})", call),
                        status_code: 503,
                    })
                } else {
                    Ok(Self::respond_to(prompt, None))
                }
            }

            MockBehavior::Truncated { keep } => Ok(Self::respond_to(prompt, Some(*keep))),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Custom(responder) => responder(prompt),
        }
    }
}
