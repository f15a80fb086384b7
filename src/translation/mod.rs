/*!
 * Batch translation of long documents through a completion API.
 *
 * It is split into several submodules:
 *
 * - `core`: Completion client backed by the configured provider
 * - `document`: Entries, statuses and output assembly
 * - `segmenter`: Splitting source text into bounded entries
 * - `pipeline`: Sequential translate, retry and improve passes
 * - `prompts`: Prompt builders and response parsing
 * - `dictionary`: Whole-word find/replace post-processing
 */

// Re-export main types for easier usage
pub use self::core::{TokenUsageStats, TranslationService};
pub use self::dictionary::{Dictionary, DictionaryRule};
pub use self::document::{
    DocumentKind, Entry, EntryStatus, SourceSpan, StatusCounts, TranslationDocument,
};
pub use self::pipeline::{
    BatchProgress, PassKind, PassOutcome, PassReport, PipelineOptions, TranslationPipeline,
};
pub use self::prompts::TranslationPromptBuilder;
pub use self::segmenter::Segmenter;

// Submodules
pub mod core;
pub mod dictionary;
pub mod document;
pub mod pipeline;
pub mod prompts;
pub mod segmenter;
