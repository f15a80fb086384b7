/*!
 * # lingobatch - batch translation of long documents with LLMs
 *
 * A Rust library for translating subtitle files and long texts through
 * large-language-model completion APIs.
 *
 * ## Features
 *
 * - Split SubRip files and plain text into bounded translation entries
 * - Translate in sequential batches through Gemini, OpenAI or OpenRouter
 * - Track a status per entry and retry only the failed ones
 * - Refine existing translations in a separate pass
 * - Post-process every accepted line with a whole-word dictionary
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SubRip parsing and serialization
 * - `translation`: The batch translation pipeline:
 *   - `translation::segmenter`: Source text to entries
 *   - `translation::pipeline`: Translate, retry and improve passes
 *   - `translation::dictionary`: Find/replace post-processing
 *   - `translation::core`: Provider-backed completion client
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for the LLM APIs
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{ProviderError, SubtitleError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use translation::{Dictionary, TranslationDocument, TranslationPipeline, TranslationService};
