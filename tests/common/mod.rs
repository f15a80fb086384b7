/*!
 * Common test utilities for the lingobatch test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use lingobatch::app_config::{Config, TranslationProvider};
use lingobatch::providers::mock::MockProvider;
use lingobatch::translation::{Dictionary, PipelineOptions, TranslationPipeline};

/// Sample SubRip content with a multi-line cue
pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains
multiple lines.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
";

/// Route library logs through the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SRT)
}

/// Pipeline options without inter-batch delay
pub fn fast_options() -> PipelineOptions {
    PipelineOptions {
        batch_delay: Duration::ZERO,
        ..PipelineOptions::default()
    }
}

/// Pipeline over a mock provider; the provider is cloned so the caller keeps its counters
pub fn mock_pipeline(provider: &MockProvider, dictionary: Dictionary, options: PipelineOptions) -> TranslationPipeline {
    init_test_logging();
    TranslationPipeline::new(Arc::new(provider.clone()), dictionary, options)
}

/// Configuration that validates without touching the environment
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;
    config.translation.active_provider_config_mut().api_key = "test-key".to_string();
    config.translation.common.batch_delay_ms = 0;
    config
}
