use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::{FileManager, FileType};
use crate::language_utils;
use crate::providers::CompletionClient;
use crate::subtitle_processor::SubtitleCollection;
use crate::translation::{
    BatchProgress, Dictionary, PassKind, PassOutcome, PipelineOptions, Segmenter, StatusCounts,
    TranslationDocument, TranslationPipeline, TranslationService,
};

// @module: Application controller for document translation

/// Switches for one controller run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Overwrite an existing output file
    pub force_overwrite: bool,
    /// Run one retry pass over failed entries after the main pass
    pub retry_failed: bool,
    /// Run one improve pass over translated entries
    pub improve: bool,
}

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Path of the written output, `None` when the run was skipped
    pub output_path: Option<PathBuf>,
    /// Final counts of the document
    pub counts: StatusCounts,
}

impl RunSummary {
    pub fn skipped(&self) -> bool {
        self.output_path.is_none()
    }
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Post-processing rules applied to every accepted line
    dictionary: Dictionary,
}

impl Controller {
    /// Create a controller, loading the dictionary named by the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let dictionary = match &config.dictionary_path {
            Some(path) => Dictionary::load(path)?,
            None => Dictionary::new(),
        };
        Ok(Self::with_dictionary(config, dictionary))
    }

    pub fn with_dictionary(config: Config, dictionary: Dictionary) -> Self {
        Self { config, dictionary }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate one file with the configured provider
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, options: RunOptions) -> Result<RunSummary> {
        let service = Arc::new(TranslationService::new(self.config.translation.clone())?);
        info!(
            "lingobatch: {} - {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );

        let summary = self.run_with_client(service.clone(), input_file, output_dir, options).await?;

        let usage = service.usage();
        if usage.requests > 0 {
            info!("{}", usage.summary());
        }
        Ok(summary)
    }

    /// Translate one file through the given completion client
    pub async fn run_with_client(
        &self,
        client: Arc<dyn CompletionClient>,
        input_file: PathBuf,
        output_dir: PathBuf,
        options: RunOptions,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        FileManager::ensure_dir(&output_dir)?;

        let file_type = FileManager::detect_file_type(&input_file)?;
        let output_path = FileManager::generate_output_path(
            &input_file,
            &output_dir,
            &self.config.target_language,
            &file_type.output_extension(&input_file),
        );
        if FileManager::file_exists(&output_path) && !options.force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(RunSummary {
                output_path: None,
                counts: StatusCounts::default(),
            });
        }

        if language_utils::language_codes_match(&self.config.source_language, &self.config.target_language) {
            warn!(
                "Source and target language are both '{}'; the text will be rewritten in the same language",
                self.config.target_language
            );
        }

        let mut document = self.load_document(&input_file, file_type)?;
        info!("Loaded {} entries from {}", document.len(), input_file.display());

        let pipeline = TranslationPipeline::new(
            client,
            self.dictionary.clone(),
            PipelineOptions::from_config(&self.config),
        );

        let progress_bar = Self::create_progress_bar(PassKind::Translate, document.len(), pipeline.options().batch_size);
        let report = pipeline
            .translate_with_progress(&mut document, |progress| Self::advance(&progress_bar, progress))
            .await?;
        progress_bar.finish_and_clear();
        info!("Translation pass: {}", report.counts);

        if options.retry_failed {
            let eligible = report.counts.error;
            let progress_bar = Self::create_progress_bar(PassKind::Retry, eligible, pipeline.options().retry_batch_size);
            let outcome = pipeline
                .retry_failed_with_progress(&mut document, |progress| Self::advance(&progress_bar, progress))
                .await?;
            progress_bar.finish_and_clear();
            Self::log_outcome(PassKind::Retry, &outcome);
        }

        if options.improve {
            let eligible = document.status_counts().translated;
            let progress_bar = Self::create_progress_bar(PassKind::Improve, eligible, pipeline.options().batch_size);
            let outcome = pipeline
                .improve_with_progress(&mut document, |progress| Self::advance(&progress_bar, progress))
                .await?;
            progress_bar.finish_and_clear();
            Self::log_outcome(PassKind::Improve, &outcome);
        }

        let counts = document.status_counts();
        if counts.error > 0 {
            warn!(
                "{} entries could not be translated and keep their original text (use --retry-failed)",
                counts.error
            );
        }

        FileManager::write_to_file(&output_path, &Self::render_output(&document, &input_file, file_type))?;
        info!("Success: {}", output_path.display());
        info!("Completed in {}", Self::format_duration(start_time.elapsed()));

        Ok(RunSummary {
            output_path: Some(output_path),
            counts,
        })
    }

    fn load_document(&self, input_file: &Path, file_type: FileType) -> Result<TranslationDocument> {
        let segmenter = Segmenter::new(self.config.translation.common.max_chunk_length);
        match file_type {
            FileType::Subtitle => {
                let subtitles = SubtitleCollection::from_file(input_file)?;
                Ok(segmenter.segment_subtitles(&subtitles.entries))
            }
            FileType::PlainText => {
                let content = FileManager::read_to_string(input_file)
                    .context("Failed to read plain-text document")?;
                Ok(segmenter.segment_text(&content))
            }
        }
    }

    fn render_output(document: &TranslationDocument, input_file: &Path, file_type: FileType) -> String {
        match file_type {
            FileType::Subtitle => {
                SubtitleCollection::new(input_file.to_path_buf(), document.to_subtitle_entries()).to_srt_string()
            }
            FileType::PlainText => document.to_plain_text(),
        }
    }

    fn create_progress_bar(kind: PassKind, entries: usize, batch_size: usize) -> ProgressBar {
        let total_batches = entries.div_ceil(batch_size.max(1)) as u64;
        let progress_bar = ProgressBar::new(total_batches);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("=>-"));
        progress_bar.set_message(kind.to_string());
        progress_bar
    }

    fn advance(progress_bar: &ProgressBar, progress: &BatchProgress) {
        progress_bar.set_length(progress.total_batches as u64);
        progress_bar.set_position(progress.batch_index as u64);
        progress_bar.set_message(format!("{} - {}", progress.pass, progress.counts));
    }

    fn log_outcome(kind: PassKind, outcome: &PassOutcome) {
        match outcome {
            PassOutcome::Completed(report) => info!("{} pass: {}", kind, report.counts),
            PassOutcome::NothingToDo => info!("{} pass: nothing to do", kind),
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
