/*!
 * Sequential batch translation pipeline.
 *
 * Every pass walks a subset of the document's entries in consecutive
 * batches, awaits one completion call per batch, applies the outcome to the
 * entries right away and pauses before the next batch. A failed call only
 * affects the entries of its own batch.
 *
 * - `translate`: every entry, one line per entry, positional alignment
 * - `retry_failed`: only `Error` entries, id-tagged segments
 * - `improve`: only `Translated` entries, original and current text sent together
 * - `retranslate_entry`: one entry through the main-pass path
 */

use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::TranslationError;
use crate::language_utils;
use crate::providers::CompletionClient;
use super::dictionary::Dictionary;
use super::document::{EntryStatus, StatusCounts, TranslationDocument};
use super::prompts::{
    decode_line, encode_line, parse_batch_response, parse_segmented_response, tail_chars,
    ParsedSegment, TranslationPromptBuilder,
};

/// Settings for every pass of the pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Source language name used in prompts; `None` lets the model detect it
    pub source_language: Option<String>,

    /// Target language name used in prompts
    pub target_language: String,

    pub tone: Option<String>,

    pub style: Option<String>,

    /// Thread the tail of each batch's output into the next request
    pub preserve_context: bool,

    /// Entries per request in the main and improve passes
    pub batch_size: usize,

    /// Entries per request in the retry pass
    pub retry_batch_size: usize,

    /// Pause between consecutive batches
    pub batch_delay: Duration,

    /// Length of the context window in characters
    pub context_chars: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            source_language: None,
            target_language: "French".to_string(),
            tone: None,
            style: None,
            preserve_context: true,
            batch_size: 50,
            retry_batch_size: 20,
            batch_delay: Duration::from_secs(1),
            context_chars: 200,
        }
    }
}

impl PipelineOptions {
    /// Options derived from the application configuration
    pub fn from_config(config: &Config) -> Self {
        let common = &config.translation.common;
        Self {
            source_language: Some(language_utils::prompt_language_name(&config.source_language)),
            target_language: language_utils::prompt_language_name(&config.target_language),
            tone: common.tone.clone(),
            style: common.style.clone(),
            preserve_context: common.preserve_context,
            batch_size: common.batch_size,
            retry_batch_size: common.retry_batch_size,
            batch_delay: common.batch_delay(),
            context_chars: common.context_chars,
        }
    }

    pub fn validate(&self) -> Result<(), TranslationError> {
        if self.batch_size == 0 || self.retry_batch_size == 0 {
            return Err(TranslationError::InvalidOptions(
                "batch sizes must be greater than zero".to_string(),
            ));
        }
        if self.target_language.trim().is_empty() {
            return Err(TranslationError::InvalidOptions(
                "target language must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Prompt builder carrying language, tone and style
    pub fn prompt_builder(&self) -> TranslationPromptBuilder {
        TranslationPromptBuilder::new(&self.target_language)
            .with_source_language(self.source_language.as_deref())
            .with_tone(self.tone.as_deref())
            .with_style(self.style.as_deref())
    }
}

/// Kind of pass run over a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Translate,
    Retry,
    Improve,
    Retranslate,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PassKind::Translate => "translate",
            PassKind::Retry => "retry",
            PassKind::Improve => "improve",
            PassKind::Retranslate => "retranslate",
        };
        f.write_str(label)
    }
}

/// Summary of a completed pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub kind: PassKind,
    /// Number of batches, which equals the number of completion calls
    pub batches: usize,
    /// Batches whose completion call failed
    pub failed_batches: usize,
    /// Document-wide counts after the pass
    pub counts: StatusCounts,
}

/// Result of a caller-triggered pass that may have no eligible entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Completed(PassReport),
    /// No entry was eligible; nothing was sent and nothing changed
    NothingToDo,
}

impl PassOutcome {
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            PassOutcome::Completed(report) => Some(report),
            PassOutcome::NothingToDo => None,
        }
    }

    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, PassOutcome::NothingToDo)
    }
}

/// Snapshot published after each batch
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress {
    pub pass: PassKind,
    /// 1-based index of the batch just finished
    pub batch_index: usize,
    pub total_batches: usize,
    pub counts: StatusCounts,
}

/// Drives translation passes over a document
pub struct TranslationPipeline {
    client: Arc<dyn CompletionClient>,
    dictionary: Dictionary,
    options: PipelineOptions,
}

impl TranslationPipeline {
    pub fn new(client: Arc<dyn CompletionClient>, dictionary: Dictionary, options: PipelineOptions) -> Self {
        Self {
            client,
            dictionary,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Translate every entry of the document
    pub async fn translate(&self, doc: &mut TranslationDocument) -> Result<PassReport, TranslationError> {
        self.translate_with_progress(doc, |_| {}).await
    }

    pub async fn translate_with_progress<F>(
        &self,
        doc: &mut TranslationDocument,
        mut on_batch: F,
    ) -> Result<PassReport, TranslationError>
    where
        F: FnMut(&BatchProgress),
    {
        self.options.validate()?;
        let positions: Vec<usize> = (0..doc.len()).collect();
        let report = self
            .run_batches(doc, PassKind::Translate, &positions, self.options.batch_size, &mut on_batch)
            .await;
        Ok(report)
    }

    /// Re-dispatch only the entries currently in `Error`
    pub async fn retry_failed(&self, doc: &mut TranslationDocument) -> Result<PassOutcome, TranslationError> {
        self.retry_failed_with_progress(doc, |_| {}).await
    }

    pub async fn retry_failed_with_progress<F>(
        &self,
        doc: &mut TranslationDocument,
        mut on_batch: F,
    ) -> Result<PassOutcome, TranslationError>
    where
        F: FnMut(&BatchProgress),
    {
        self.options.validate()?;
        let positions = doc.positions_with_status(EntryStatus::Error);
        if positions.is_empty() {
            info!("No failed entries to retry");
            return Ok(PassOutcome::NothingToDo);
        }

        info!("Retrying {} failed entries", positions.len());
        let report = self
            .run_batches(doc, PassKind::Retry, &positions, self.options.retry_batch_size, &mut on_batch)
            .await;
        Ok(PassOutcome::Completed(report))
    }

    /// Ask the model to refine entries that are already translated
    pub async fn improve(&self, doc: &mut TranslationDocument) -> Result<PassOutcome, TranslationError> {
        self.improve_with_progress(doc, |_| {}).await
    }

    pub async fn improve_with_progress<F>(
        &self,
        doc: &mut TranslationDocument,
        mut on_batch: F,
    ) -> Result<PassOutcome, TranslationError>
    where
        F: FnMut(&BatchProgress),
    {
        self.options.validate()?;
        let positions = doc.positions_with_status(EntryStatus::Translated);
        if positions.is_empty() {
            info!("No translated entries to improve");
            return Ok(PassOutcome::NothingToDo);
        }

        info!("Improving {} translated entries", positions.len());
        let report = self
            .run_batches(doc, PassKind::Improve, &positions, self.options.batch_size, &mut on_batch)
            .await;
        Ok(PassOutcome::Completed(report))
    }

    /// Translate a single entry as a one-entry batch
    pub async fn retranslate_entry(
        &self,
        doc: &mut TranslationDocument,
        id: usize,
    ) -> Result<EntryStatus, TranslationError> {
        self.options.validate()?;
        let position = doc.position_of(id).ok_or(TranslationError::EntryNotFound(id))?;

        let mut no_context = None;
        self.run_line_batch(doc, &[position], &mut no_context).await;
        Ok(doc.entries()[position].status)
    }

    async fn run_batches<F>(
        &self,
        doc: &mut TranslationDocument,
        kind: PassKind,
        positions: &[usize],
        batch_size: usize,
        on_batch: &mut F,
    ) -> PassReport
    where
        F: FnMut(&BatchProgress),
    {
        let total_batches = positions.len().div_ceil(batch_size);
        let mut context: Option<String> = None;
        let mut failed_batches = 0;

        for (index, batch) in positions.chunks(batch_size).enumerate() {
            debug!("{} batch {}/{} ({} entries)", kind, index + 1, total_batches, batch.len());

            let succeeded = match kind {
                PassKind::Translate | PassKind::Retranslate => {
                    self.run_line_batch(doc, batch, &mut context).await
                }
                PassKind::Retry => self.run_retry_batch(doc, batch, &mut context).await,
                PassKind::Improve => self.run_improve_batch(doc, batch, &mut context).await,
            };
            if !succeeded {
                failed_batches += 1;
            }

            on_batch(&BatchProgress {
                pass: kind,
                batch_index: index + 1,
                total_batches,
                counts: doc.status_counts(),
            });

            if index + 1 < total_batches && !self.options.batch_delay.is_zero() {
                tokio::time::sleep(self.options.batch_delay).await;
            }
        }

        let report = PassReport {
            kind,
            batches: total_batches,
            failed_batches,
            counts: doc.status_counts(),
        };
        info!(
            "{} pass finished: {} batches ({} failed); {}",
            kind, report.batches, report.failed_batches, report.counts
        );
        report
    }

    /// Main-pass batch: one line per entry, aligned by position
    async fn run_line_batch(
        &self,
        doc: &mut TranslationDocument,
        positions: &[usize],
        context: &mut Option<String>,
    ) -> bool {
        let lines: Vec<String> = positions
            .iter()
            .map(|&position| encode_line(&doc.entries()[position].original_text))
            .collect();
        let prompt = self
            .options
            .prompt_builder()
            .with_context(self.context_for_prompt(context))
            .build_batch(&lines);

        let response = match self.client.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Batch of {} entries failed: {}", positions.len(), e);
                for &position in positions {
                    doc.entries_mut()[position].mark_error();
                }
                return false;
            }
        };

        let output = parse_batch_response(&response);
        if output.len() != positions.len() {
            warn!(
                "Expected {} lines but received {}; alignment is positional",
                positions.len(),
                output.len()
            );
        }

        let mut accepted = Vec::new();
        let entries = doc.entries_mut();
        for (index, &position) in positions.iter().enumerate() {
            match output.get(index).and_then(|line| self.accept(&decode_line(line))) {
                Some(text) => {
                    accepted.push(text.clone());
                    entries[position].mark_translated(text);
                }
                None => entries[position].mark_error(),
            }
        }

        self.update_context(context, &accepted);
        true
    }

    /// Retry batch: id-tagged segments, matched back by id
    async fn run_retry_batch(
        &self,
        doc: &mut TranslationDocument,
        positions: &[usize],
        context: &mut Option<String>,
    ) -> bool {
        let ids: Vec<usize> = positions.iter().map(|&p| doc.entries()[p].id).collect();
        let prompt = {
            let segments: Vec<(usize, &str)> = positions
                .iter()
                .map(|&p| {
                    let entry = &doc.entries()[p];
                    (entry.id, entry.original_text.as_str())
                })
                .collect();
            self.options
                .prompt_builder()
                .with_context(self.context_for_prompt(context))
                .build_retry(&segments)
        };

        let response = match self.client.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Retry batch of {} entries failed: {}", positions.len(), e);
                return false;
            }
        };

        let answers = match_segments(&parse_segmented_response(&response), &ids);
        let mut accepted = Vec::new();
        let entries = doc.entries_mut();
        for &position in positions {
            let id = entries[position].id;
            match answers.get(&id).and_then(|text| self.accept(text)) {
                Some(text) => {
                    accepted.push(text.clone());
                    entries[position].mark_translated(text);
                }
                None => debug!("Entry {} still has no translation", id),
            }
        }

        self.update_context(context, &accepted);
        true
    }

    /// Improve batch: missing or empty refinements keep the current text
    async fn run_improve_batch(
        &self,
        doc: &mut TranslationDocument,
        positions: &[usize],
        context: &mut Option<String>,
    ) -> bool {
        let ids: Vec<usize> = positions.iter().map(|&p| doc.entries()[p].id).collect();
        let prompt = {
            let segments: Vec<(usize, &str, &str)> = positions
                .iter()
                .map(|&p| {
                    let entry = &doc.entries()[p];
                    (entry.id, entry.original_text.as_str(), entry.translated_text.as_str())
                })
                .collect();
            self.options
                .prompt_builder()
                .with_context(self.context_for_prompt(context))
                .build_improve(&segments)
        };

        let response = match self.client.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Improve batch of {} entries failed: {}", positions.len(), e);
                return false;
            }
        };

        let answers = match_segments(&parse_segmented_response(&response), &ids);
        let mut accepted = Vec::new();
        let entries = doc.entries_mut();
        for &position in positions {
            let id = entries[position].id;
            if let Some(text) = answers.get(&id).and_then(|text| self.accept(text)) {
                accepted.push(text.clone());
                entries[position].mark_translated(text);
            }
        }

        self.update_context(context, &accepted);
        true
    }

    /// Dictionary-processed line, or `None` when nothing usable remains
    fn accept(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let processed = self.dictionary.apply(line);
        let processed = processed.trim();
        (!processed.is_empty()).then(|| processed.to_string())
    }

    fn context_for_prompt<'a>(&self, context: &'a Option<String>) -> Option<&'a str> {
        if self.options.preserve_context {
            context.as_deref()
        } else {
            None
        }
    }

    fn update_context(&self, context: &mut Option<String>, accepted: &[String]) {
        if !self.options.preserve_context || accepted.is_empty() {
            return;
        }
        let combined = accepted.join("\n");
        *context = Some(tail_chars(&combined, self.options.context_chars).to_string());
    }
}

/// Map response segments to entry ids of the batch
///
/// Segments without an id take the id at their position in the batch.
/// Unknown ids are ignored and the first answer for an id wins.
fn match_segments(segments: &[ParsedSegment], batch_ids: &[usize]) -> HashMap<usize, String> {
    let mut answers = HashMap::new();
    for (index, segment) in segments.iter().enumerate() {
        let id = match segment.id.or_else(|| batch_ids.get(index).copied()) {
            Some(id) => id,
            None => continue,
        };
        if !batch_ids.contains(&id) {
            debug!("Ignoring segment for unknown entry {}", id);
            continue;
        }
        answers.entry(id).or_insert_with(|| segment.text.clone());
    }
    answers
}
