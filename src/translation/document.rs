/*!
 * Document model for the batch translation pipeline.
 *
 * A `TranslationDocument` owns the ordered entries of one source file. The
 * number of entries is fixed at construction; passes only mutate the
 * translated text and status of existing entries.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::subtitle_processor::SubtitleEntry;
use super::segmenter::is_wide_char;

/// Translation outcome of a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Not yet covered by any batch
    #[default]
    Pending,
    /// A non-empty translation was accepted
    Translated,
    /// The covering batch failed or returned no line for this entry
    Error,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Translated => "translated",
            EntryStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Start/end timecodes of a subtitle cue in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_ms: u64,
    pub end_ms: u64,
}

/// One translatable unit: a subtitle cue or a plain-text chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable identifier (cue number or 1-based chunk index)
    pub id: usize,

    /// Timecodes for subtitle entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<SourceSpan>,

    /// Source paragraph index for plain-text chunks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<usize>,

    /// Source text, never modified after segmentation
    pub original_text: String,

    /// Latest accepted translation (empty until translated)
    #[serde(default)]
    pub translated_text: String,

    #[serde(default)]
    pub status: EntryStatus,
}

impl Entry {
    /// Entry backed by a subtitle cue
    pub fn from_subtitle(cue: &SubtitleEntry) -> Self {
        Self {
            id: cue.seq_num,
            span: Some(SourceSpan {
                start_ms: cue.start_time_ms,
                end_ms: cue.end_time_ms,
            }),
            paragraph: None,
            original_text: cue.text.clone(),
            translated_text: String::new(),
            status: EntryStatus::Pending,
        }
    }

    /// Entry holding one chunk of a plain-text paragraph
    pub fn from_text(id: usize, paragraph: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            span: None,
            paragraph: Some(paragraph),
            original_text: text.into(),
            translated_text: String::new(),
            status: EntryStatus::Pending,
        }
    }

    pub(crate) fn mark_translated(&mut self, text: String) {
        self.translated_text = text;
        self.status = EntryStatus::Translated;
    }

    pub(crate) fn mark_error(&mut self) {
        self.status = EntryStatus::Error;
    }

    /// Text written to the output: the translation when accepted, else the source
    pub fn output_text(&self) -> &str {
        if self.status == EntryStatus::Translated && !self.translated_text.is_empty() {
            &self.translated_text
        } else {
            &self.original_text
        }
    }
}

/// Aggregate status counts, recomputed from the entries on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub translated: usize,
    pub error: usize,
    pub pending: usize,
}

impl StatusCounts {
    /// Count statuses across a set of entries
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        entries.into_iter().fold(Self::default(), |mut counts, entry| {
            match entry.status {
                EntryStatus::Translated => counts.translated += 1,
                EntryStatus::Error => counts.error += 1,
                EntryStatus::Pending => counts.pending += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.translated + self.error + self.pending
    }

    /// True when every entry is translated
    pub fn is_complete(&self) -> bool {
        self.error == 0 && self.pending == 0
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} translated, {} error, {} pending",
            self.translated, self.error, self.pending
        )
    }
}

/// Structural format of the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Subtitle,
    PlainText,
}

/// Ordered entries of one document for the duration of a session
#[derive(Debug, Clone, Serialize)]
pub struct TranslationDocument {
    kind: DocumentKind,
    entries: Vec<Entry>,
}

impl TranslationDocument {
    /// Wrap segmented entries; the entry count is fixed from here on
    pub fn new(kind: DocumentKind, entries: Vec<Entry>) -> Self {
        Self { kind, entries }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Mutable view that cannot add or remove entries
    pub(crate) fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub(crate) fn position_of(&self, id: usize) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Positions of all entries currently in `status`, in document order
    pub fn positions_with_status(&self, status: EntryStatus) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.status == status)
            .map(|(position, _)| position)
            .collect()
    }

    pub fn status_counts(&self) -> StatusCounts {
        StatusCounts::from_entries(&self.entries)
    }

    /// Subtitle cues carrying the output text of each entry
    pub fn to_subtitle_entries(&self) -> Vec<SubtitleEntry> {
        self.entries
            .iter()
            .map(|entry| {
                let span = entry.span.unwrap_or(SourceSpan { start_ms: 0, end_ms: 0 });
                SubtitleEntry::new(entry.id, span.start_ms, span.end_ms, entry.output_text().to_string())
            })
            .collect()
    }

    /// Plain text with chunks of one paragraph re-joined and paragraphs separated by blank lines
    pub fn to_plain_text(&self) -> String {
        let mut paragraphs: Vec<String> = Vec::new();
        let mut current_paragraph: Option<usize> = None;

        for entry in &self.entries {
            let text = entry.output_text().trim();
            match (current_paragraph, entry.paragraph) {
                (Some(current), Some(next)) if current == next => {
                    if let Some(last) = paragraphs.last_mut() {
                        // CJK sentences are not separated by spaces
                        if !last.ends_with(is_wide_char) {
                            last.push(' ');
                        }
                        last.push_str(text);
                    }
                }
                _ => paragraphs.push(text.to_string()),
            }
            current_paragraph = entry.paragraph;
        }

        let mut output = paragraphs.join("\n\n");
        if !output.is_empty() {
            output.push('\n');
        }
        output
    }
}
