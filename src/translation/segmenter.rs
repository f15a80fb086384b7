/*!
 * Document segmentation.
 *
 * Subtitle files become one entry per cue. Plain text becomes one entry per
 * paragraph; a paragraph longer than the chunk limit is split at sentence
 * boundaries and the sentences are packed greedily into chunks.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::subtitle_processor::SubtitleEntry;
use super::document::{DocumentKind, Entry, TranslationDocument};

/// Weight of a wide (CJK) character in effective length
pub const WIDE_CHAR_WEIGHT: usize = 4;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r?\n[ \t]*\r?\n\s*").expect("paragraph pattern is valid")
});

/// Whether a character occupies a full-width cell (CJK, kana, hangul, full-width forms)
pub fn is_wide_char(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x115F
            | 0x2E80..=0x303F
            | 0x3040..=0x30FF
            | 0x3100..=0x31FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA960..=0xA97F
            | 0xAC00..=0xD7AF
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFFEF
            | 0x20000..=0x2FA1F
    )
}

/// Length in units where a wide character counts four times
pub fn effective_length(text: &str) -> usize {
    text.chars()
        .map(|c| if is_wide_char(c) { WIDE_CHAR_WEIGHT } else { 1 })
        .sum()
}

fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…' | '。' | '！' | '？')
}

/// Split text into sentences, each keeping its terminator and trailing whitespace
///
/// Latin terminators end a sentence only when followed by whitespace or the
/// end of text; CJK terminators end it immediately.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if !is_sentence_terminator(c) {
            continue;
        }

        // Absorb runs like "?!" or "..."
        let mut end = index + c.len_utf8();
        while let Some(&(next_index, next)) = chars.peek() {
            if is_sentence_terminator(next) || matches!(next, '"' | '\'' | '”' | '’' | ')' | '」' | '』') {
                end = next_index + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let boundary = match chars.peek() {
            None => true,
            Some(&(_, next)) => next.is_whitespace() || is_wide_char(c),
        };
        if !boundary {
            continue;
        }

        while let Some(&(next_index, next)) = chars.peek() {
            if next.is_whitespace() {
                end = next_index + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        sentences.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

/// Greedily pack sentences into chunks whose trimmed effective length stays within `max_len`
///
/// A sentence that alone exceeds the limit becomes its own chunk.
pub fn pack_sentences(sentences: &[&str], max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        let candidate_len = effective_length(format!("{}{}", current, sentence).trim());
        if !current.trim().is_empty() && candidate_len > max_len {
            chunks.push(current.trim().to_string());
            current.clear();
        }
        current.push_str(sentence);
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}

/// Splits source documents into translation entries
#[derive(Debug, Clone)]
pub struct Segmenter {
    max_chunk_length: usize,
}

impl Segmenter {
    pub fn new(max_chunk_length: usize) -> Self {
        Self {
            max_chunk_length: max_chunk_length.max(1),
        }
    }

    pub fn max_chunk_length(&self) -> usize {
        self.max_chunk_length
    }

    /// Whether `text` is longer than one chunk may be
    pub fn exceeds_limit(&self, text: &str) -> bool {
        effective_length(text) > self.max_chunk_length
    }

    /// One entry per cue; cues are never split so the structure round-trips
    ///
    /// A cue longer than the chunk limit is kept whole and reported with `warn!`.
    pub fn segment_subtitles(&self, cues: &[SubtitleEntry]) -> TranslationDocument {
        for cue in cues.iter().filter(|cue| self.exceeds_limit(&cue.text)) {
            warn!(
                "Cue {} has effective length {} above the chunk limit {}; it is sent whole",
                cue.seq_num,
                effective_length(&cue.text),
                self.max_chunk_length
            );
        }
        let entries = cues.iter().map(Entry::from_subtitle).collect();
        TranslationDocument::new(DocumentKind::Subtitle, entries)
    }

    /// Paragraph entries, oversized paragraphs split into sentence chunks
    pub fn segment_text(&self, text: &str) -> TranslationDocument {
        let mut entries = Vec::new();

        let paragraphs = PARAGRAPH_BREAK
            .split(text.trim_start_matches('\u{feff}'))
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty());

        for (paragraph_index, paragraph) in paragraphs.enumerate() {
            if !self.exceeds_limit(paragraph) {
                entries.push(Entry::from_text(entries.len() + 1, paragraph_index, paragraph));
                continue;
            }

            let sentences = split_sentences(paragraph);
            let chunks = pack_sentences(&sentences, self.max_chunk_length);
            debug!(
                "Paragraph {} split into {} chunks ({} sentences)",
                paragraph_index + 1,
                chunks.len(),
                sentences.len()
            );
            for chunk in chunks {
                entries.push(Entry::from_text(entries.len() + 1, paragraph_index, chunk));
            }
        }

        TranslationDocument::new(DocumentKind::PlainText, entries)
    }
}
