use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context};
use log::{warn, debug};

use crate::errors::SubtitleError;

// @module: SubRip parsing and serialization

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{1,2}:\d{2}:\d{2}[,.]\d{3})")
        .expect("timestamp pattern is valid")
});

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, SubtitleError> {
        let invalid = || SubtitleError::InvalidTimestamp(timestamp.to_string());
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(invalid());
        }

        let mut values = [0u64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part.parse().map_err(|_| invalid())?;
        }
        let [hours, minutes, seconds, millis] = values;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(invalid());
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Collection of subtitle cues read from or written to one file
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Create a collection from already parsed cues
    pub fn new(source_file: PathBuf, entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection {
            source_file,
            entries,
        }
    }

    /// Read and parse an SRT file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        let entries = Self::parse_srt_string(&content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))?;

        Ok(Self::new(path.to_path_buf(), entries))
    }

    /// Render all cues in SRT format
    pub fn to_srt_string(&self) -> String {
        self.entries.iter().map(|entry| entry.to_string()).collect()
    }

    /// Parse SRT format string into subtitle entries
    ///
    /// Cues are sorted by start time and renumbered from 1 so that ids stay
    /// stable for the rest of the session.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let mut entries = Vec::new();

        // State variables for parsing
        let mut current_seq_num: Option<usize> = None;
        let mut current_times: Option<(u64, u64)> = None;
        let mut current_text = String::new();

        let mut finish_entry = |seq_num: Option<usize>, times: Option<(u64, u64)>, text: &mut String| {
            if let (Some(seq_num), Some((start_ms, end_ms))) = (seq_num, times) {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    warn!("Skipping empty subtitle entry {}", seq_num);
                } else if end_ms < start_ms {
                    warn!("Skipping subtitle entry {} with inverted time range", seq_num);
                } else {
                    entries.push(SubtitleEntry::new(seq_num, start_ms, end_ms, trimmed.to_string()));
                }
            }
            text.clear();
        };

        // Set after a cue with a bad time range, until the next blank line
        let mut skipping_cue = false;

        for (line_index, line) in content.trim_start_matches('\u{feff}').lines().enumerate() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                // A blank line always closes the cue, even one without text
                if current_times.is_some() {
                    finish_entry(current_seq_num.take(), current_times.take(), &mut current_text);
                }
                skipping_cue = false;
                continue;
            }

            if skipping_cue {
                continue;
            }

            // Sequence number starts a new cue
            if current_times.is_none() && current_text.is_empty() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_seq_num = Some(num);
                    continue;
                }
            }

            if current_seq_num.is_some() && current_times.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    match Self::parse_time_range(&caps) {
                        Ok(times) => current_times = Some(times),
                        Err(e) => {
                            warn!("Skipping subtitle entry at line {}: {}", line_index + 1, e);
                            current_seq_num = None;
                            skipping_cue = true;
                        }
                    }
                    continue;
                }
            }

            if current_times.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            } else {
                warn!("Unexpected text at line {} before sequence number or timestamp: {}", line_index + 1, trimmed);
            }
        }

        finish_entry(current_seq_num.take(), current_times.take(), &mut current_text);

        if entries.is_empty() {
            return Err(SubtitleError::NoEntries);
        }

        entries.sort_by_key(|entry| entry.start_time_ms);
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }

        debug!("Parsed {} subtitle entries", entries.len());
        Ok(entries)
    }

    fn parse_time_range(caps: &regex::Captures) -> Result<(u64, u64), SubtitleError> {
        let field = |index: usize| caps.get(index).map_or("", |m| m.as_str());
        Ok((
            SubtitleEntry::parse_timestamp(field(1))?,
            SubtitleEntry::parse_timestamp(field(2))?,
        ))
    }
}
