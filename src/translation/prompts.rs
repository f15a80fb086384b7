/*!
 * Prompt construction and response parsing for the batch pipeline.
 *
 * The main pass sends one source line per entry and reads one translated
 * line per entry back. Retry and improve passes send id-tagged segments
 * joined by a separator line, and match the answer back by id.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator placed between segments in retry and improve requests
pub const SEGMENT_SEPARATOR: &str = "|||";

/// Stand-in for a newline inside one main-pass line
pub const LINE_BREAK_TOKEN: &str = "<br>";

/// Header preceding the text payload in every prompt
pub const TEXT_HEADER: &str = "### TEXT";

/// Header preceding the context window of the previous batch
pub const CONTEXT_HEADER: &str = "### PREVIOUS CONTEXT (do not translate)";

static LINE_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*<br\s*/?>\s*").expect("line break pattern is valid")
});

static SEGMENT_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\[\[\s*ID\s*:\s*(\d+)\s*\]\]\s*").expect("segment id pattern is valid")
});

/// Identity tag prefixed to each retry/improve segment
pub fn segment_tag(id: usize) -> String {
    format!("[[ID:{}]]", id)
}

/// Flatten embedded newlines so that one entry occupies exactly one line
pub fn encode_line(text: &str) -> String {
    text.trim()
        .replace("\r\n", "\n")
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(&format!(" {} ", LINE_BREAK_TOKEN))
}

/// Restore newlines encoded by [`encode_line`]
pub fn decode_line(text: &str) -> String {
    LINE_BREAK_REGEX.replace_all(text.trim(), "\n").trim().to_string()
}

/// Split a main-pass response into candidate output lines
///
/// Empty lines and lines starting with `-` or `[` are treated as noise
/// (list markers, commentary) and dropped before positional alignment.
pub fn parse_batch_response(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('-') && !line.starts_with('['))
        .map(str::to_string)
        .collect()
}

/// One segment of a retry/improve response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSegment {
    /// Identity key found in the segment, if any
    pub id: Option<usize>,
    pub text: String,
}

/// Split a separator-joined response into segments
///
/// Whitespace-only segments are skipped, so a trailing separator does not
/// shift the position of the following segments.
pub fn parse_segmented_response(response: &str) -> Vec<ParsedSegment> {
    response
        .split(SEGMENT_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match SEGMENT_ID_REGEX.captures(segment) {
            Some(caps) => {
                let id = caps.get(1).and_then(|m| m.as_str().parse().ok());
                let body_start = caps.get(0).map_or(0, |m| m.end());
                ParsedSegment {
                    id,
                    text: segment[body_start..].trim().to_string(),
                }
            }
            None => ParsedSegment {
                id: None,
                text: segment.to_string(),
            },
        })
        .collect()
}

/// Text following the payload header of a prompt
pub fn payload_of(prompt: &str) -> &str {
    let marker = format!("{}\n", TEXT_HEADER);
    match prompt.rfind(&marker) {
        Some(index) => &prompt[index + marker.len()..],
        None => prompt,
    }
}

/// Last `count` characters of `text`
pub fn tail_chars(text: &str, count: usize) -> &str {
    let total = text.chars().count();
    if total <= count {
        return text;
    }
    match text.char_indices().nth(total - count) {
        Some((index, _)) => &text[index..],
        None => text,
    }
}

/// Builds the prompts sent by each pass
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    source_language: Option<String>,
    target_language: String,
    tone: Option<String>,
    style: Option<String>,
    context: Option<String>,
}

impl TranslationPromptBuilder {
    pub fn new(target_language: &str) -> Self {
        Self {
            source_language: None,
            target_language: target_language.to_string(),
            tone: None,
            style: None,
            context: None,
        }
    }

    pub fn with_source_language(mut self, source_language: Option<&str>) -> Self {
        self.source_language = source_language.map(str::to_string);
        self
    }

    pub fn with_tone(mut self, tone: Option<&str>) -> Self {
        self.tone = tone.map(str::to_string);
        self
    }

    pub fn with_style(mut self, style: Option<&str>) -> Self {
        self.style = style.map(str::to_string);
        self
    }

    /// Trailing output of the previous batch; blank context is ignored
    pub fn with_context(mut self, context: Option<&str>) -> Self {
        self.context = context
            .map(str::trim)
            .filter(|context| !context.is_empty())
            .map(str::to_string);
        self
    }

    fn preamble(&self, task: &str) -> String {
        let mut prompt = match &self.source_language {
            Some(source) => format!(
                "You are a professional translator. {} from {} into {}.\n",
                task, source, self.target_language
            ),
            None => format!(
                "You are a professional translator. {} into {}.\n",
                task, self.target_language
            ),
        };

        if let Some(tone) = &self.tone {
            prompt.push_str(&format!("Use a {} tone.\n", tone));
        }
        if let Some(style) = &self.style {
            prompt.push_str(&format!("Style: {}\n", style));
        }
        prompt.push_str("Do not add explanations, notes or numbering.\n");
        prompt
    }

    fn finish(&self, mut prompt: String, payload: &str) -> String {
        if let Some(context) = &self.context {
            prompt.push('\n');
            prompt.push_str(CONTEXT_HEADER);
            prompt.push('\n');
            prompt.push_str(context);
            prompt.push('\n');
        }
        prompt.push('\n');
        prompt.push_str(TEXT_HEADER);
        prompt.push('\n');
        prompt.push_str(payload);
        prompt
    }

    /// Main pass: one already encoded line per entry
    pub fn build_batch(&self, lines: &[String]) -> String {
        let mut prompt = self.preamble("Translate each line of the text below");
        prompt.push_str(&format!(
            "Return exactly {} lines, one translation per input line, in the same order. \
             Keep the {} markers where they appear.\n",
            lines.len(),
            LINE_BREAK_TOKEN
        ));
        self.finish(prompt, &lines.join("\n"))
    }

    /// Retry pass: id-tagged segments joined by the separator
    pub fn build_retry(&self, segments: &[(usize, &str)]) -> String {
        let mut prompt = self.preamble("Translate each segment of the text below");
        prompt.push_str(&format!(
            "Segments are separated by a line containing only {sep}. Each segment starts \
             with an identifier like {tag}. Answer with the same identifier followed by the \
             translation, and separate your segments with {sep}.\n",
            sep = SEGMENT_SEPARATOR,
            tag = segment_tag(1)
        ));

        let payload = segments
            .iter()
            .map(|(id, text)| format!("{} {}", segment_tag(*id), text.trim()))
            .collect::<Vec<_>>()
            .join(&format!("\n{}\n", SEGMENT_SEPARATOR));
        self.finish(prompt, &payload)
    }

    /// Improve pass: id-tagged original and current translation per segment
    pub fn build_improve(&self, segments: &[(usize, &str, &str)]) -> String {
        let mut prompt = self.preamble("Improve the existing translations below");
        prompt.push_str(&format!(
            "Each segment gives the ORIGINAL text and the CURRENT translation. Make the \
             translation more accurate and natural without changing its meaning. Answer \
             with the segment identifier followed by the improved translation only, and \
             separate your segments with {}.\n",
            SEGMENT_SEPARATOR
        ));

        let payload = segments
            .iter()
            .map(|(id, original, current)| {
                format!(
                    "{}\nORIGINAL: {}\nCURRENT: {}",
                    segment_tag(*id),
                    original.trim(),
                    current.trim()
                )
            })
            .collect::<Vec<_>>()
            .join(&format!("\n{}\n", SEGMENT_SEPARATOR));
        self.finish(prompt, &payload)
    }
}
