//! Overlapping, sentence-aware text windows

use regex::Regex;
use std::sync::OnceLock;

/// Fraction of the window after which a sentence break is preferred
const SENTENCE_CUT_RATIO: f64 = 0.6;

fn blank_lines_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid blank line regex"))
}

/// Window sizes for [`chunk_text`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingOptions {
    pub max_chars: usize,
    pub overlap: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            max_chars: 900,
            overlap: 200,
        }
    }
}

/// Splits text into windows of at most `max_chars` characters
///
/// A window is shortened to end on the last `.` when that lies past 60% of
/// the window. Consecutive windows share `overlap` characters and the window
/// that reaches the end of the text is the last one.
pub fn chunk_text(text: &str, options: ChunkingOptions) -> Vec<String> {
    let normalized = blank_lines_regex().replace_all(text, "\n\n");
    let chars: Vec<char> = normalized.trim().chars().collect();
    let max_chars = options.max_chars.max(1);
    let cut_after = (max_chars as f64 * SENTENCE_CUT_RATIO) as usize;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + max_chars).min(chars.len());
        let mut window = &chars[start..end];

        if let Some(cut) = window.iter().rposition(|&c| c == '.') {
            if cut > cut_after {
                window = &window[..=cut];
            }
        }

        let chunk: String = window.iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if start + window.len() >= chars.len() {
            break;
        }
        start += window.len().saturating_sub(options.overlap).max(1);
    }

    chunks
}
