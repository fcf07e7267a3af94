//! Transcript lookup and keyword search.
//!
//! A transcript is a list of timed snippets. Searching keeps the snippets that
//! contain a word, widens each hit by a few neighbouring rows and renders the
//! result as `HH:MM:SS text` lines.

mod provider;

pub use provider::{parse_json3, TranscriptProvider, YtDlpTranscriptProvider};

use crate::timefmt::format_clock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Separator between non-adjacent groups of rows.
const GAP_MARKER: &str = "...";

/// One timed line of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSnippet {
    pub start_seconds: f64,
    pub text: String,
}

impl TranscriptSnippet {
    pub fn new(start_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            text: text.into(),
        }
    }
}

/// Outcome of a transcript search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Rendered text of the matching rows.
    Found(String),
    NothingFound,
}

/// Indices of snippets containing `word`, case-insensitively.
pub fn discover(snippets: &[TranscriptSnippet], word: &str) -> BTreeSet<usize> {
    let needle = word.trim().to_lowercase();
    if needle.is_empty() {
        return BTreeSet::new();
    }

    snippets
        .iter()
        .enumerate()
        .filter(|(_, s)| s.text.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect()
}

/// Add `context_rows` neighbours on each side of every index, within `[0, len)`.
pub fn extend(indices: &BTreeSet<usize>, len: usize, context_rows: usize) -> BTreeSet<usize> {
    indices
        .iter()
        .flat_map(|&i| i.saturating_sub(context_rows)..=(i + context_rows).min(len.saturating_sub(1)))
        .filter(|&i| i < len)
        .collect()
}

/// Render the selected rows, with a gap marker between non-adjacent runs.
pub fn render(snippets: &[TranscriptSnippet], indices: &BTreeSet<usize>) -> String {
    let mut out = String::new();
    let mut last: Option<usize> = None;

    for &i in indices {
        let Some(snippet) = snippets.get(i) else {
            continue;
        };
        if last.is_some_and(|prev| i - prev > 1) {
            out.push_str(GAP_MARKER);
            out.push('\n');
        }
        let start = if snippet.start_seconds > 0.0 {
            snippet.start_seconds.floor() as u64
        } else {
            0
        };
        out.push_str(&format!("{} {}\n", format_clock(start), snippet.text.trim()));
        last = Some(i);
    }

    out
}

/// Render the whole transcript.
pub fn render_all(snippets: &[TranscriptSnippet]) -> String {
    let all: BTreeSet<usize> = (0..snippets.len()).collect();
    render(snippets, &all)
}

/// Wrap every case-insensitive occurrence of `word` in `<b>..</b>`.
pub fn highlight(text: &str, word: &str) -> String {
    let word = word.trim();
    if word.is_empty() {
        return text.to_string();
    }
    match Regex::new(&format!("(?i){}", regex::escape(word))) {
        Ok(re) => re.replace_all(text, "<b>$0</b>").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Search a transcript for `word` and render the hits with context.
pub fn search(snippets: &[TranscriptSnippet], word: &str, context_rows: usize) -> SearchOutcome {
    let hits = discover(snippets, word);
    if hits.is_empty() {
        return SearchOutcome::NothingFound;
    }
    let rows = extend(&hits, snippets.len(), context_rows);
    SearchOutcome::Found(highlight(&render(snippets, &rows), word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript() -> Vec<TranscriptSnippet> {
        vec![
            TranscriptSnippet::new(0.0, "welcome to the show"),
            TranscriptSnippet::new(4.2, "today we talk about Rust"),
            TranscriptSnippet::new(9.0, "and memory safety"),
            TranscriptSnippet::new(15.5, "then lunch"),
            TranscriptSnippet::new(21.0, "more lunch"),
            TranscriptSnippet::new(3725.0, "RUST again at the end"),
        ]
    }

    #[test]
    fn test_discover_case_insensitive() {
        let hits = discover(&transcript(), "rust");
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![1, 5]);
        assert!(discover(&transcript(), "  ").is_empty());
    }

    #[test]
    fn test_extend_clamps() {
        let hits: BTreeSet<usize> = [0, 5].into_iter().collect();
        let rows = extend(&hits, 6, 1);
        assert_eq!(rows.into_iter().collect::<Vec<_>>(), vec![0, 1, 4, 5]);
    }

    #[test]
    fn test_render_with_gaps() {
        let rows: BTreeSet<usize> = [0, 1, 5].into_iter().collect();
        assert_eq!(
            render(&transcript(), &rows),
            "00:00:00 welcome to the show\n00:00:04 today we talk about Rust\n...\n01:02:05 RUST again at the end\n"
        );
    }

    #[test]
    fn test_highlight_keeps_original_case() {
        assert_eq!(highlight("Rust and RUST", "rust"), "<b>Rust</b> and <b>RUST</b>");
        assert_eq!(highlight("a+b", "a+b"), "<b>a+b</b>");
    }

    #[test]
    fn test_search() {
        match search(&transcript(), "memory", 1) {
            SearchOutcome::Found(text) => {
                assert_eq!(
                    text,
                    "00:00:04 today we talk about Rust\n00:00:09 and <b>memory</b> safety\n00:00:15 then lunch\n"
                );
            }
            SearchOutcome::NothingFound => panic!("expected hits"),
        }
        assert_eq!(search(&transcript(), "python", 1), SearchOutcome::NothingFound);
    }

    #[test]
    fn test_render_all() {
        let text = render_all(&transcript());
        assert_eq!(text.lines().count(), 6);
        assert!(!text.contains(GAP_MARKER));
    }
}
