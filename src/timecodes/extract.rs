//! Scraping timecodes out of free-text video descriptions.

use super::{merge_timecodes, Chapter, TimecodeEntry};
use crate::text::{clean_title, DEFAULT_UPPERCASE_RATIO};
use crate::timefmt::parse_clock;
use regex::Regex;
use tracing::debug;

/// A paragraph needs more than this many clock-like tokens to count as a timecode block.
pub const DEFAULT_PARAGRAPH_THRESHOLD: usize = 3;

/// Extracts ordered timecodes from descriptions and chapter lists.
pub struct TimecodeExtractor {
    clock_regex: Regex,
    line_regex: Regex,
    paragraph_regex: Regex,
    paragraph_threshold: usize,
    uppercase_ratio: f64,
}

impl TimecodeExtractor {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_PARAGRAPH_THRESHOLD, DEFAULT_UPPERCASE_RATIO)
    }

    pub fn with_config(paragraph_threshold: usize, uppercase_ratio: f64) -> Self {
        let clock_regex = Regex::new(r"[0-9]{1,2}:[0-9]{2}").expect("Invalid regex");
        // Leading time token, whitespace, then the rest of the line as the title
        let line_regex = Regex::new(r"([0-9]*:?[0-9]+:[0-9]+)[ \t]+(.+)").expect("Invalid regex");
        let paragraph_regex = Regex::new(r"\r?\n[ \t]*\r?\n").expect("Invalid regex");

        Self {
            clock_regex,
            line_regex,
            paragraph_regex,
            paragraph_threshold,
            uppercase_ratio,
        }
    }

    /// Find the first paragraph that looks like a list of timecodes.
    pub fn find_timecode_block<'a>(&self, description: &'a str) -> Option<&'a str> {
        self.paragraph_regex
            .split(description)
            .find(|paragraph| self.clock_regex.find_iter(paragraph).count() > self.paragraph_threshold)
    }

    /// Parse every `<time> <title>` line of a block.
    ///
    /// Lines whose time token cannot be parsed are skipped.
    pub fn parse_block(&self, block: &str) -> Vec<TimecodeEntry> {
        let mut entries = Vec::new();

        for line in block.lines() {
            let Some(caps) = self.line_regex.captures(line) else {
                continue;
            };

            let token = &caps[1];
            match parse_clock(token) {
                Ok(offset_seconds) => entries.push(TimecodeEntry {
                    offset_seconds,
                    title: clean_title(&caps[2], self.uppercase_ratio),
                }),
                Err(e) => debug!("Skipping timecode line {:?}: {}", line, e),
            }
        }

        entries.sort_by_key(|e| e.offset_seconds);
        entries
    }

    /// Extract timecodes scraped from the description text alone.
    pub fn extract_from_description(&self, description: Option<&str>) -> Vec<TimecodeEntry> {
        description
            .and_then(|text| self.find_timecode_block(text))
            .map(|block| self.parse_block(block))
            .unwrap_or_default()
    }

    /// Extract timecodes from the description, then overlay structured chapters.
    pub fn extract(&self, description: Option<&str>, chapters: &[Chapter]) -> Vec<TimecodeEntry> {
        let scraped = self.extract_from_description(description);
        debug!("Scraped {} timecodes, {} chapters", scraped.len(), chapters.len());
        merge_timecodes(scraped, chapters)
    }
}

impl Default for TimecodeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str = "Talk about Rust ownership.\n\
        Follow us at 12:00 daily.\n\
        \n\
        0:00 Intro\n\
        2:05 WHAT IS OWNERSHIP\n\
        10:30 - borrowing rules\n\
        1:02:05 — Lifetimes\n\
        \n\
        Links:\n\
        1:00 2:00 3:00 4:00 5:00 should be ignored";

    #[test]
    fn test_selects_first_qualifying_paragraph() {
        let extractor = TimecodeExtractor::new();
        let block = extractor.find_timecode_block(DESCRIPTION).unwrap();
        assert!(block.starts_with("0:00 Intro"));
        assert!(!block.contains("should be ignored"));
    }

    #[test]
    fn test_parses_offsets_and_titles() {
        let extractor = TimecodeExtractor::new();
        let entries = extractor.extract_from_description(Some(DESCRIPTION));

        assert_eq!(
            entries,
            vec![
                TimecodeEntry::new(0, "Intro"),
                TimecodeEntry::new(125, "What is ownership"),
                TimecodeEntry::new(630, "Borrowing rules"),
                TimecodeEntry::new(3725, "Lifetimes"),
            ]
        );
    }

    #[test]
    fn test_threshold_not_met() {
        let extractor = TimecodeExtractor::new();
        let text = "0:00 Intro\n1:00 Middle\n2:00 End";
        assert!(extractor.extract_from_description(Some(text)).is_empty());
        assert!(extractor.extract_from_description(None).is_empty());
        assert!(extractor.extract_from_description(Some("")).is_empty());
    }

    #[test]
    fn test_unparseable_lines_skipped() {
        let extractor = TimecodeExtractor::new();
        let text = "0:00 Intro\n75:99 Broken\n1:00 One\n2:00 Two\n3:00 Three";
        let entries = extractor.extract_from_description(Some(text));
        let offsets: Vec<u64> = entries.iter().map(|e| e.offset_seconds).collect();
        assert_eq!(offsets, vec![0, 60, 120, 180]);
    }

    #[test]
    fn test_crlf_paragraphs() {
        let extractor = TimecodeExtractor::new();
        let text = "Header\r\n\r\n0:00 A\r\n1:00 B\r\n2:00 C\r\n3:00 D";
        let entries = extractor.extract_from_description(Some(text));
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[3].title, "D");
    }

    #[test]
    fn test_extract_with_chapters() {
        let extractor = TimecodeExtractor::new();
        let chapters = vec![Chapter::new(125.0, "Ownership (chapter)")];
        let entries = extractor.extract(Some(DESCRIPTION), &chapters);

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1].title, "Ownership (chapter)");
    }
}
