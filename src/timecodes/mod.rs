//! Timecodes: named points in a video, scraped from descriptions or chapters.

mod extract;

pub use extract::{TimecodeExtractor, DEFAULT_PARAGRAPH_THRESHOLD};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named offset in the source audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimecodeEntry {
    /// Offset from the start of the audio, in seconds.
    pub offset_seconds: u64,
    /// Free-text title, possibly empty.
    pub title: String,
}

impl TimecodeEntry {
    pub fn new(offset_seconds: u64, title: impl Into<String>) -> Self {
        Self {
            offset_seconds,
            title: title.into(),
        }
    }
}

/// A structured chapter as reported by yt-dlp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(rename = "start_time", alias = "start_seconds")]
    pub start_seconds: f64,
    #[serde(default)]
    pub title: String,
}

impl Chapter {
    pub fn new(start_seconds: f64, title: impl Into<String>) -> Self {
        Self {
            start_seconds,
            title: title.into(),
        }
    }

    /// Start offset clamped to zero and truncated to whole seconds.
    pub fn offset_seconds(&self) -> u64 {
        if self.start_seconds.is_finite() && self.start_seconds > 0.0 {
            self.start_seconds.floor() as u64
        } else {
            0
        }
    }
}

/// Merge scraped timecodes with chapters into one ordered list.
///
/// Chapters win over scraped entries at the same offset. The result is sorted
/// by offset with at most one entry per offset.
pub fn merge_timecodes(scraped: Vec<TimecodeEntry>, chapters: &[Chapter]) -> Vec<TimecodeEntry> {
    let mut by_offset: BTreeMap<u64, String> = BTreeMap::new();

    for entry in scraped {
        by_offset.entry(entry.offset_seconds).or_insert(entry.title);
    }

    for chapter in chapters {
        by_offset.insert(chapter.offset_seconds(), chapter.title.trim().to_string());
    }

    by_offset
        .into_iter()
        .map(|(offset_seconds, title)| TimecodeEntry { offset_seconds, title })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapters_override_scraped() {
        let scraped = vec![
            TimecodeEntry::new(0, "Intro"),
            TimecodeEntry::new(60, "Scraped"),
            TimecodeEntry::new(120, "Outro"),
        ];
        let chapters = vec![Chapter::new(60.0, " Chapter one ")];

        let merged = merge_timecodes(scraped, &chapters);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1], TimecodeEntry::new(60, "Chapter one"));
    }

    #[test]
    fn test_chapters_normalized() {
        let chapters = vec![
            Chapter::new(300.7, "Late"),
            Chapter::new(-5.0, "Negative"),
            Chapter::new(100.0, "Middle"),
        ];

        let merged = merge_timecodes(Vec::new(), &chapters);
        let offsets: Vec<u64> = merged.iter().map(|e| e.offset_seconds).collect();
        assert_eq!(offsets, vec![0, 100, 300]);
        assert_eq!(merged[0].title, "Negative");
    }

    #[test]
    fn test_chapter_deserialize() {
        let json = r#"{"start_time": 12.5, "end_time": 30.0, "title": "Part"}"#;
        let chapter: Chapter = serde_json::from_str(json).unwrap();
        assert_eq!(chapter.offset_seconds(), 12);
        assert_eq!(chapter.title, "Part");
    }
}
