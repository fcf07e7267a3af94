//! Segmentation of a source audio track into size- and caption-bounded parts.
//!
//! A [`Scheme`] is a pure plan: an ordered, contiguous list of [`Segment`]s
//! covering `[0, total_duration]`. The planner builds it from the duration and
//! configuration; the rebalancer optionally splits segments whose timecode
//! block would not fit in a caption.

mod planner;
mod rebalance;

pub use planner::{
    apply_padding, enforce_max_duration, max_segment_duration, merge_short_tail, plan,
    split_by_duration, split_by_timecodes, verify,
};
pub use rebalance::{rebalance, RebalanceConfig};

use serde::{Deserialize, Serialize};

/// A contiguous time range of the source audio exported as one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Logical start, used for caption timecode math.
    pub start_seconds: u64,
    /// Logical end (exclusive).
    pub end_seconds: u64,
    /// Chapter label when the segment was cut by timecodes.
    pub title: String,
    /// Start used for physical extraction (start minus padding, clamped to 0).
    pub padded_start: u64,
    /// End used for physical extraction (end plus padding, clamped to the total).
    pub padded_end: u64,
}

impl Segment {
    pub fn new(start_seconds: u64, end_seconds: u64) -> Self {
        Self {
            start_seconds,
            end_seconds,
            title: String::new(),
            padded_start: start_seconds,
            padded_end: end_seconds,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Logical play length in seconds.
    pub fn duration(&self) -> u64 {
        self.end_seconds.saturating_sub(self.start_seconds)
    }

    /// Length of the padded extraction window in seconds.
    pub fn padded_duration(&self) -> u64 {
        self.padded_end.saturating_sub(self.padded_start)
    }

    /// Whether an offset falls inside the logical range `[start, end)`.
    pub fn contains(&self, offset_seconds: u64) -> bool {
        self.start_seconds <= offset_seconds && offset_seconds < self.end_seconds
    }
}

/// When a short trailing segment may be folded into its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailPolicy {
    /// A last segment shorter than this is merged into the previous one.
    pub threshold_seconds: u64,
    /// Merges that would produce a segment longer than this are refused.
    pub max_duration_seconds: Option<u64>,
}

impl TailPolicy {
    /// A policy that never merges.
    pub fn never() -> Self {
        Self {
            threshold_seconds: 0,
            max_duration_seconds: None,
        }
    }
}

/// How the planner chooses segment boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum SplitMode {
    /// Split long audio into fixed-length parts.
    #[default]
    Default,
    /// Split into parts of a caller-chosen length.
    Duration { minutes: u64 },
    /// One part per timecode.
    Timecodes,
}

impl std::fmt::Display for SplitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitMode::Default => write!(f, "default"),
            SplitMode::Duration { minutes } => write!(f, "duration ({} min)", minutes),
            SplitMode::Timecodes => write!(f, "timecodes"),
        }
    }
}

/// Planner configuration for one request.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Target part length in default mode.
    pub target_segment_seconds: u64,
    /// Tail merge threshold in default mode.
    pub short_tail_threshold_seconds: u64,
    /// Tail merge threshold in explicit-duration mode.
    pub duration_mode_tail_threshold_seconds: u64,
    /// In default mode, audio no longer than this stays in one part.
    pub split_threshold_seconds: u64,
    pub split_mode: SplitMode,
    /// Padding added on each side of a segment for extraction.
    pub padding_seconds: u64,
    /// Platform ceiling for a single file.
    pub max_file_size_bytes: Option<u64>,
    /// Measured size of the source audio per second of play time.
    pub measured_bytes_per_second: Option<f64>,
    /// Fraction of the file ceiling actually used when deriving the duration bound.
    pub size_safety_factor: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            target_segment_seconds: 39 * 60,
            short_tail_threshold_seconds: 13 * 60,
            duration_mode_tail_threshold_seconds: 1,
            split_threshold_seconds: 101 * 60,
            split_mode: SplitMode::Default,
            padding_seconds: 5,
            max_file_size_bytes: Some(50 * 1024 * 1024),
            measured_bytes_per_second: None,
            size_safety_factor: 0.89,
        }
    }
}

/// The full ordered list of segments for one video, before extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    pub total_duration: u64,
    pub padding_seconds: u64,
    pub tail: TailPolicy,
    pub segments: Vec<Segment>,
}

impl Scheme {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_contains_is_half_open() {
        let segment = Segment::new(60, 120);
        assert!(segment.contains(60));
        assert!(segment.contains(119));
        assert!(!segment.contains(120));
        assert!(!segment.contains(59));
        assert_eq!(segment.duration(), 60);
    }

    #[test]
    fn test_split_mode_serde() {
        let mode: SplitMode = serde_json::from_str(r#"{"mode":"duration","minutes":20}"#).unwrap();
        assert_eq!(mode, SplitMode::Duration { minutes: 20 });
        let mode: SplitMode = serde_json::from_str(r#"{"mode":"timecodes"}"#).unwrap();
        assert_eq!(mode, SplitMode::Timecodes);
    }
}
