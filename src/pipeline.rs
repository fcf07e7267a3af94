//! Pure planning pipeline for one video.
//!
//! metadata → timecode extraction → segment planner → (rebalancer) → captions.
//! Nothing here touches the network or the filesystem, and nothing is shared
//! between calls, so it can run for many videos at once.

use crate::caption::{
    assemble_caption, header_len, part_prefix, relative_timecodes, segment_filename, timecodes_within,
    truncate_caption, CaptionContext,
};
use crate::error::{Result, Ytb2AudioError};
use crate::segmentation::{plan, rebalance, PlannerConfig, RebalanceConfig, Scheme};
use crate::timecodes::{Chapter, TimecodeEntry, TimecodeExtractor};
use crate::timefmt::format_compact;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Part count assumed when sizing the caption header.
const WIDEST_PART_COUNT: usize = 999;

/// A description as either one text or a list of texts (only the first is scanned).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    Parts(Vec<String>),
}

impl Description {
    pub fn text(&self) -> Option<&str> {
        match self {
            Description::Text(text) => Some(text.as_str()),
            Description::Parts(parts) => parts.first().map(|s| s.as_str()),
        }
    }
}

/// Metadata of one video as needed by the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Total play time in seconds.
    pub duration_seconds: i64,
    #[serde(default)]
    pub description: Option<Description>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// A sub-range of the source the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRange {
    pub start_seconds: u64,
    pub end_seconds: u64,
}

impl SliceRange {
    /// Parse `START-END` where each side is seconds or a clock token.
    pub fn parse(value: &str) -> Result<Self> {
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| Ytb2AudioError::InvalidInput(format!("Slice must look like START-END: {}", value)))?;

        let range = Self {
            start_seconds: crate::timefmt::parse_time_arg(start)?,
            end_seconds: crate::timefmt::parse_time_arg(end)?,
        };
        if range.end_seconds <= range.start_seconds {
            return Err(Ytb2AudioError::InvalidInput(format!(
                "Slice end must be after its start: {}",
                value
            )));
        }
        Ok(range)
    }

    pub fn duration(&self) -> u64 {
        self.end_seconds - self.start_seconds
    }

    /// Caption note describing the slice.
    pub fn note(&self) -> String {
        format!(
            "Sliced: {} - {}",
            format_compact(self.start_seconds),
            format_compact(self.end_seconds)
        )
    }
}

/// Settings for the pure pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub planner: PlannerConfig,
    pub rebalance_enabled: bool,
    pub rebalance: RebalanceConfig,
    pub caption_max_chars: usize,
    pub uppercase_ratio: f64,
    pub paragraph_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            rebalance_enabled: true,
            rebalance: RebalanceConfig::default(),
            caption_max_chars: 1024,
            uppercase_ratio: crate::text::DEFAULT_UPPERCASE_RATIO,
            paragraph_threshold: crate::timecodes::DEFAULT_PARAGRAPH_THRESHOLD,
        }
    }
}

/// Per-request caption extras.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub link: Option<String>,
    /// Free-form notes joined into the caption's `additional` field.
    pub notes: Vec<String>,
    pub slice: Option<SliceRange>,
}

/// One planned output part with its final caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedSegment {
    /// 1-based part number.
    pub index: usize,
    pub start_seconds: u64,
    pub end_seconds: u64,
    pub padded_start: u64,
    pub padded_end: u64,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub title: String,
    pub caption: String,
    pub relative_timecodes: Vec<String>,
}

impl PlannedSegment {
    pub fn duration(&self) -> u64 {
        self.end_seconds - self.start_seconds
    }
}

/// Full result of planning a video.
#[derive(Debug, Clone)]
pub struct VideoPlan {
    /// Video title as published, used for file names.
    pub title: String,
    pub scheme: Scheme,
    pub timecodes: Vec<TimecodeEntry>,
    pub segments: Vec<PlannedSegment>,
}

impl VideoPlan {
    /// File name of every part, in order.
    ///
    /// Chapter-titled parts are named after their chapter, the rest after
    /// the video title.
    pub fn part_filenames(&self, suffix: &str, max_chars: usize) -> Vec<String> {
        let count = self.segments.len();
        self.segments
            .iter()
            .map(|segment| {
                let title = if segment.title.is_empty() {
                    &self.title
                } else {
                    &segment.title
                };
                segment_filename(title, &part_prefix(segment.index, count), suffix, max_chars)
            })
            .collect()
    }
}

/// Plan the parts and captions for one video.
pub fn plan_video(metadata: &VideoMetadata, options: &PlanOptions, config: &PipelineConfig) -> Result<VideoPlan> {
    if metadata.duration_seconds <= 0 {
        return Err(Ytb2AudioError::InvalidDuration(metadata.duration_seconds));
    }

    let extractor = TimecodeExtractor::with_config(config.paragraph_threshold, config.uppercase_ratio);
    let mut timecodes = extractor.extract(
        metadata.description.as_ref().and_then(|d| d.text()),
        &metadata.chapters,
    );

    let mut duration = metadata.duration_seconds;
    if let Some(slice) = options.slice {
        if slice.end_seconds > metadata.duration_seconds as u64 {
            return Err(Ytb2AudioError::InvalidInput(format!(
                "Slice end {} is past the end of the video ({})",
                format_compact(slice.end_seconds),
                format_compact(metadata.duration_seconds as u64)
            )));
        }
        timecodes = shift_into_slice(timecodes, &slice);
        duration = slice.duration() as i64;
    }

    let mut context = CaptionContext::new(&metadata.title, &metadata.author, config.uppercase_ratio)
        .with_additional(options.notes.join(" "));
    if let Some(link) = &options.link {
        context = context.with_link(link.clone());
    }

    let mut scheme = plan(duration, &timecodes, &config.planner)?;

    if config.rebalance_enabled {
        let budget = config
            .caption_max_chars
            .saturating_sub(header_len(&context, WIDEST_PART_COUNT));
        let rebalance_config = RebalanceConfig {
            caption_budget_chars: budget,
            ..config.rebalance.clone()
        };
        let before = scheme.len();
        scheme = rebalance(scheme, &timecodes, &rebalance_config)?;
        if scheme.len() != before {
            info!("Rebalanced {} segments into {} to fit timecodes", before, scheme.len());
        }
    }

    if scheme.is_empty() {
        return Err(Ytb2AudioError::EmptyScheme);
    }

    let slice_offset = options.slice.map(|s| s.start_seconds).unwrap_or(0);
    let count = scheme.len();
    let segments = scheme
        .segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let inside = timecodes_within(&timecodes, segment);
            let lines = relative_timecodes(&inside, segment.start_seconds);

            let mut part_context = context.clone();
            let block = if segment.title.is_empty() {
                lines.join("\n")
            } else {
                let chapter = format!(
                    "{} - {}",
                    format_compact(segment.start_seconds + slice_offset),
                    segment.title
                );
                part_context.additional = if part_context.additional.is_empty() {
                    chapter
                } else {
                    format!("{}\n{}", part_context.additional, chapter)
                };
                String::new()
            };

            let caption = assemble_caption(&part_context, segment.duration(), i + 1, count, &block);
            PlannedSegment {
                index: i + 1,
                start_seconds: segment.start_seconds,
                end_seconds: segment.end_seconds,
                padded_start: segment.padded_start,
                padded_end: segment.padded_end,
                title: segment.title.clone(),
                caption: truncate_caption(&caption, config.caption_max_chars),
                relative_timecodes: lines,
            }
        })
        .collect();

    debug!("Planned {} parts for {}", count, metadata.id);
    Ok(VideoPlan {
        title: metadata.title.clone(),
        scheme,
        timecodes,
        segments,
    })
}

/// Keep timecodes inside the slice and re-base them to its start.
///
/// A timecode before the slice that is still "running" at its start is kept
/// at offset zero.
fn shift_into_slice(timecodes: Vec<TimecodeEntry>, slice: &SliceRange) -> Vec<TimecodeEntry> {
    let running = timecodes
        .iter()
        .rev()
        .find(|t| t.offset_seconds <= slice.start_seconds)
        .cloned();

    let mut shifted: Vec<TimecodeEntry> = running
        .into_iter()
        .map(|t| TimecodeEntry::new(0, t.title))
        .collect();

    shifted.extend(
        timecodes
            .into_iter()
            .filter(|t| t.offset_seconds > slice.start_seconds && t.offset_seconds < slice.end_seconds)
            .map(|t| TimecodeEntry::new(t.offset_seconds - slice.start_seconds, t.title)),
    );
    shifted
}
