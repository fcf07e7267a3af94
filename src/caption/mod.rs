//! Caption assembly for audio parts.
//!
//! A caption is derived from a segment, its slice of the timecode list and the
//! video's title/author. It is recomputed whenever segment boundaries change.

use crate::segmentation::Segment;
use crate::text::{normalize_case, sanitize_filename, truncate_chars};
use crate::timecodes::TimecodeEntry;
use crate::timefmt::format_compact;
use tracing::warn;

/// Appended to a caption that had to be cut.
pub const ELLIPSIS: &str = "\n...";

/// Characters kept free at the end of a truncated caption.
const TRUNCATION_RESERVE: usize = 8;

/// Remaining title budget below which the title is left out of file names.
const MIN_FILENAME_TITLE_CHARS: usize = 6;

/// Per-video caption fields shared by every part.
#[derive(Debug, Clone, Default)]
pub struct CaptionContext {
    pub title: String,
    pub author: String,
    /// Short link back to the source, e.g. `youtu.be/<id>`.
    pub link: Option<String>,
    /// Free-form suffix after the duration (bitrate note, slice note, ...).
    pub additional: String,
}

impl CaptionContext {
    /// Build a context with title and author case-normalised.
    pub fn new(title: &str, author: &str, uppercase_ratio: f64) -> Self {
        Self {
            title: normalize_case(title.trim(), uppercase_ratio),
            author: normalize_case(author.trim(), uppercase_ratio),
            link: None,
            additional: String::new(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_additional(mut self, additional: impl Into<String>) -> Self {
        self.additional = additional.into();
        self
    }
}

/// Timecodes whose offset lies in the segment's logical range `[start, end)`.
pub fn timecodes_within<'a>(timecodes: &'a [TimecodeEntry], segment: &Segment) -> Vec<&'a TimecodeEntry> {
    timecodes
        .iter()
        .filter(|t| segment.contains(t.offset_seconds))
        .collect()
}

/// Render one `<relative-time> - <title>` line.
pub fn render_timecode_line(entry: &TimecodeEntry, segment_start: u64) -> String {
    let relative = entry.offset_seconds.saturating_sub(segment_start);
    format!("{} - {}", format_compact(relative), entry.title)
}

/// Render the lines of a timecode block relative to `segment_start`.
pub fn relative_timecodes(entries: &[&TimecodeEntry], segment_start: u64) -> Vec<String> {
    entries
        .iter()
        .map(|entry| render_timecode_line(entry, segment_start))
        .collect()
}

/// Length in characters of the rendered timecode block (lines joined by newlines).
pub fn timecode_block_len(entries: &[&TimecodeEntry], segment_start: u64) -> usize {
    let lines: usize = entries
        .iter()
        .map(|entry| render_timecode_line(entry, segment_start).chars().count())
        .sum();
    lines + entries.len().saturating_sub(1)
}

/// `[Part i of N]`, or empty for a single part.
pub fn partition_label(part_index: usize, part_count: usize) -> String {
    if part_count <= 1 {
        String::new()
    } else {
        format!("[Part {} of {}]", part_index, part_count)
    }
}

/// Assemble the caption for one part.
///
/// `part_index` is 1-based. The `timecodes` block is inserted as is.
pub fn assemble_caption(
    context: &CaptionContext,
    duration_seconds: u64,
    part_index: usize,
    part_count: usize,
    timecodes: &str,
) -> String {
    let partition = partition_label(part_index, part_count);
    let duration = format!("[{}]", format_compact(duration_seconds));

    let heading = join_non_empty(&[partition.as_str(), context.title.as_str()]);
    let details = join_non_empty(&[
        context.link.as_deref().unwrap_or(""),
        duration.as_str(),
        context.additional.as_str(),
    ]);

    let mut caption = heading;
    caption.push('\n');
    caption.push_str(&details);
    if !context.author.is_empty() {
        caption.push('\n');
        caption.push_str(&context.author);
    }
    if !timecodes.is_empty() {
        caption.push_str("\n\n");
        caption.push_str(timecodes);
    }

    caption.trim().to_string()
}

/// Characters a caption uses before any timecodes are added.
///
/// Measured with the widest partition label and duration the caption can
/// carry, so the remainder is a safe budget for the timecode block.
pub fn header_len(context: &CaptionContext, part_count: usize) -> usize {
    let count = part_count.max(2);
    let widest_duration = 100 * 3600 - 1;
    assemble_caption(context, widest_duration, count, count, "").chars().count() + 2
}

/// Hard-truncate a caption to fit `max_chars`.
///
/// Over-long captions keep their first `max_chars - 8` characters followed by
/// [`ELLIPSIS`].
pub fn truncate_caption(caption: &str, max_chars: usize) -> String {
    if caption.chars().count() <= max_chars {
        return caption.to_string();
    }

    warn!("Caption of {} chars truncated to {}", caption.chars().count(), max_chars);
    let keep = max_chars.saturating_sub(TRUNCATION_RESERVE);
    format!("{}{}", truncate_chars(caption, keep), ELLIPSIS)
}

/// `p<i>_of<N>-` for multi-part output, empty otherwise.
pub fn part_prefix(part_index: usize, part_count: usize) -> String {
    if part_count <= 1 {
        String::new()
    } else {
        format!("p{}_of{}-", part_index, part_count)
    }
}

/// Build `prefix + title + suffix` within `max_chars`.
///
/// The title is sanitised and cut to the remaining budget (ending in `-`);
/// if six or fewer characters remain it is left out entirely.
pub fn segment_filename(title: &str, prefix: &str, suffix: &str, max_chars: usize) -> String {
    let budget = max_chars
        .saturating_sub(prefix.chars().count())
        .saturating_sub(suffix.chars().count());

    let clean = sanitize_filename(title);
    if budget <= MIN_FILENAME_TITLE_CHARS || clean.is_empty() {
        return format!("{}{}", prefix, suffix);
    }

    let title_part = truncate_chars(&clean, budget - 1).trim_end();
    format!("{}{}-{}", prefix, title_part, suffix)
}

fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
