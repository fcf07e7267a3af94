//! Rebalancing segments so that each caption's timecode block fits its budget.

use super::{apply_padding, merge_short_tail, verify, Scheme, Segment};
use crate::caption::{timecode_block_len, timecodes_within};
use crate::error::Result;
use crate::timecodes::TimecodeEntry;
use tracing::debug;

/// Limits for the rebalancing pass.
#[derive(Debug, Clone)]
pub struct RebalanceConfig {
    /// Characters available to the timecode block of one caption.
    pub caption_budget_chars: usize,
    /// Maximum number of times a single original segment is halved.
    pub max_depth: u32,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            caption_budget_chars: 1024,
            max_depth: 8,
        }
    }
}

/// Split segments whose timecode block overflows the caption budget.
///
/// An overflowing segment is cut at the timecode in the middle of its
/// timecode list (by index, not by time) and both halves are checked again,
/// up to `max_depth` levels. Afterwards the tail merge and padding are
/// re-applied with the scheme's own policy. A scheme whose captions already fit
/// comes back unchanged.
pub fn rebalance(scheme: Scheme, timecodes: &[TimecodeEntry], config: &RebalanceConfig) -> Result<Scheme> {
    let Scheme {
        total_duration,
        padding_seconds,
        tail,
        segments,
    } = scheme;

    let mut balanced = Vec::with_capacity(segments.len());
    for segment in segments {
        split_to_fit(segment, timecodes, config, 0, &mut balanced);
    }

    let mut candidate = balanced.clone();
    if merge_short_tail(&mut candidate, &tail) {
        let fits = candidate
            .last()
            .map(|last| block_fits(last, timecodes, config.caption_budget_chars))
            .unwrap_or(true);
        if fits {
            balanced = candidate;
        }
    }

    apply_padding(&mut balanced, padding_seconds, total_duration);

    let scheme = Scheme {
        total_duration,
        padding_seconds,
        tail,
        segments: balanced,
    };
    verify(&scheme)?;
    Ok(scheme)
}

fn block_fits(segment: &Segment, timecodes: &[TimecodeEntry], budget: usize) -> bool {
    let inside = timecodes_within(timecodes, segment);
    timecode_block_len(&inside, segment.start_seconds) <= budget
}

fn split_to_fit(
    segment: Segment,
    timecodes: &[TimecodeEntry],
    config: &RebalanceConfig,
    depth: u32,
    out: &mut Vec<Segment>,
) {
    let inside = timecodes_within(timecodes, &segment);
    let length = timecode_block_len(&inside, segment.start_seconds);

    if length <= config.caption_budget_chars || inside.len() < 2 || depth >= config.max_depth {
        out.push(segment);
        return;
    }

    let cut = inside[inside.len() / 2].offset_seconds;
    if cut <= segment.start_seconds || cut >= segment.end_seconds {
        out.push(segment);
        return;
    }

    debug!(
        "Timecode block of {} chars over budget {}, cutting [{}, {}) at {}",
        length, config.caption_budget_chars, segment.start_seconds, segment.end_seconds, cut
    );

    let left = Segment::new(segment.start_seconds, cut).with_title(segment.title.clone());
    let right = Segment::new(cut, segment.end_seconds).with_title(segment.title);
    split_to_fit(left, timecodes, config, depth + 1, out);
    split_to_fit(right, timecodes, config, depth + 1, out);
}
