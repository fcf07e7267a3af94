//! Segment planning: fixed-length and timecode splits, tail merging, size bounds.

use super::{PlannerConfig, Scheme, Segment, SplitMode, TailPolicy};
use crate::error::{Result, Ytb2AudioError};
use crate::timecodes::TimecodeEntry;
use tracing::debug;

/// Build a verified, padded scheme for audio of `total_duration` seconds.
pub fn plan(total_duration: i64, timecodes: &[TimecodeEntry], config: &PlannerConfig) -> Result<Scheme> {
    if total_duration <= 0 {
        return Err(Ytb2AudioError::InvalidDuration(total_duration));
    }
    let total = total_duration as u64;

    let max_duration = match (config.max_file_size_bytes, config.measured_bytes_per_second) {
        (Some(ceiling), Some(bps)) => max_segment_duration(ceiling, config.size_safety_factor, bps),
        _ => None,
    };
    let bounded = |length: u64| match max_duration {
        Some(max) => length.min(max),
        None => length,
    };

    let (mut segments, threshold_seconds) = match config.split_mode {
        SplitMode::Default => {
            let segments = if total > config.split_threshold_seconds {
                split_by_duration(total, bounded(config.target_segment_seconds))
            } else {
                vec![Segment::new(0, total)]
            };
            (segments, config.short_tail_threshold_seconds)
        }
        SplitMode::Duration { minutes } => {
            if minutes == 0 {
                return Err(Ytb2AudioError::InvalidInput(
                    "Split duration must be at least one minute".to_string(),
                ));
            }
            (
                split_by_duration(total, bounded(minutes * 60)),
                config.duration_mode_tail_threshold_seconds,
            )
        }
        SplitMode::Timecodes => (split_by_timecodes(total, timecodes), 0),
    };

    let tail = TailPolicy {
        threshold_seconds,
        max_duration_seconds: max_duration,
    };

    if let Some(max) = max_duration {
        segments = enforce_max_duration(segments, max);
    }
    merge_short_tail(&mut segments, &tail);
    apply_padding(&mut segments, config.padding_seconds, total);

    let scheme = Scheme {
        total_duration: total,
        padding_seconds: config.padding_seconds,
        tail,
        segments,
    };
    verify(&scheme)?;

    debug!(
        "Planned {} segments for {}s ({} mode, max segment {:?}s)",
        scheme.len(),
        total,
        config.split_mode,
        max_duration
    );
    Ok(scheme)
}

/// Longest segment whose audio stays under the file-size ceiling.
///
/// `ceiling * safety / bytes_per_second`, never below one second. Returns
/// `None` when the measurement is unusable.
pub fn max_segment_duration(ceiling_bytes: u64, safety_factor: f64, bytes_per_second: f64) -> Option<u64> {
    if !(bytes_per_second.is_finite() && bytes_per_second > 0.0) {
        return None;
    }
    let seconds = (ceiling_bytes as f64 * safety_factor / bytes_per_second).floor();
    Some((seconds as u64).max(1))
}

/// Consecutive ranges of `segment_seconds`, the last one shortened to fit.
pub fn split_by_duration(total: u64, segment_seconds: u64) -> Vec<Segment> {
    let step = segment_seconds.max(1);
    let mut segments = Vec::new();
    let mut start = 0;

    while start < total {
        let end = (start + step).min(total);
        segments.push(Segment::new(start, end));
        start = end;
    }

    segments
}

/// One segment per timecode, the first starting at zero and the last ending at `total`.
///
/// Timecodes at or past the end are ignored. With fewer than two usable
/// timecodes the whole audio is a single segment.
pub fn split_by_timecodes(total: u64, timecodes: &[TimecodeEntry]) -> Vec<Segment> {
    let mut sorted: Vec<&TimecodeEntry> = timecodes.iter().filter(|t| t.offset_seconds < total).collect();
    sorted.sort_by_key(|t| t.offset_seconds);

    let mut starts: Vec<(u64, &str)> = Vec::with_capacity(sorted.len());
    for entry in sorted {
        match starts.last() {
            None => starts.push((0, entry.title.as_str())),
            Some(&(prev, _)) if entry.offset_seconds > prev => {
                starts.push((entry.offset_seconds, entry.title.as_str()))
            }
            Some(_) => {}
        }
    }

    if starts.len() < 2 {
        return vec![Segment::new(0, total)];
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &(start, title))| {
            let end = starts.get(i + 1).map(|&(next, _)| next).unwrap_or(total);
            Segment::new(start, end).with_title(title)
        })
        .collect()
}

/// Fold undersized trailing segments into their predecessor.
///
/// Repeats until the last segment is long enough or a merge would exceed the
/// policy's maximum duration. Returns whether anything was merged.
pub fn merge_short_tail(segments: &mut Vec<Segment>, tail: &TailPolicy) -> bool {
    let mut merged = false;

    while segments.len() >= 2 {
        let last = &segments[segments.len() - 1];
        let prev = &segments[segments.len() - 2];

        if last.duration() >= tail.threshold_seconds {
            break;
        }
        let combined = last.end_seconds - prev.start_seconds;
        if tail.max_duration_seconds.is_some_and(|max| combined > max) {
            break;
        }

        debug!("Merging {}s tail into previous segment", last.duration());
        let end = last.end_seconds;
        segments.pop();
        if let Some(prev) = segments.last_mut() {
            prev.end_seconds = end;
            prev.padded_end = end;
        }
        merged = true;
    }

    merged
}

/// Split every segment longer than `max_seconds` into near-equal pieces.
///
/// Balanced pieces avoid producing a tiny leftover part.
pub fn enforce_max_duration(segments: Vec<Segment>, max_seconds: u64) -> Vec<Segment> {
    let max_seconds = max_seconds.max(1);
    let mut result = Vec::with_capacity(segments.len());

    for segment in segments {
        let duration = segment.duration();
        if duration <= max_seconds {
            result.push(segment);
            continue;
        }

        let pieces = duration.div_ceil(max_seconds);
        let base = duration / pieces;
        let remainder = duration % pieces;
        debug!("Splitting {}s segment into {} pieces", duration, pieces);

        let mut start = segment.start_seconds;
        for i in 0..pieces {
            let length = base + u64::from(i < remainder);
            result.push(Segment::new(start, start + length).with_title(segment.title.clone()));
            start += length;
        }
    }

    result
}

/// Extend each segment by `padding` on both sides, clamped to `[0, total]`.
///
/// Logical boundaries are left untouched.
pub fn apply_padding(segments: &mut [Segment], padding: u64, total: u64) {
    for segment in segments.iter_mut() {
        segment.padded_start = segment.start_seconds.saturating_sub(padding);
        segment.padded_end = (segment.end_seconds + padding).min(total);
    }
}

/// Check that a scheme is non-empty, contiguous, positive and covers the total.
pub fn verify(scheme: &Scheme) -> Result<()> {
    let segments = &scheme.segments;
    let first = segments.first().ok_or(Ytb2AudioError::EmptyScheme)?;

    if first.start_seconds != 0 {
        return Err(Ytb2AudioError::InvalidScheme(format!(
            "first segment starts at {}s instead of 0",
            first.start_seconds
        )));
    }

    for (i, segment) in segments.iter().enumerate() {
        if segment.end_seconds <= segment.start_seconds {
            return Err(Ytb2AudioError::InvalidScheme(format!(
                "segment {} has non-positive length [{}, {})",
                i, segment.start_seconds, segment.end_seconds
            )));
        }
        if let Some(max) = scheme.tail.max_duration_seconds {
            if segment.duration() > max {
                return Err(Ytb2AudioError::InvalidScheme(format!(
                    "segment {} is {}s, above the {}s size bound",
                    i,
                    segment.duration(),
                    max
                )));
            }
        }
    }

    for (i, pair) in segments.windows(2).enumerate() {
        if pair[0].end_seconds != pair[1].start_seconds {
            return Err(Ytb2AudioError::InvalidScheme(format!(
                "gap or overlap between segments {} and {}",
                i,
                i + 1
            )));
        }
    }

    let last_end = segments.last().map(|s| s.end_seconds).unwrap_or(0);
    if last_end != scheme.total_duration {
        return Err(Ytb2AudioError::InvalidScheme(format!(
            "segments end at {}s, audio is {}s",
            last_end, scheme.total_duration
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(scheme: &Scheme) -> Vec<(u64, u64)> {
        scheme.segments.iter().map(|s| (s.start_seconds, s.end_seconds)).collect()
    }

    fn config(mode: SplitMode) -> PlannerConfig {
        PlannerConfig {
            target_segment_seconds: 60,
            short_tail_threshold_seconds: 30,
            duration_mode_tail_threshold_seconds: 1,
            split_threshold_seconds: 60,
            split_mode: mode,
            padding_seconds: 0,
            max_file_size_bytes: None,
            measured_bytes_per_second: None,
            size_safety_factor: 0.89,
        }
    }

    fn assert_covers(scheme: &Scheme) {
        assert_eq!(scheme.segments[0].start_seconds, 0);
        assert_eq!(scheme.segments.last().unwrap().end_seconds, scheme.total_duration);
        for pair in scheme.segments.windows(2) {
            assert_eq!(pair[0].end_seconds, pair[1].start_seconds);
        }
        assert!(scheme.segments.iter().all(|s| s.duration() > 0));
    }

    #[test]
    fn test_magic_tail_merge() {
        let scheme = plan(125, &[], &config(SplitMode::Default)).unwrap();
        assert_eq!(bounds(&scheme), vec![(0, 60), (60, 125)]);
    }

    #[test]
    fn test_tail_kept_when_long_enough() {
        let scheme = plan(160, &[], &config(SplitMode::Default)).unwrap();
        assert_eq!(bounds(&scheme), vec![(0, 60), (60, 120), (120, 160)]);
    }

    #[test]
    fn test_short_audio_single_segment() {
        let scheme = plan(45, &[], &config(SplitMode::Default)).unwrap();
        assert_eq!(bounds(&scheme), vec![(0, 45)]);
    }

    #[test]
    fn test_invalid_duration() {
        assert!(matches!(
            plan(0, &[], &config(SplitMode::Default)),
            Err(Ytb2AudioError::InvalidDuration(0))
        ));
        assert!(matches!(
            plan(-10, &[], &config(SplitMode::Default)),
            Err(Ytb2AudioError::InvalidDuration(-10))
        ));
    }

    #[test]
    fn test_duration_mode_never_merges() {
        let scheme = plan(605, &[], &config(SplitMode::Duration { minutes: 2 })).unwrap();
        assert_eq!(scheme.len(), 6);
        assert_eq!(scheme.segments[5].duration(), 5);
        assert_covers(&scheme);
    }

    #[test]
    fn test_duration_mode_rejects_zero() {
        assert!(plan(605, &[], &config(SplitMode::Duration { minutes: 0 })).is_err());
    }

    #[test]
    fn test_timecodes_mode() {
        let timecodes = vec![
            TimecodeEntry::new(10, "Intro"),
            TimecodeEntry::new(100, "Body"),
            TimecodeEntry::new(250, "Outro"),
            TimecodeEntry::new(400, "Past the end"),
        ];
        let scheme = plan(300, &timecodes, &config(SplitMode::Timecodes)).unwrap();

        assert_eq!(bounds(&scheme), vec![(0, 100), (100, 250), (250, 300)]);
        assert_eq!(scheme.segments[0].title, "Intro");
        assert_eq!(scheme.segments[2].title, "Outro");
    }

    #[test]
    fn test_timecodes_mode_fallback() {
        let timecodes = vec![TimecodeEntry::new(0, "Only")];
        let scheme = plan(300, &timecodes, &config(SplitMode::Timecodes)).unwrap();
        assert_eq!(bounds(&scheme), vec![(0, 300)]);
    }

    #[test]
    fn test_size_bound_overrides_target() {
        let mut cfg = config(SplitMode::Default);
        cfg.target_segment_seconds = 1000;
        cfg.split_threshold_seconds = 10_000;
        cfg.max_file_size_bytes = Some(1000);
        cfg.size_safety_factor = 1.0;
        cfg.measured_bytes_per_second = Some(10.0);

        let scheme = plan(250, &[], &cfg).unwrap();
        assert_eq!(scheme.tail.max_duration_seconds, Some(100));
        assert_eq!(bounds(&scheme), vec![(0, 84), (84, 167), (167, 250)]);
        assert_covers(&scheme);
    }

    #[test]
    fn test_size_bound_blocks_tail_merge() {
        let mut cfg = config(SplitMode::Default);
        cfg.max_file_size_bytes = Some(700);
        cfg.size_safety_factor = 1.0;
        cfg.measured_bytes_per_second = Some(10.0);

        // target 60, bound 70: merging the 5s tail would give 65s, allowed
        let scheme = plan(125, &[], &cfg).unwrap();
        assert_eq!(bounds(&scheme), vec![(0, 60), (60, 125)]);

        // bound 62: merging would give 65s, refused
        cfg.max_file_size_bytes = Some(620);
        let scheme = plan(125, &[], &cfg).unwrap();
        assert_eq!(bounds(&scheme), vec![(0, 60), (60, 120), (120, 125)]);
    }

    #[test]
    fn test_padding_keeps_logical_bounds() {
        let mut cfg = config(SplitMode::Default);
        cfg.padding_seconds = 5;

        let scheme = plan(160, &[], &cfg).unwrap();
        let first = &scheme.segments[0];
        let middle = &scheme.segments[1];
        let last = &scheme.segments[2];

        assert_eq!((first.padded_start, first.padded_end), (0, 65));
        assert_eq!((middle.start_seconds, middle.end_seconds), (60, 120));
        assert_eq!((middle.padded_start, middle.padded_end), (55, 125));
        assert_eq!((last.padded_start, last.padded_end), (115, 160));
    }

    #[test]
    fn test_coverage_across_durations() {
        for total in [1, 59, 60, 61, 89, 90, 91, 3599, 7201] {
            for mode in [SplitMode::Default, SplitMode::Duration { minutes: 1 }] {
                let scheme = plan(total, &[], &config(mode)).unwrap();
                assert_covers(&scheme);
            }
        }
    }

    #[test]
    fn test_max_segment_duration() {
        assert_eq!(max_segment_duration(50_000_000, 0.89, 6000.0), Some(7416));
        assert_eq!(max_segment_duration(10, 0.5, 100.0), Some(1));
        assert_eq!(max_segment_duration(10, 0.5, 0.0), None);
    }

    #[test]
    fn test_verify_rejects_gap() {
        let scheme = Scheme {
            total_duration: 100,
            padding_seconds: 0,
            tail: TailPolicy::never(),
            segments: vec![Segment::new(0, 40), Segment::new(50, 100)],
        };
        assert!(matches!(verify(&scheme), Err(Ytb2AudioError::InvalidScheme(_))));

        let empty = Scheme {
            segments: Vec::new(),
            ..scheme
        };
        assert!(matches!(verify(&empty), Err(Ytb2AudioError::EmptyScheme)));
    }
}
