//! Audio download and processing utilities.
//!
//! Downloads go through yt-dlp; probing and cutting through ffprobe/ffmpeg.

mod downloader;
mod splitter;

pub use downloader::{cached_audio_name, download_audio, download_thumbnail, thumbnail_name};
pub use splitter::{bytes_per_second, extract_range, probe_duration, split_ranges, ExtractJob};
