//! ytb2audio - YouTube videos as captioned audio parts
//!
//! Turns a video into one or more audio files that fit a messenger's file
//! size and caption limits, each with a caption carrying the part number,
//! duration and the timecodes that fall inside it.
//!
//! # Architecture
//!
//! The pure core, usable without any external tool:
//!
//! - `timefmt` - Duration formatting and clock parsing
//! - `text` - Title casing, file name sanitizing, char-safe truncation
//! - `timecodes` - Timecode extraction from descriptions and chapters
//! - `segmentation` - Segment planner and caption-driven rebalancer
//! - `caption` - Caption and file name assembly
//! - `pipeline` - Metadata to ordered, captioned parts
//!
//! The I/O shell around it:
//!
//! - `audio_source` - Video metadata (yt-dlp)
//! - `audio` - Download and cutting (yt-dlp, ffmpeg, ffprobe)
//! - `subtitles` - Transcript fetch and keyword search
//! - `orchestrator` - One request end to end
//! - `config` - Configuration management
//!
//! # Example
//!
//! ```rust,no_run
//! use ytb2audio::config::Settings;
//! use ytb2audio::orchestrator::{Orchestrator, ProcessRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings);
//!
//!     let result = orchestrator.process(&ProcessRequest::new("dQw4w9WgXcQ")).await?;
//!     for part in &result.manifest.parts {
//!         println!("{}\n{}\n", part.path.display(), part.caption);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod audio_source;
pub mod caption;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod segmentation;
pub mod subtitles;
pub mod text;
pub mod timecodes;
pub mod timefmt;

pub use error::{Result, Ytb2AudioError};
