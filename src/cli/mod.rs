//! CLI module for ytb2audio.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::pipeline::SliceRange;
use crate::segmentation::SplitMode;
use clap::{Parser, Subcommand};

/// ytb2audio - YouTube videos as captioned audio parts
///
/// Downloads the audio track of a video and cuts it into parts that fit a
/// messenger's file size and caption limits, with per-part timecodes.
#[derive(Parser, Debug)]
#[command(name = "ytb2audio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "YTB2AUDIO_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by `plan` and `process`.
#[derive(clap::Args, Debug, Clone)]
pub struct SplitArgs {
    /// Split into parts of this many minutes
    #[arg(short, long, conflicts_with = "timecodes")]
    pub minutes: Option<u64>,

    /// One part per timecode or chapter
    #[arg(short, long)]
    pub timecodes: bool,

    /// Audio bitrate in kbit/s (must be one of the allowed bitrates)
    #[arg(short, long)]
    pub bitrate: Option<u32>,

    /// Only take this range, e.g. 1:00-12:30 or 60-750
    #[arg(short, long, value_parser = parse_slice)]
    pub slice: Option<SliceRange>,
}

impl SplitArgs {
    pub fn split_mode(&self) -> SplitMode {
        match (self.minutes, self.timecodes) {
            (Some(minutes), _) => SplitMode::Duration { minutes },
            (None, true) => SplitMode::Timecodes,
            (None, false) => SplitMode::Default,
        }
    }
}

fn parse_slice(value: &str) -> Result<SliceRange, String> {
    SliceRange::parse(value).map_err(|e| e.to_string())
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Show how a video would be split, without downloading it
    Plan {
        /// YouTube URL or video ID
        #[arg(required_unless_present = "info_json")]
        input: Option<String>,

        /// Read metadata from a saved `yt-dlp --dump-json` file instead
        #[arg(long, conflicts_with = "input")]
        info_json: Option<String>,

        #[command(flatten)]
        split: SplitArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a video's audio and split it into captioned parts
    Process {
        /// YouTube URL or video ID
        input: String,

        #[command(flatten)]
        split: SplitArgs,

        /// Output directory (default: <data_dir>/<video id>)
        #[arg(short, long)]
        output: Option<String>,

        /// Re-download even if the audio is cached
        #[arg(short, long)]
        force: bool,
    },

    /// Print a video's transcript, or search it for a word
    Subtitles {
        /// YouTube URL or video ID
        input: String,

        /// Only show lines containing this word
        word: Option<String>,

        /// Where long transcripts are saved (default: data directory)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_args() {
        let cli = Cli::parse_from(["ytb2audio", "process", "dQw4w9WgXcQ", "-m", "20", "-s", "1:00-5:00", "-vv"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Process { input, split, .. } => {
                assert_eq!(input, "dQw4w9WgXcQ");
                assert_eq!(split.split_mode(), SplitMode::Duration { minutes: 20 });
                assert_eq!(split.slice.map(|s| s.duration()), Some(240));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_plan_requires_input_or_file() {
        assert!(Cli::try_parse_from(["ytb2audio", "plan"]).is_err());
        assert!(Cli::try_parse_from(["ytb2audio", "plan", "--info-json", "info.json", "-t"]).is_ok());
        assert!(Cli::try_parse_from(["ytb2audio", "plan", "x", "-m", "5", "-t"]).is_err());
    }

    #[test]
    fn test_bad_slice_rejected() {
        assert!(Cli::try_parse_from(["ytb2audio", "process", "x", "--slice", "5:00-1:00"]).is_err());
    }
}
