//! Configuration module for ytb2audio.
//!
//! Handles loading and saving the TOML settings file.

mod settings;

pub use settings::{
    DownloadSettings, GeneralSettings, LimitSettings, SegmentationSettings, Settings, SubtitleSettings,
};
