//! Configuration settings for ytb2audio.

use crate::pipeline::PipelineConfig;
use crate::segmentation::{PlannerConfig, RebalanceConfig, SplitMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub segmentation: SegmentationSettings,
    pub limits: LimitSettings,
    pub download: DownloadSettings,
    pub subtitles: SubtitleSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for downloaded audio and output parts.
    pub data_dir: String,
    /// Directory for intermediate files such as sliced audio.
    pub temp_dir: String,
    /// Keep the downloaded source audio after splitting.
    pub keep_files: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.ytb2audio".to_string(),
            temp_dir: "/tmp/ytb2audio".to_string(),
            keep_files: false,
        }
    }
}

/// How audio is cut into parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Part length in default mode.
    pub target_seconds: u64,
    /// A trailing part shorter than this is merged into the previous one.
    pub short_tail_seconds: u64,
    /// Tail threshold when the user picks the part length.
    pub duration_mode_tail_seconds: u64,
    /// Audio up to this length is sent as one part.
    pub split_threshold_seconds: u64,
    pub padding_seconds: u64,
    /// Split parts whose timecodes do not fit in one caption.
    pub rebalance: bool,
    pub rebalance_max_depth: u32,
    /// Titles with at least this share of uppercase letters are lowercased.
    pub uppercase_ratio: f64,
    /// Clock tokens a description paragraph needs (exclusive) to be read as timecodes.
    pub timecode_paragraph_threshold: usize,
    /// Fraction of the file size ceiling actually used.
    pub size_safety_factor: f64,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        let planner = PlannerConfig::default();
        let rebalance = RebalanceConfig::default();
        Self {
            target_seconds: planner.target_segment_seconds,
            short_tail_seconds: planner.short_tail_threshold_seconds,
            duration_mode_tail_seconds: planner.duration_mode_tail_threshold_seconds,
            split_threshold_seconds: planner.split_threshold_seconds,
            padding_seconds: planner.padding_seconds,
            rebalance: true,
            rebalance_max_depth: rebalance.max_depth,
            uppercase_ratio: crate::text::DEFAULT_UPPERCASE_RATIO,
            timecode_paragraph_threshold: crate::timecodes::DEFAULT_PARAGRAPH_THRESHOLD,
            size_safety_factor: planner.size_safety_factor,
        }
    }
}

/// Platform limits of the messaging side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub caption_max_chars: usize,
    pub filename_max_chars: usize,
    pub file_size_max_bytes: u64,
    /// Longer text is delivered as a file instead of a message.
    pub message_max_chars: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            caption_max_chars: 1024,
            filename_max_chars: 64,
            file_size_max_bytes: 50 * 1024 * 1024,
            message_max_chars: 4096,
        }
    }
}

/// Download behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Default audio bitrate in kbit/s.
    pub bitrate_kbps: u32,
    pub allowed_bitrates_kbps: Vec<u32>,
    pub timeout_seconds: u64,
    pub max_concurrent_splits: usize,
    /// Bounds for a user-chosen part length, in minutes.
    pub min_split_minutes: u64,
    pub max_split_minutes: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            bitrate_kbps: 48,
            allowed_bitrates_kbps: vec![48, 64, 96, 128, 160, 192, 256, 320],
            timeout_seconds: 2 * 60 * 60,
            max_concurrent_splits: 4,
            min_split_minutes: 1,
            max_split_minutes: 360,
        }
    }
}

/// Transcript lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleSettings {
    /// Preferred transcript languages, in order.
    pub languages: Vec<String>,
    /// Rows shown before and after each search hit.
    pub context_rows: usize,
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            languages: vec!["ru".to_string(), "en".to_string(), "uk".to_string(), "de".to_string()],
            context_rows: 1,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::Ytb2AudioError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ytb2audio")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Planner and caption settings for one request.
    ///
    /// `bytes_per_second` is the measured size of the downloaded audio, if known.
    pub fn pipeline_config(&self, split_mode: SplitMode, bytes_per_second: Option<f64>) -> PipelineConfig {
        let seg = &self.segmentation;
        PipelineConfig {
            planner: PlannerConfig {
                target_segment_seconds: seg.target_seconds,
                short_tail_threshold_seconds: seg.short_tail_seconds,
                duration_mode_tail_threshold_seconds: seg.duration_mode_tail_seconds,
                split_threshold_seconds: seg.split_threshold_seconds,
                split_mode,
                padding_seconds: seg.padding_seconds,
                max_file_size_bytes: Some(self.limits.file_size_max_bytes),
                measured_bytes_per_second: bytes_per_second,
                size_safety_factor: seg.size_safety_factor,
            },
            rebalance_enabled: seg.rebalance,
            rebalance: RebalanceConfig {
                caption_budget_chars: self.limits.caption_max_chars,
                max_depth: seg.rebalance_max_depth,
            },
            caption_max_chars: self.limits.caption_max_chars,
            uppercase_ratio: seg.uppercase_ratio,
            paragraph_threshold: seg.timecode_paragraph_threshold,
        }
    }

    /// Check a user-chosen part length against the configured bounds.
    pub fn validate_split_minutes(&self, minutes: u64) -> crate::error::Result<()> {
        let (min, max) = (self.download.min_split_minutes, self.download.max_split_minutes);
        if minutes < min || minutes > max {
            return Err(crate::error::Ytb2AudioError::InvalidInput(format!(
                "Split duration must be between {} and {} minutes",
                min, max
            )));
        }
        Ok(())
    }

    /// Check a requested bitrate against the allowed list.
    pub fn validate_bitrate(&self, kbps: u32) -> crate::error::Result<()> {
        if !self.download.allowed_bitrates_kbps.contains(&kbps) {
            return Err(crate::error::Ytb2AudioError::InvalidInput(format!(
                "Bitrate must be one of {:?} kbps",
                self.download.allowed_bitrates_kbps
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_planner() {
        let settings = Settings::default();
        let config = settings.pipeline_config(SplitMode::Default, None);
        assert_eq!(config.planner.target_segment_seconds, 39 * 60);
        assert_eq!(config.planner.short_tail_threshold_seconds, 13 * 60);
        assert_eq!(config.planner.max_file_size_bytes, Some(50 * 1024 * 1024));
        assert_eq!(config.caption_max_chars, 1024);
        assert!(config.rebalance_enabled);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [segmentation]
            padding_seconds = 2

            [download]
            bitrate_kbps = 96
            "#,
        )
        .unwrap();
        assert_eq!(settings.segmentation.padding_seconds, 2);
        assert_eq!(settings.segmentation.target_seconds, 39 * 60);
        assert_eq!(settings.download.bitrate_kbps, 96);
        assert_eq!(settings.limits.caption_max_chars, 1024);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.general.keep_files = true;
        settings.subtitles.context_rows = 3;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert!(loaded.general.keep_files);
        assert_eq!(loaded.subtitles.context_rows, 3);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.download.bitrate_kbps, 48);
    }

    #[test]
    fn test_validation() {
        let settings = Settings::default();
        assert!(settings.validate_bitrate(128).is_ok());
        assert!(settings.validate_bitrate(100).is_err());
        assert!(settings.validate_split_minutes(0).is_err());
        assert!(settings.validate_split_minutes(20).is_ok());
        assert!(settings.validate_split_minutes(1000).is_err());
    }
}
