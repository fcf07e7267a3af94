//! Media source abstraction for ytb2audio.
//!
//! A [`MediaSource`] resolves a video id to its metadata and downloads its
//! audio track. The YouTube implementation shells out to yt-dlp.

mod youtube;

pub use youtube::{extract_video_id, short_link, YoutubeSource};

use crate::error::{Result, Ytb2AudioError};
use crate::pipeline::{Description, VideoMetadata};
use crate::timecodes::Chapter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata of a video as reported by yt-dlp (`--dump-json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Duration in seconds (if known).
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub is_live: Option<bool>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub formats: Vec<MediaFormat>,
    #[serde(default)]
    pub webpage_url: Option<String>,
}

/// One downloadable format of a video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaFormat {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl MediaMetadata {
    /// Parse the JSON document yt-dlp prints with `--dump-json`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Ytb2AudioError::VideoSource(format!("Failed to parse yt-dlp output: {}", e)))
    }

    /// Load a saved yt-dlp info JSON file.
    pub fn from_info_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check the fields the planner needs and convert to planner input.
    ///
    /// Live streams and videos without a title or duration are rejected.
    pub fn to_video_metadata(&self) -> Result<VideoMetadata> {
        if self.is_live.unwrap_or(false) {
            return Err(Ytb2AudioError::LiveStream(self.id.clone()));
        }

        let title = self
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Ytb2AudioError::MissingMetadata(format!("title of {}", self.id)))?;

        let duration = self
            .duration
            .filter(|d| *d > 0.0)
            .ok_or_else(|| Ytb2AudioError::MissingMetadata(format!("duration of {}", self.id)))?;

        Ok(VideoMetadata {
            id: self.id.clone(),
            title: title.to_string(),
            author: self.uploader.clone().or_else(|| self.channel.clone()).unwrap_or_default(),
            duration_seconds: duration.floor() as i64,
            description: self.description.clone().map(Description::Text),
            chapters: self.chapters.clone(),
        })
    }

    /// Check that the audio can actually be fetched right now.
    pub fn check_downloadable(&self) -> Result<()> {
        if self.filesize_approx.is_none() {
            return Err(Ytb2AudioError::LiveStream(format!(
                "{} has no size estimate yet and may still be processing",
                self.id
            )));
        }
        if !self.formats.iter().any(|f| f.filesize.is_some()) {
            return Err(Ytb2AudioError::AudioDownload(format!(
                "no format of {} reports a file size",
                self.id
            )));
        }
        Ok(())
    }
}

/// Trait for media source providers.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fetch metadata for a video id.
    async fn fetch_metadata(&self, video_id: &str) -> Result<MediaMetadata>;

    /// Download the audio track, returning the local file path.
    async fn download_audio(
        &self,
        video_id: &str,
        bitrate_kbps: u32,
        output_dir: &Path,
        force: bool,
    ) -> Result<PathBuf>;

    /// Download the video thumbnail, returning the local file path.
    async fn download_thumbnail(&self, video_id: &str, output_dir: &Path) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO: &str = r#"{
        "id": "dQw4w9WgXcQ",
        "title": "Never Gonna Give You Up",
        "uploader": "Rick Astley",
        "channel": "Rick Astley",
        "description": "Official video",
        "duration": 212.5,
        "chapters": [
            {"start_time": 0.0, "end_time": 30.0, "title": "Intro"},
            {"start_time": 30.0, "end_time": 212.0, "title": "Song"}
        ],
        "is_live": false,
        "filesize_approx": 3400000,
        "formats": [{"format_id": "140", "filesize": 3400000}, {"format_id": "sb0"}]
    }"#;

    #[test]
    fn test_parse_info_json() {
        let meta = MediaMetadata::from_json(INFO).unwrap();
        assert_eq!(meta.chapters.len(), 2);
        assert!(meta.check_downloadable().is_ok());

        let video = meta.to_video_metadata().unwrap();
        assert_eq!(video.duration_seconds, 212);
        assert_eq!(video.author, "Rick Astley");
        assert_eq!(video.chapters[1].offset_seconds(), 30);
    }

    #[test]
    fn test_null_chapters() {
        let meta = MediaMetadata::from_json(r#"{"id": "x", "title": "t", "duration": 5, "chapters": null}"#).unwrap();
        assert!(meta.chapters.is_empty());
        assert!(meta.check_downloadable().is_err());
    }

    #[test]
    fn test_rejections() {
        let mut meta = MediaMetadata::from_json(INFO).unwrap();
        meta.is_live = Some(true);
        assert!(matches!(meta.to_video_metadata(), Err(Ytb2AudioError::LiveStream(_))));

        let mut meta = MediaMetadata::from_json(INFO).unwrap();
        meta.title = Some("  ".to_string());
        assert!(matches!(meta.to_video_metadata(), Err(Ytb2AudioError::MissingMetadata(_))));

        let mut meta = MediaMetadata::from_json(INFO).unwrap();
        meta.duration = None;
        assert!(matches!(meta.to_video_metadata(), Err(Ytb2AudioError::MissingMetadata(_))));

        let mut meta = MediaMetadata::from_json(INFO).unwrap();
        meta.formats.clear();
        assert!(matches!(meta.check_downloadable(), Err(Ytb2AudioError::AudioDownload(_))));
    }

    #[test]
    fn test_from_info_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.json");
        std::fs::write(&path, INFO).unwrap();
        assert_eq!(MediaMetadata::from_info_file(&path).unwrap().id, "dQw4w9WgXcQ");
    }
}
