//! YouTube source implementation.

use super::{MediaMetadata, MediaSource};
use crate::error::{Result, Ytb2AudioError};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, instrument};
use url::Url;

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid regex"))
}

/// Extract an 11-character video id from a YouTube URL or bare id.
///
/// Handles `watch?v=`, `youtu.be/`, `/shorts/`, `/embed/`, `/live/` and `/v/`
/// links, with or without scheme.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if video_id_regex().is_match(input) {
        return Some(input.to_string());
    }

    let url = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{}", input)))
        .ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(|s| s.to_string()),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("shorts") | Some("embed") | Some("live") | Some("v") => {
                    segments.next().map(|s| s.to_string())
                }
                _ => None,
            }
        }
        _ => None,
    }?;

    video_id_regex().is_match(&candidate).then_some(candidate)
}

/// Short link used in captions.
pub fn short_link(video_id: &str) -> String {
    format!("youtu.be/{}", video_id)
}

/// YouTube media source backed by yt-dlp.
#[derive(Debug, Clone, Default)]
pub struct YoutubeSource;

impl YoutubeSource {
    pub fn new() -> Self {
        Self
    }

    fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }
}

#[async_trait]
impl MediaSource for YoutubeSource {
    #[instrument(skip(self))]
    async fn fetch_metadata(&self, video_id: &str) -> Result<MediaMetadata> {
        let url = Self::watch_url(video_id);

        let output = tokio::process::Command::new("yt-dlp")
            .args(["--dump-json", "--no-download", "--no-warnings", "--no-playlist", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Ytb2AudioError::ToolNotFound("yt-dlp".to_string())
                } else {
                    Ytb2AudioError::VideoSource(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Ytb2AudioError::VideoNotFound(format!(
                "Video {} not found or unavailable: {}",
                video_id, stderr
            )));
        }

        let metadata = MediaMetadata::from_json(&String::from_utf8_lossy(&output.stdout))?;
        debug!(
            "Fetched metadata: {:?}, {:?}s, {} chapters",
            metadata.title,
            metadata.duration,
            metadata.chapters.len()
        );
        Ok(metadata)
    }

    async fn download_audio(
        &self,
        video_id: &str,
        bitrate_kbps: u32,
        output_dir: &Path,
        force: bool,
    ) -> Result<PathBuf> {
        crate::audio::download_audio(&Self::watch_url(video_id), video_id, bitrate_kbps, output_dir, force).await
    }

    async fn download_thumbnail(&self, video_id: &str, output_dir: &Path) -> Result<PathBuf> {
        crate::audio::download_thumbnail(&Self::watch_url(video_id), video_id, output_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        let id = Some("dQw4w9WgXcQ".to_string());

        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=42"), id);
        assert_eq!(extract_video_id("youtube.com/shorts/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://m.youtube.com/embed/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://www.youtube.com/live/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("  dQw4w9WgXcQ "), id);
    }

    #[test]
    fn test_extract_video_id_rejects() {
        assert_eq!(extract_video_id("not-a-video-id"), None);
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("https://example.com/watch?v=dQw4w9WgXcQ"), None);
        assert_eq!(extract_video_id("https://youtube.com/watch?v=short"), None);
        assert_eq!(extract_video_id("https://youtube.com/playlist?list=PLtest"), None);
    }

    #[test]
    fn test_short_link() {
        assert_eq!(short_link("dQw4w9WgXcQ"), "youtu.be/dQw4w9WgXcQ");
    }
}
