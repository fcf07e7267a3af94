//! Audio download through yt-dlp.

use crate::error::{Result, Ytb2AudioError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// File name of the cached source audio for a video at a bitrate.
pub fn cached_audio_name(video_id: &str, bitrate_kbps: u32) -> String {
    format!("{}-{}.m4a", video_id, bitrate_kbps)
}

/// Download the audio track of a video as m4a at the given bitrate.
///
/// An existing `<id>-<bitrate>.m4a` in `output_dir` is reused unless `force`
/// is set.
#[instrument(skip(output_dir), fields(video_id = %video_id))]
pub async fn download_audio(
    url: &str,
    video_id: &str,
    bitrate_kbps: u32,
    output_dir: &Path,
    force: bool,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;

    let target_path = output_dir.join(cached_audio_name(video_id, bitrate_kbps));

    if target_path.exists() && !force {
        info!("Using cached audio file");
        return Ok(target_path);
    }

    info!("Downloading audio from {} at {}k", url, bitrate_kbps);

    let stem = format!("{}-{}", video_id, bitrate_kbps);
    let template = output_dir.join(format!("{}.%(ext)s", stem));

    let mut command = Command::new("yt-dlp");
    command
        .arg("--format").arg("bestaudio[ext=m4a]/bestaudio")
        .arg("--extract-audio")
        .arg("--audio-format").arg("m4a")
        .arg("--audio-quality").arg(format!("{}K", bitrate_kbps))
        .arg("--output").arg(&template)
        .arg("--no-playlist")
        .arg("--force-overwrites")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(url);
    run_yt_dlp(command).await?;

    let downloaded = find_audio_file(output_dir, &stem)?;
    if downloaded != target_path {
        debug!("Renaming {:?} to {:?}", downloaded, target_path);
        tokio::fs::rename(&downloaded, &target_path).await?;
    }

    Ok(target_path)
}

/// File name of the cached thumbnail for a video.
pub fn thumbnail_name(video_id: &str) -> String {
    format!("{}-thumbnail.jpg", video_id)
}

/// Download the video thumbnail as `<id>-thumbnail.jpg`, reusing a cached one.
#[instrument(skip(output_dir), fields(video_id = %video_id))]
pub async fn download_thumbnail(url: &str, video_id: &str, output_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;

    let target_path = output_dir.join(thumbnail_name(video_id));
    if target_path.exists() {
        debug!("Using cached thumbnail");
        return Ok(target_path);
    }

    let template = output_dir.join(format!("{}-thumbnail.%(ext)s", video_id));

    let mut command = Command::new("yt-dlp");
    command
        .arg("--write-thumbnail")
        .arg("--skip-download")
        .arg("--convert-thumbnails").arg("jpg")
        .arg("--output").arg(&template)
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(url);
    run_yt_dlp(command).await?;

    if !target_path.exists() {
        return Err(Ytb2AudioError::AudioDownload("Thumbnail not found after download".into()));
    }
    Ok(target_path)
}

async fn run_yt_dlp(mut command: Command) -> Result<()> {
    let result = command
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Ytb2AudioError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(Ytb2AudioError::AudioDownload(format!("yt-dlp execution failed: {e}")));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Ytb2AudioError::AudioDownload(format!("yt-dlp failed: {stderr}")));
    }
    Ok(())
}

/// Locate a downloaded audio file by its stem.
fn find_audio_file(dir: &Path, stem: &str) -> Result<PathBuf> {
    for ext in &["m4a", "mp4", "opus", "webm", "ogg", "mp3"] {
        let candidate = dir.join(format!("{}.{}", stem, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(Ytb2AudioError::AudioDownload("Audio file not found after download".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_audio_name() {
        assert_eq!(cached_audio_name("dQw4w9WgXcQ", 48), "dQw4w9WgXcQ-48.m4a");
    }

    #[tokio::test]
    async fn test_cached_file_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let cached = dir.path().join(cached_audio_name("abc123def45", 64));
        std::fs::write(&cached, b"audio").unwrap();

        let path = download_audio("https://youtu.be/abc123def45", "abc123def45", 64, dir.path(), false)
            .await
            .unwrap();
        assert_eq!(path, cached);
    }

    #[tokio::test]
    async fn test_cached_thumbnail_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let cached = dir.path().join(thumbnail_name("abc123def45"));
        std::fs::write(&cached, b"jpeg").unwrap();

        let path = download_thumbnail("https://youtu.be/abc123def45", "abc123def45", dir.path())
            .await
            .unwrap();
        assert_eq!(path, cached);
        assert!(path.ends_with("abc123def45-thumbnail.jpg"));
    }

    #[test]
    fn test_find_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vid-48.webm"), b"x").unwrap();
        let found = find_audio_file(dir.path(), "vid-48").unwrap();
        assert!(found.ends_with("vid-48.webm"));
        assert!(find_audio_file(dir.path(), "other-48").is_err());
    }
}
