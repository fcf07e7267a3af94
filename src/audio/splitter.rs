//! Probing and cutting audio with ffprobe/ffmpeg.

use crate::error::{Result, Ytb2AudioError};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// One range of the source to write to `dest`.
#[derive(Debug, Clone)]
pub struct ExtractJob {
    pub start_seconds: u64,
    pub end_seconds: u64,
    pub dest: PathBuf,
}

/// Cut `[start, end)` out of `source` into `dest`.
///
/// Stream copy is tried first; if that fails the range is re-encoded to AAC.
pub async fn extract_range(source: &Path, dest: &Path, start_seconds: u64, end_seconds: u64) -> Result<()> {
    let length = end_seconds.saturating_sub(start_seconds);

    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(start_seconds.to_string())
        .arg("-i").arg(source)
        .arg("-t").arg(length.to_string())
        .arg("-vn")
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match copy_result {
        Ok(status) if status.success() && dest.exists() => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Ytb2AudioError::ToolNotFound("ffmpeg".into()));
        }
        _ => {}
    }

    warn!("Stream copy failed, re-encoding range {}-{}", start_seconds, end_seconds);

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(start_seconds.to_string())
        .arg("-i").arg(source)
        .arg("-t").arg(length.to_string())
        .arg("-vn")
        .arg("-codec:a").arg("aac")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(Ytb2AudioError::ToolFailed(format!("ffmpeg extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Ytb2AudioError::ToolNotFound("ffmpeg".into())),
        Err(e) => Err(Ytb2AudioError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Run extraction jobs with at most `max_concurrent` ffmpeg processes.
///
/// Output paths are returned in job order. The first failure aborts the batch.
#[instrument(skip_all, fields(jobs = jobs.len()))]
pub async fn split_ranges(source: &Path, jobs: Vec<ExtractJob>, max_concurrent: usize) -> Result<Vec<PathBuf>> {
    let job_count = jobs.len();
    let pb = ProgressBar::new(job_count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.green} Splitting [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );

    let mut stream = stream::iter(jobs)
        .map(|job| {
            let pb = pb.clone();
            async move {
                let result = extract_range(source, &job.dest, job.start_seconds, job.end_seconds).await;
                pb.inc(1);
                result.map(|_| job.dest)
            }
        })
        .buffered(max_concurrent.max(1));

    let mut paths = Vec::with_capacity(job_count);
    while let Some(result) = stream.next().await {
        match result {
            Ok(path) => {
                debug!("Wrote {:?}", path);
                paths.push(path);
            }
            Err(e) => {
                pb.finish_and_clear();
                return Err(e);
            }
        }
    }

    pb.finish_and_clear();
    info!("Created {} audio parts", paths.len());
    Ok(paths)
}

/// Query the duration of an audio file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Ytb2AudioError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(Ytb2AudioError::ToolFailed(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(Ytb2AudioError::ToolFailed("ffprobe returned error".into()));
    }

    parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_duration(json_str: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|_| Ytb2AudioError::ToolFailed("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| Ytb2AudioError::ToolFailed("Could not determine audio duration".into()))
}

/// Size of the file per second of play time.
pub async fn bytes_per_second(path: &Path, duration_seconds: f64) -> Result<Option<f64>> {
    let size = tokio::fs::metadata(path).await?.len();
    if duration_seconds <= 0.0 || size == 0 {
        return Ok(None);
    }
    Ok(Some(size as f64 / duration_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_duration() {
        let json = r#"{"format": {"filename": "a.m4a", "duration": "125.432000"}}"#;
        assert!((parse_probe_duration(json).unwrap() - 125.432).abs() < 1e-9);

        assert!(parse_probe_duration(r#"{"format": {}}"#).is_err());
        assert!(parse_probe_duration("not json").is_err());
    }

    #[tokio::test]
    async fn test_bytes_per_second() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.m4a");
        std::fs::write(&path, vec![0u8; 6000]).unwrap();

        assert_eq!(bytes_per_second(&path, 10.0).await.unwrap(), Some(600.0));
        assert_eq!(bytes_per_second(&path, 0.0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_ranges_empty() {
        let dir = tempfile::tempdir().unwrap();
        let paths = split_ranges(&dir.path().join("missing.m4a"), Vec::new(), 2).await.unwrap();
        assert!(paths.is_empty());
    }
}
