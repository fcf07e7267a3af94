//! Transcript providers.

use super::TranscriptSnippet;
use crate::error::{Result, Ytb2AudioError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Fetches a transcript for a video in one of the preferred languages.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Vec<TranscriptSnippet>>;
}

/// Downloads subtitles (manual or automatic) as json3 through yt-dlp.
#[derive(Debug, Clone, Default)]
pub struct YtDlpTranscriptProvider;

impl YtDlpTranscriptProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TranscriptProvider for YtDlpTranscriptProvider {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Vec<TranscriptSnippet>> {
        let dir = tempfile::tempdir()?;
        let template = dir.path().join("%(id)s.%(ext)s");
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let result = Command::new("yt-dlp")
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs").arg(languages.join(","))
            .arg("--sub-format").arg("json3")
            .arg("--output").arg(&template)
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(&url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Ytb2AudioError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => return Err(Ytb2AudioError::Subtitles(format!("yt-dlp execution failed: {e}"))),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Ytb2AudioError::Subtitles(format!("yt-dlp failed: {stderr}")));
        }

        read_preferred(dir.path(), video_id, languages)
    }
}

/// Read the first available `<id>.<lang>.json3` in preference order.
fn read_preferred(dir: &Path, video_id: &str, languages: &[String]) -> Result<Vec<TranscriptSnippet>> {
    for lang in languages {
        let path = dir.join(format!("{}.{}.json3", video_id, lang));
        if path.exists() {
            debug!("Using {} transcript", lang);
            return parse_json3(&std::fs::read_to_string(path)?);
        }
    }

    Err(Ytb2AudioError::Subtitles(format!(
        "no transcript in {} for {}",
        languages.join(", "),
        video_id
    )))
}

#[derive(Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse YouTube's json3 caption format into snippets.
///
/// Events without text (window setup, bare newlines) are dropped.
pub fn parse_json3(json: &str) -> Result<Vec<TranscriptSnippet>> {
    let doc: Json3 = serde_json::from_str(json)?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ").trim().to_string();
            (!text.is_empty()).then(|| TranscriptSnippet::new(event.start_ms as f64 / 1000.0, text))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON3: &str = r#"{
        "wireMagic": "pb3",
        "events": [
            {"tStartMs": 0, "dDurationMs": 5000, "id": 1, "wpWinPosId": 1},
            {"tStartMs": 1200, "dDurationMs": 3000, "segs": [{"utf8": "hello"}, {"utf8": " world", "tOffsetMs": 400}]},
            {"tStartMs": 4000, "segs": [{"utf8": "\n"}]},
            {"tStartMs": 65500, "segs": [{"utf8": "second\nline"}]}
        ]
    }"#;

    #[test]
    fn test_parse_json3() {
        let snippets = parse_json3(JSON3).unwrap();
        assert_eq!(
            snippets,
            vec![
                TranscriptSnippet::new(1.2, "hello world"),
                TranscriptSnippet::new(65.5, "second line"),
            ]
        );
    }

    #[test]
    fn test_read_preferred_language() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vid.en.json3"), JSON3).unwrap();

        let languages = vec!["ru".to_string(), "en".to_string()];
        assert_eq!(read_preferred(dir.path(), "vid", &languages).unwrap().len(), 2);

        let only_ru = vec!["ru".to_string()];
        assert!(matches!(
            read_preferred(dir.path(), "vid", &only_ru),
            Err(Ytb2AudioError::Subtitles(_))
        ));
    }
}
