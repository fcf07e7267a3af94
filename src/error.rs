//! Error types for ytb2audio.

use thiserror::Error;

/// Library-level error type for ytb2audio operations.
#[derive(Error, Debug)]
pub enum Ytb2AudioError {
    #[error("Invalid duration: {0} seconds (must be positive)")]
    InvalidDuration(i64),

    #[error("Unparseable timecode: {0}")]
    UnparseableTimecode(String),

    #[error("No audio segments left after processing")]
    EmptyScheme,

    #[error("Segment scheme failed verification: {0}")]
    InvalidScheme(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media source error: {0}")]
    VideoSource(String),

    #[error("Media not found: {0}")]
    VideoNotFound(String),

    #[error("Video is a live stream: {0}")]
    LiveStream(String),

    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Subtitles error: {0}")]
    Subtitles(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Ytb2AudioError {
    /// Short status line suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Ytb2AudioError::InvalidDuration(_) => {
                "❌ This video has no usable duration.".to_string()
            }
            Ytb2AudioError::EmptyScheme | Ytb2AudioError::InvalidScheme(_) => {
                "❌ No audio segments could be produced. This is an internal error.".to_string()
            }
            Ytb2AudioError::LiveStream(_) => {
                "❌ This video is live right now. Please try again later.".to_string()
            }
            Ytb2AudioError::MissingMetadata(_) => {
                "❌ No title or duration information available for this video.".to_string()
            }
            Ytb2AudioError::VideoNotFound(_) | Ytb2AudioError::VideoSource(_) => {
                "❌ Unable to fetch information for this video.".to_string()
            }
            Ytb2AudioError::Timeout(_) => {
                "❌ Download took too long and was cancelled.".to_string()
            }
            Ytb2AudioError::AudioDownload(_) => "❌ Failed to download audio.".to_string(),
            Ytb2AudioError::Subtitles(_) => "❌ Subtitles are unavailable for this video.".to_string(),
            Ytb2AudioError::ToolNotFound(tool) => format!("❌ Required tool is missing: {}", tool),
            Ytb2AudioError::InvalidInput(msg) => format!("❌ {}", msg),
            _ => "❌ Something went wrong while processing this video.".to_string(),
        }
    }
}

/// Result type alias for ytb2audio operations.
pub type Result<T> = std::result::Result<T, Ytb2AudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_distinct() {
        let messages = [
            Ytb2AudioError::EmptyScheme.user_message(),
            Ytb2AudioError::Timeout(60).user_message(),
            Ytb2AudioError::MissingMetadata("title".into()).user_message(),
            Ytb2AudioError::LiveStream("abc".into()).user_message(),
        ];

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(!messages[1].contains("60"));
    }
}
