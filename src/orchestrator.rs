//! Request orchestrator for ytb2audio.
//!
//! Coordinates one request from URL to audio parts: metadata, download under
//! a timeout, optional slicing, planning, physical splitting and the manifest
//! handed to whatever delivers the parts.

use crate::audio::{bytes_per_second, extract_range, probe_duration, split_ranges, ExtractJob};
use crate::audio_source::{extract_video_id, short_link, MediaMetadata, MediaSource, YoutubeSource};
use crate::config::Settings;
use crate::error::{Result, Ytb2AudioError};
use crate::pipeline::{plan_video, PlanOptions, SliceRange, VideoPlan};
use crate::segmentation::SplitMode;
use crate::subtitles::{render_all, search, SearchOutcome, TranscriptProvider, YtDlpTranscriptProvider};
use crate::timefmt::{format_human, predict_download_seconds};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Name of the manifest written next to the parts.
pub const MANIFEST_FILE: &str = "manifest.json";

/// What the user asked for.
#[derive(Debug, Clone, Default)]
pub struct ProcessRequest {
    /// URL or bare video id.
    pub input: String,
    pub split_mode: SplitMode,
    /// Overrides the configured bitrate.
    pub bitrate_kbps: Option<u32>,
    pub slice: Option<SliceRange>,
    /// Re-download even if the audio is cached.
    pub force: bool,
    /// Where to write the parts; defaults to `<data_dir>/<id>`.
    pub output_dir: Option<PathBuf>,
}

impl ProcessRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }
}

/// One finished audio file with its caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioPart {
    pub index: usize,
    pub path: PathBuf,
    pub filename: String,
    pub caption: String,
    pub start_seconds: u64,
    pub end_seconds: u64,
    pub duration_seconds: u64,
}

/// Everything a messaging transport needs to deliver the parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub duration_seconds: i64,
    pub bitrate_kbps: u32,
    pub split_mode: String,
    /// Cover image for the parts, if one could be fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PathBuf>,
    pub parts: Vec<AudioPart>,
}

/// Result of processing a video.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
}

/// Result of planning without downloading.
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub metadata: MediaMetadata,
    pub plan: VideoPlan,
}

/// How a transcript answer is delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum SubtitlesOutput {
    Text(String),
    /// Too long for one message; saved here instead.
    File(PathBuf),
    NothingFound,
}

/// The main orchestrator.
pub struct Orchestrator {
    settings: Settings,
    source: Arc<dyn MediaSource>,
    transcripts: Arc<dyn TranscriptProvider>,
}

impl Orchestrator {
    /// Create an orchestrator backed by yt-dlp.
    pub fn new(settings: Settings) -> Self {
        Self::with_components(settings, Arc::new(YoutubeSource::new()), Arc::new(YtDlpTranscriptProvider::new()))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        source: Arc<dyn MediaSource>,
        transcripts: Arc<dyn TranscriptProvider>,
    ) -> Self {
        Self {
            settings,
            source,
            transcripts,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn video_id(input: &str) -> Result<String> {
        extract_video_id(input)
            .ok_or_else(|| Ytb2AudioError::InvalidInput(format!("Could not find a YouTube video id in: {}", input)))
    }

    async fn with_timeout<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let secs = self.settings.download.timeout_seconds;
        tokio::time::timeout(Duration::from_secs(secs), fut)
            .await
            .map_err(|_| Ytb2AudioError::Timeout(secs))?
    }

    fn check_request(&self, request: &ProcessRequest) -> Result<u32> {
        if let SplitMode::Duration { minutes } = request.split_mode {
            self.settings.validate_split_minutes(minutes)?;
        }
        let bitrate = request.bitrate_kbps.unwrap_or(self.settings.download.bitrate_kbps);
        self.settings.validate_bitrate(bitrate)?;
        Ok(bitrate)
    }

    fn plan_options(&self, video_id: &str, bitrate: u32, slice: Option<SliceRange>) -> PlanOptions {
        let mut notes = Vec::new();
        if bitrate != self.settings.download.bitrate_kbps {
            notes.push(format!("{}k bitrate", bitrate));
        }
        if let Some(slice) = slice {
            notes.push(slice.note());
        }
        PlanOptions {
            link: Some(short_link(video_id)),
            notes,
            slice,
        }
    }

    /// Plan a video from its metadata without downloading anything.
    ///
    /// The file-size bound is estimated from the bitrate.
    pub fn plan_metadata(&self, metadata: MediaMetadata, request: &ProcessRequest) -> Result<PlanResult> {
        let bitrate = self.check_request(request)?;
        let video = metadata.to_video_metadata()?;

        let estimated_bps = bitrate as f64 * 1000.0 / 8.0;
        let config = self.settings.pipeline_config(request.split_mode, Some(estimated_bps));
        let options = self.plan_options(&video.id, bitrate, request.slice);
        let plan = plan_video(&video, &options, &config)?;

        Ok(PlanResult { metadata, plan })
    }

    /// Fetch metadata for a URL and plan it.
    #[instrument(skip(self, request), fields(input = %request.input))]
    pub async fn plan(&self, request: &ProcessRequest) -> Result<PlanResult> {
        let video_id = Self::video_id(&request.input)?;
        let metadata = self.with_timeout(self.source.fetch_metadata(&video_id)).await?;
        self.plan_metadata(metadata, request)
    }

    /// Fetch and validate the metadata of the requested video.
    #[instrument(skip(self, request), fields(input = %request.input))]
    pub async fn fetch(&self, request: &ProcessRequest) -> Result<MediaMetadata> {
        let video_id = Self::video_id(&request.input)?;
        self.check_request(request)?;

        info!("Fetching metadata for {}", video_id);
        let metadata = self.with_timeout(self.source.fetch_metadata(&video_id)).await?;
        metadata.to_video_metadata()?;
        metadata.check_downloadable()?;
        Ok(metadata)
    }

    /// Rough time the download of this video will take.
    pub fn download_estimate(metadata: &MediaMetadata) -> Option<u64> {
        metadata
            .duration
            .filter(|d| *d > 0.0)
            .map(|d| predict_download_seconds(d as u64))
    }

    /// Download, plan and split one video.
    pub async fn process(&self, request: &ProcessRequest) -> Result<ProcessResult> {
        let metadata = self.fetch(request).await?;
        self.process_metadata(metadata, request).await
    }

    /// Download, plan and split a video whose metadata is already fetched.
    #[instrument(skip(self, metadata, request), fields(video_id = %metadata.id))]
    pub async fn process_metadata(&self, metadata: MediaMetadata, request: &ProcessRequest) -> Result<ProcessResult> {
        let bitrate = self.check_request(request)?;
        let video = metadata.to_video_metadata()?;
        metadata.check_downloadable()?;
        let video_id = video.id.clone();
        if let Some(slice) = request.slice {
            if slice.end_seconds > video.duration_seconds as u64 {
                return Err(Ytb2AudioError::InvalidInput(format!(
                    "Slice ends after the video ({}s)",
                    video.duration_seconds
                )));
            }
        }

        if let Some(predicted) = Self::download_estimate(&metadata) {
            info!("Downloading, expected to take ~{}", format_human(predicted));
        }

        let data_dir = self.settings.data_dir();
        let (source_audio, thumbnail) = self.download(&video_id, bitrate, &data_dir, request.force).await?;

        let working_audio = match request.slice {
            Some(slice) => {
                let sliced = self.slice_path(&video_id, bitrate, &slice);
                if let Some(parent) = sliced.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                extract_range(&source_audio, &sliced, slice.start_seconds, slice.end_seconds).await?;
                sliced
            }
            None => source_audio.clone(),
        };

        let measured = probe_duration(&working_audio).await?;
        let bps = bytes_per_second(&working_audio, measured).await?;

        let config = self.settings.pipeline_config(request.split_mode, bps);
        let options = self.plan_options(&video_id, bitrate, request.slice);
        let plan = plan_video(&video, &options, &config)?;

        let output_dir = request
            .output_dir
            .clone()
            .unwrap_or_else(|| data_dir.join(&video_id));
        tokio::fs::create_dir_all(&output_dir).await?;

        let parts = self.split_parts(&working_audio, &output_dir, &video_id, &plan).await?;

        let thumbnail_out = match &thumbnail {
            Some(path) => copy_into(path, &output_dir).await,
            None => None,
        };

        let manifest = Manifest {
            video_id: video_id.clone(),
            title: video.title.clone(),
            author: video.author.clone(),
            duration_seconds: video.duration_seconds,
            bitrate_kbps: bitrate,
            split_mode: request.split_mode.to_string(),
            thumbnail: thumbnail_out,
            parts,
        };
        let manifest_path = write_manifest(&output_dir, &manifest).await?;

        if !self.settings.general.keep_files {
            let mut leftovers = vec![source_audio.as_path(), working_audio.as_path()];
            if let Some(path) = &thumbnail {
                leftovers.push(path.as_path());
            }
            cleanup(&leftovers).await;
        }

        Ok(ProcessResult {
            manifest,
            manifest_path,
        })
    }

    /// Download the audio and the thumbnail side by side under one timeout.
    ///
    /// A missing thumbnail is logged and otherwise ignored.
    async fn download(
        &self,
        video_id: &str,
        bitrate: u32,
        data_dir: &Path,
        force: bool,
    ) -> Result<(PathBuf, Option<PathBuf>)> {
        self.with_timeout(async {
            let (audio, thumbnail) = tokio::join!(
                self.source.download_audio(video_id, bitrate, data_dir, force),
                self.source.download_thumbnail(video_id, data_dir),
            );
            let thumbnail = match thumbnail {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("No thumbnail for {}: {}", video_id, e);
                    None
                }
            };
            Ok::<_, Ytb2AudioError>((audio?, thumbnail))
        })
        .await
    }

    /// Where the sliced copy of the source audio is written.
    fn slice_path(&self, video_id: &str, bitrate: u32, slice: &SliceRange) -> PathBuf {
        self.settings.temp_dir().join(format!(
            "{}-{}-slice-{}-{}.m4a",
            video_id, bitrate, slice.start_seconds, slice.end_seconds
        ))
    }

    async fn split_parts(
        &self,
        source: &Path,
        output_dir: &Path,
        video_id: &str,
        plan: &VideoPlan,
    ) -> Result<Vec<AudioPart>> {
        let suffix = format!("{}.m4a", video_id);
        let filenames = plan.part_filenames(&suffix, self.settings.limits.filename_max_chars);

        let paths = if plan.segments.len() == 1 {
            let dest = output_dir.join(&filenames[0]);
            tokio::fs::copy(source, &dest).await?;
            vec![dest]
        } else {
            let jobs = filenames
                .iter()
                .zip(&plan.segments)
                .map(|(filename, segment)| ExtractJob {
                    start_seconds: segment.padded_start,
                    end_seconds: segment.padded_end,
                    dest: output_dir.join(filename),
                })
                .collect();
            split_ranges(source, jobs, self.settings.download.max_concurrent_splits).await?
        };

        Ok(filenames
            .into_iter()
            .zip(&plan.segments)
            .zip(paths)
            .map(|((filename, segment), path)| AudioPart {
                index: segment.index,
                path,
                filename,
                caption: segment.caption.clone(),
                start_seconds: segment.start_seconds,
                end_seconds: segment.end_seconds,
                duration_seconds: segment.duration(),
            })
            .collect())
    }

    /// Fetch a transcript and optionally search it for a word.
    ///
    /// Text longer than the message limit is written to `save_dir`.
    #[instrument(skip(self, save_dir))]
    pub async fn subtitles(&self, input: &str, word: Option<&str>, save_dir: &Path) -> Result<SubtitlesOutput> {
        let video_id = Self::video_id(input)?;
        let snippets = self
            .with_timeout(self.transcripts.fetch(&video_id, &self.settings.subtitles.languages))
            .await?;

        let text = match word.map(str::trim).filter(|w| !w.is_empty()) {
            Some(word) => match search(&snippets, word, self.settings.subtitles.context_rows) {
                SearchOutcome::Found(text) => text,
                SearchOutcome::NothingFound => return Ok(SubtitlesOutput::NothingFound),
            },
            None => render_all(&snippets),
        };

        if text.chars().count() <= self.settings.limits.message_max_chars {
            return Ok(SubtitlesOutput::Text(text));
        }

        tokio::fs::create_dir_all(save_dir).await?;
        let path = save_dir.join(format!("subtitles-{}.txt", video_id));
        tokio::fs::write(&path, text).await?;
        info!("Transcript too long for a message, saved to {:?}", path);
        Ok(SubtitlesOutput::File(path))
    }
}

/// Copy a file next to the parts, returning the new path.
async fn copy_into(path: &Path, dir: &Path) -> Option<PathBuf> {
    let dest = dir.join(path.file_name()?);
    match tokio::fs::copy(path, &dest).await {
        Ok(_) => Some(dest),
        Err(e) => {
            warn!("Failed to copy {:?}: {}", path, e);
            None
        }
    }
}

async fn write_manifest(output_dir: &Path, manifest: &Manifest) -> Result<PathBuf> {
    let path = output_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(manifest)?;
    tokio::fs::write(&path, json).await?;
    Ok(path)
}

async fn cleanup(paths: &[&Path]) {
    for path in paths {
        if path.exists() {
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!("Failed to cleanup {:?}: {}", path, e);
            }
        }
    }
}
