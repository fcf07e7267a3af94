//! Plan command - show the parts a video would be split into.

use crate::audio_source::MediaMetadata;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, SplitArgs};
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, PlanResult, ProcessRequest};
use crate::timefmt::format_human;
use anyhow::Result;
use std::path::Path;

/// Run the plan command.
pub async fn run_plan(
    input: Option<&str>,
    info_json: Option<&str>,
    split: &SplitArgs,
    json: bool,
    settings: Settings,
) -> Result<()> {
    let operation = if info_json.is_some() {
        Operation::PlanOffline
    } else {
        Operation::Plan
    };
    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        Output::info("Run 'ytb2audio doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings);
    let mut request = ProcessRequest {
        split_mode: split.split_mode(),
        bitrate_kbps: split.bitrate,
        slice: split.slice,
        ..ProcessRequest::default()
    };

    let result = match (info_json, input) {
        (Some(path), _) => {
            let metadata = MediaMetadata::from_info_file(Path::new(path))?;
            orchestrator.plan_metadata(metadata, &request)
        }
        (None, Some(input)) => {
            request.input = input.to_string();
            let spinner = Output::spinner("Fetching video info...");
            let result = orchestrator.plan(&request).await;
            spinner.finish_and_clear();
            result
        }
        (None, None) => return Err(anyhow::anyhow!("Either a URL or --info-json is required")),
    };

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&e.user_message());
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result.plan.segments)?);
        return Ok(());
    }

    print_plan(&result, &request);
    Ok(())
}

fn print_plan(result: &PlanResult, request: &ProcessRequest) {
    let meta = &result.metadata;
    Output::header(meta.title.as_deref().unwrap_or(&meta.id));
    Output::kv("Video", &meta.id);
    if let Some(author) = &meta.uploader {
        Output::kv("Author", author);
    }
    Output::kv("Duration", &format_human(result.plan.scheme.total_duration));
    Output::kv("Mode", &request.split_mode.to_string());
    Output::kv("Timecodes", &result.plan.timecodes.len().to_string());

    for segment in &result.plan.segments {
        Output::part(segment.index, segment.start_seconds, segment.end_seconds, &segment.caption);
    }
    println!();
    Output::success(&format!("{} part(s)", result.plan.segments.len()));
}
