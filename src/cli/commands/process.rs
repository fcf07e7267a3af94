//! Process command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, SplitArgs};
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, ProcessRequest};
use crate::timefmt::format_human;
use anyhow::Result;
use std::path::Path;

/// Run the process command.
pub async fn run_process(
    input: &str,
    split: &SplitArgs,
    output: Option<String>,
    force: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Process) {
        Output::error(&format!("{}", e));
        Output::info("Run 'ytb2audio doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    Output::info(&format!("Processing: {}", input));

    let request = ProcessRequest {
        input: input.to_string(),
        split_mode: split.split_mode(),
        bitrate_kbps: split.bitrate,
        slice: split.slice,
        force,
        output_dir: output.map(|o| Settings::expand_path(&o)),
    };

    let orchestrator = Orchestrator::new(settings);
    let spinner = Output::spinner("Fetching metadata...");
    let metadata = orchestrator.fetch(&request).await;
    spinner.finish_and_clear();

    let metadata = match metadata {
        Ok(metadata) => metadata,
        Err(e) => {
            Output::error(&e.user_message());
            return Err(e.into());
        }
    };

    if let Some(predicted) = Orchestrator::download_estimate(&metadata) {
        Output::info(&format!("Download expected to take ~{}", format_human(predicted)));
    }

    let spinner = Output::spinner("Downloading and splitting...");
    let result = orchestrator.process_metadata(metadata, &request).await;
    spinner.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&e.user_message());
            return Err(e.into());
        }
    };

    let manifest = &result.manifest;
    Output::success(&format!(
        "'{}' ({}) split into {} part(s)",
        manifest.title,
        format_human(manifest.duration_seconds.max(0) as u64),
        manifest.parts.len()
    ));
    for part in &manifest.parts {
        Output::kv(&format!("Part {}", part.index), &display_path(&part.path));
    }
    if let Some(thumbnail) = &manifest.thumbnail {
        Output::kv("Thumbnail", &display_path(thumbnail));
    }
    Output::kv("Manifest", &display_path(&result.manifest_path));

    Ok(())
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
