//! Subtitles command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, SubtitlesOutput};
use anyhow::Result;

/// Run the subtitles command.
pub async fn run_subtitles(input: &str, word: Option<&str>, output: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Subtitles) {
        Output::error(&format!("{}", e));
        Output::info("Run 'ytb2audio doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let save_dir = output
        .map(|o| Settings::expand_path(&o))
        .unwrap_or_else(|| settings.data_dir());

    let orchestrator = Orchestrator::new(settings);
    let spinner = Output::spinner("Fetching subtitles...");
    let result = orchestrator.subtitles(input, word, &save_dir).await;
    spinner.finish_and_clear();

    match result {
        Ok(SubtitlesOutput::Text(text)) => print!("{}", text),
        Ok(SubtitlesOutput::File(path)) => {
            Output::success(&format!("Transcript is long, saved to {}", path.display()));
        }
        Ok(SubtitlesOutput::NothingFound) => Output::warning("Nothing found."),
        Err(e) => {
            Output::error(&e.user_message());
            return Err(e.into());
        }
    }

    Ok(())
}
