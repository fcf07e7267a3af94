//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools are available before starting operations
//! that would otherwise fail midway.

use crate::error::{Result, Ytb2AudioError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching metadata needs yt-dlp.
    Plan,
    /// Downloading and splitting needs yt-dlp, ffmpeg and ffprobe.
    Process,
    /// Transcripts come through yt-dlp.
    Subtitles,
    /// Planning from a saved info file needs nothing.
    PlanOffline,
}

/// Tools an operation needs, in check order.
pub fn required_tools(operation: Operation) -> &'static [&'static str] {
    match operation {
        Operation::Plan | Operation::Subtitles => &["yt-dlp"],
        Operation::Process => &["yt-dlp", "ffmpeg", "ffprobe"],
        Operation::PlanOffline => &[],
    }
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    for tool in required_tools(operation) {
        check_tool(tool)?;
    }
    Ok(())
}

/// Arguments that make a tool print its version.
pub fn version_args(name: &str) -> &'static [&'static str] {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    match name {
        "ffmpeg" | "ffprobe" => &["-version"],
        _ => &["--version"],
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).args(version_args(name)).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(Ytb2AudioError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Ytb2AudioError::ToolNotFound(name.to_string())),
        Err(e) => Err(Ytb2AudioError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
