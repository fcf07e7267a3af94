//! Doctor command - verify system requirements and configuration.

use crate::cli::preflight::{required_tools, version_args, Operation};
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("ytb2audio Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    for tool in required_tools(Operation::Process) {
        let check = check_tool(tool, install_hint(tool));
        check.print();
        checks.push(check);
    }

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = [check_config_file(), check_limits(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using ytb2audio.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! ytb2audio is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).args(version_args(name)).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::error(name, "not found", hint),
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check data directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    [("Data directory", settings.data_dir()), ("Temp directory", settings.temp_dir())]
        .into_iter()
        .map(|(name, dir)| {
            if dir.exists() {
                CheckResult::ok(name, &format!("{}", dir.display()))
            } else {
                CheckResult::warning(
                    name,
                    &format!("{} (will be created)", dir.display()),
                    "Directory will be created on first use",
                )
            }
        })
        .collect()
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning("Config file", "using defaults", "Create with: ytb2audio config init")
    }
}

/// Sanity-check the configured limits.
fn check_limits(settings: &Settings) -> CheckResult {
    let seg = &settings.segmentation;
    if !(seg.size_safety_factor > 0.0 && seg.size_safety_factor <= 1.0) {
        return CheckResult::error(
            "Limits",
            &format!("size_safety_factor {} is outside (0, 1]", seg.size_safety_factor),
            "Set segmentation.size_safety_factor to e.g. 0.89",
        );
    }
    if seg.target_seconds == 0 || settings.limits.caption_max_chars < 64 {
        return CheckResult::error(
            "Limits",
            "target part length or caption limit is too small",
            "Check the [segmentation] and [limits] sections",
        );
    }
    if !settings
        .download
        .allowed_bitrates_kbps
        .contains(&settings.download.bitrate_kbps)
    {
        return CheckResult::warning(
            "Limits",
            &format!("default bitrate {}k is not in the allowed list", settings.download.bitrate_kbps),
            "Add it to download.allowed_bitrates_kbps",
        );
    }
    CheckResult::ok(
        "Limits",
        &format!(
            "{} MiB per file, {} caption chars",
            settings.limits.file_size_max_bytes / (1024 * 1024),
            settings.limits.caption_max_chars
        ),
    )
}

/// Platform-specific install hint for a tool.
fn install_hint(tool: &str) -> &'static str {
    match tool {
        "yt-dlp" if cfg!(target_os = "macos") => "Install with: brew install yt-dlp",
        "yt-dlp" if cfg!(target_os = "linux") => "Install with: pip install yt-dlp (or your package manager)",
        "yt-dlp" => "Install from: https://github.com/yt-dlp/yt-dlp",
        _ if cfg!(target_os = "macos") => "Install with: brew install ffmpeg",
        _ if cfg!(target_os = "linux") => "Install with: sudo apt install ffmpeg (or your package manager)",
        _ => "Install from: https://ffmpeg.org/download.html",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_check_limits() {
        let mut settings = Settings::default();
        assert_eq!(check_limits(&settings).status, CheckStatus::Ok);

        settings.download.bitrate_kbps = 100;
        assert_eq!(check_limits(&settings).status, CheckStatus::Warning);

        settings.segmentation.size_safety_factor = 1.5;
        assert_eq!(check_limits(&settings).status, CheckStatus::Error);
    }

    #[test]
    fn test_install_hint_per_tool() {
        assert!(install_hint("yt-dlp").contains("yt-dlp"));
        assert!(install_hint("ffprobe").contains("ffmpeg"));
    }
}
