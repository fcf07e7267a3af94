//! CLI command implementations.

mod config;
mod doctor;
mod plan;
mod process;
mod subtitles;

pub use config::run_config;
pub use doctor::run_doctor;
pub use plan::run_plan;
pub use process::run_process;
pub use subtitles::run_subtitles;
