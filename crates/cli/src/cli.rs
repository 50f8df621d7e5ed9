use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::{Path, PathBuf};

/// Roundwatch: headless companion for the round log watcher
///
/// Runs the companion state layer against an in-process backend. The store
/// is seeded from a JSON snapshot, pushes and update checks are logged, and
/// SIGUSR1 / SIGUSR2 dump the state or trigger an update check.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// JSON snapshot the backend starts with.
    ///
    /// Without it the backend starts empty.
    #[arg(short, long, value_parser = validate_file)]
    pub snapshot: Option<PathBuf>,

    /// Release version the backend offers to the updater.
    #[arg(short, long, value_parser = validate_version)]
    pub release: Option<String>,

    /// Version this build reports as installed. Overrides the config file.
    #[arg(long, value_parser = validate_version)]
    pub current_version: Option<String>,

    /// Exit after the initial fetch and startup update check.
    #[arg(long)]
    pub once: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.is_file() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

/// Validate a semantic version such as `1.2.0`.
#[inline(always)]
fn validate_version(version: &str) -> Result<String, String> {
    semver::Version::parse(version.trim())
        .map(|version| version.to_string())
        .map_err(|err| format!("`{version}` is not a valid version: {err}"))
}
