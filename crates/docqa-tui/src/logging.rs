//! File logging
//!
//! The terminal belongs to the UI, so log output goes to a file instead of
//! stderr. Level priority: RUST_LOG > --debug > config `log_level` > info.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "info";

pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("docqa").join("docqa.log"))
}

fn build_filter(debug_flag: bool, config_level: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(DEFAULT_LOG_LEVEL)
    }
}

/// Start logging to `log_file`. Returns the path actually used.
pub fn init(debug_flag: bool, config_level: Option<&str>, log_file: Option<&Path>) -> Result<Option<PathBuf>> {
    let Some(path) = log_file.map(Path::to_path_buf).or_else(default_log_path) else {
        return Ok(None);
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(debug_flag, config_level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .compact()
        .init();

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        path = %path.display(),
        "Logging initialised"
    );

    Ok(Some(path))
}
