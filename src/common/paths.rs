//! Configuration and report paths
//!
//! The platform config directory comes from the directories crate:
//! - Linux: `~/.config/qatools-loadtest/`
//! - macOS: `~/Library/Application Support/qatools-loadtest/`
//! - Windows: `%APPDATA%\qatools-loadtest\`

use std::io;
use std::path::{Path, PathBuf};

/// Name used for the platform config directory
const APP_NAME: &str = "qatools-loadtest";

/// Config file looked up in the working directory before the platform one
pub const LOCAL_CONFIG_FILE: &str = "loadtest.toml";

/// Default destination of the HTML report
pub const DEFAULT_HTML_REPORT: &str = "reports/summary.html";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the platform configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Resolve which config file to load, if any
///
/// An explicit path always wins, even if it does not exist (the caller
/// reports the read error). Otherwise `./loadtest.toml`, then the platform
/// config file, are used when present.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    config_path().filter(|path| path.exists())
}

/// Ensure the parent directory of an output file exists
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}
