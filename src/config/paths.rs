//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MOVE_PLAYGROUND_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    dirs::config_dir()
        .map(|d| d.join("move-playground"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("move-playground"))
                .unwrap_or_else(|| PathBuf::from(".move-playground"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("MOVE_PLAYGROUND_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("config.json")
}
