//! XDG base directories for agora's config file and persistent store.

use crate::error::ApiError;
use std::path::PathBuf;

/// `$XDG_DATA_HOME`, else `$HOME/.local/share`
pub fn data_home() -> Option<PathBuf> {
    if let Ok(xdg_data_home) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data_home.is_empty() {
            return Some(PathBuf::from(xdg_data_home));
        }
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("share"))
}

/// `$XDG_CONFIG_HOME`, else `$HOME/.config`
pub fn config_home() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Some(PathBuf::from(xdg_config_home));
        }
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config"))
}

/// `$XDG_CONFIG_HOME/agora/config.toml`
pub fn global_config_file() -> Option<PathBuf> {
    config_home().map(|dir| dir.join("agora").join("config.toml"))
}

/// Default sled directory: `$XDG_DATA_HOME/agora/store`
pub fn default_store_dir() -> Result<PathBuf, ApiError> {
    data_home()
        .map(|dir| dir.join("agora").join("store"))
        .ok_or_else(|| {
            ApiError::ConfigError(
                "Could not determine XDG data home directory (HOME not set)".to_string(),
            )
        })
}
