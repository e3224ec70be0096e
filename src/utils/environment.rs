use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Environment variable that overrides the settings file location.
pub const CONFIG_ENV: &str = "TURN_NAVIGATOR_CONFIG";

/// Get the settings file path (`$TURN_NAVIGATOR_CONFIG`, else `<config dir>/turn-navigator/settings.json`)
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().context("Failed to get platform config directory")?;
    Ok(base.join("turn-navigator").join("settings.json"))
}
