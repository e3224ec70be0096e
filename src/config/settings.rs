//! Persisted user settings: provider + API key and the theme flag.
//!
//! The indexing engine never reads these; the CLI loads them and hands the
//! resolved key and provider to title requests.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::EngineConfig;
use crate::title::Provider;
use crate::utils::safe_open_file;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub dark_mode: bool,
    /// Engine overrides; absent fields fall back to the defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineConfig>,
}

impl Settings {
    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = safe_open_file(path)?;
        serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// Writes settings atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }
        let temp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(&temp, json).context("Failed to write settings temp file")?;
        fs::rename(&temp, path).context("Failed to rename settings temp file")?;
        Ok(())
    }

    pub fn engine(&self) -> EngineConfig {
        self.engine.clone().unwrap_or_default()
    }

    /// API key with everything but the first three and last four characters hidden.
    pub fn masked_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask_key)
    }
}

pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 7))
}
