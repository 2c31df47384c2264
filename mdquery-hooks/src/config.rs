//! Hook configuration loading and parsing

use anyhow::{bail, Context, Result};
use mdquery_interposer::BatchingPatch;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Hook configuration (loaded from hooks.toml or hooks.json)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HooksConfig {
    #[serde(default)]
    pub batching: Option<BatchingPatch>,
    #[serde(default)]
    pub creation: CreationConfig,
    #[serde(default)]
    pub library: Option<LibraryConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreationConfig {
    /// Log every created query
    #[serde(default)]
    pub log: bool,
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Hooks exported by a dynamic library as `extern "C"` functions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    pub path: PathBuf,
    pub creation_symbol: Option<String>,
    pub batching_symbol: Option<String>,
}

impl HooksConfig {
    /// Check the configuration before anything gets loaded
    pub fn validate(&self) -> Result<()> {
        if let Some(library) = &self.library {
            if library.creation_symbol.is_none() && library.batching_symbol.is_none() {
                bail!(
                    "Hook library {:?} names neither a creation nor a batching symbol",
                    library.path
                );
            }
            if !library.path.exists() {
                bail!("Hook library not found: {:?}", library.path);
            }
        }
        Ok(())
    }

    /// True if the configuration would install nothing
    pub fn is_empty(&self) -> bool {
        self.batching.map_or(true, |patch| patch.is_empty())
            && !self.creation.log
            && self.library.is_none()
    }
}

/// Load configuration from a TOML or JSON file, chosen by extension
pub fn load_config(path: &Path) -> Result<HooksConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hooks config: {:?}", path))?;

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    let config: HooksConfig = match extension.as_deref() {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Failed to parse hooks config: {:?}", path))?,
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse hooks config: {:?}", path))?,
        _ => bail!("Unsupported hooks config format: {:?}", extension),
    };

    config.validate()?;
    log::debug!("Hooks configuration loaded from {:?}", path);
    Ok(config)
}
