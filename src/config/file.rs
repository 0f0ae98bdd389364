//! TOML configuration file loading
//!
//! Supports `~/.config/voice-qa/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Answer service configuration
    #[serde(default)]
    pub service: ServiceFileConfig,

    /// Speech recognition configuration
    #[serde(default)]
    pub recognition: RecognitionFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub synthesis: SynthesisFileConfig,
}

/// Answer service configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServiceFileConfig {
    /// Origin of the answer service (e.g. "http://localhost:3000")
    pub base_url: Option<String>,
}

/// Speech recognition configuration
#[derive(Debug, Default, Deserialize)]
pub struct RecognitionFileConfig {
    /// Recognizer command, run under `sh -c`
    pub command: Option<String>,

    /// Language tag (e.g. "en-US")
    pub locale: Option<String>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct SynthesisFileConfig {
    /// Enable spoken answers
    pub enabled: Option<bool>,

    /// Speech command, run under `sh -c`
    pub command: Option<String>,
}

/// Parse a config file's contents
///
/// # Errors
///
/// Returns error if the contents are not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load an explicitly requested config file
///
/// # Errors
///
/// Returns error if the file can't be read or parsed
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config_file(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/voice-qa/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-qa").join("config.toml"))
}
