//! Configuration management for voice-qa
//!
//! Values resolve as `env > config file > defaults`. Command line flags are
//! applied on top by the binary.

pub mod file;

use std::fmt;
use std::path::Path;

use url::Url;

use crate::{Error, Result};
use crate::dispatch::endpoint_url;
use crate::voice::stt::DEFAULT_LOCALE;
use file::ConfigFile;

/// Default origin of the answer service
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// voice-qa configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin of the answer service
    pub base_url: String,

    /// Resolved answer endpoint (`<origin>/api/gemini`)
    pub endpoint: Url,

    /// Speech recognition configuration
    pub recognition: RecognitionConfig,

    /// Speech synthesis configuration
    pub synthesis: SynthesisConfig,
}

/// Speech recognition configuration
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Recognizer command, if any
    pub command: Option<String>,

    /// Language tag
    pub locale: String,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Speak answers aloud
    pub enabled: bool,

    /// Speech command, if any
    pub command: Option<String>,
}

impl Config {
    /// Load configuration from the environment and config file
    ///
    /// With `path` the given file must exist and parse; otherwise the standard
    /// location is used when present, and a broken file falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file can't be loaded or the
    /// service URL is invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(path) => file::read_config_file(path)?,
            None => file::load_config_file(),
        };

        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the service URL is invalid or a flag is malformed
    pub fn from_sources(fc: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = env("VOICE_QA_BASE_URL")
            .or(fc.service.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let endpoint = endpoint_url(&base_url)?;

        let recognition = RecognitionConfig {
            command: env("VOICE_QA_STT_COMMAND")
                .or(fc.recognition.command)
                .filter(|c| !c.trim().is_empty()),
            locale: env("VOICE_QA_LOCALE")
                .or(fc.recognition.locale)
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
        };

        let synthesis = SynthesisConfig {
            enabled: env("VOICE_QA_TTS_ENABLED")
                .map(|v| parse_flag("VOICE_QA_TTS_ENABLED", &v))
                .transpose()?
                .or(fc.synthesis.enabled)
                .unwrap_or(true),
            command: env("VOICE_QA_TTS_COMMAND")
                .or(fc.synthesis.command)
                .filter(|c| !c.trim().is_empty()),
        };

        Ok(Self {
            base_url,
            endpoint,
            recognition,
            synthesis,
        })
    }

    /// Point at a different answer service
    ///
    /// # Errors
    ///
    /// Returns error if `base_url` is not a valid absolute URL
    pub fn set_base_url(&mut self, base_url: &str) -> Result<()> {
        self.endpoint = endpoint_url(base_url)?;
        self.base_url = base_url.to_string();
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{key} must be true or false, got {other:?}"))),
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "endpoint:           {}", self.endpoint)?;
        writeln!(
            f,
            "recognizer:         {}",
            self.recognition.command.as_deref().unwrap_or("(none)")
        )?;
        writeln!(f, "locale:             {}", self.recognition.locale)?;
        writeln!(f, "speech enabled:     {}", self.synthesis.enabled)?;
        write!(
            f,
            "speech command:     {}",
            self.synthesis.command.as_deref().unwrap_or("(none)")
        )
    }
}
