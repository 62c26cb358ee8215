//! Layered configuration for the Morse player.
//!
//! # Usage
//!
//! ```rust,no_run
//! use morseconf::MorseConfig;
//!
//! let config = MorseConfig::load().expect("Failed to load config");
//! println!("{} WPM at {} Hz", config.keyer.wpm, config.keyer.tone_frequency);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/morse/config.toml` (system)
//! 2. `~/.config/morse/config.toml` (user)
//! 3. `./morse.toml` (local override, or the path given on the command line)
//! 4. Environment variables (`MORSE_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [keyer]
//! wpm = 12
//! farnsworth = true
//! amplitude = 85
//! tone_frequency = 700.0
//!
//! [audio]
//! sample_rate = 44100
//! device = "default"
//! latency_us = 500000
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};
pub use sections::{AudioConfig, KeyerConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Complete player configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MorseConfig {
    #[serde(default)]
    pub keyer: KeyerConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl MorseConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/morse/config.toml`
    /// 3. `~/.config/morse/config.toml`
    /// 4. `./morse.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` standing in for `./morse.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables were used.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = MorseConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_from_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand so every key shows up, in a stable order
        let mut output = String::new();

        output.push_str("# Morse player configuration\n\n");

        output.push_str("[keyer]\n");
        output.push_str(&format!("wpm = {}\n", self.keyer.wpm));
        output.push_str(&format!("farnsworth = {}\n", self.keyer.farnsworth));
        output.push_str(&format!("amplitude = {}\n", self.keyer.amplitude));
        output.push_str(&format!("tone_frequency = {:?}\n", self.keyer.tone_frequency));

        output.push_str("\n[audio]\n");
        output.push_str(&format!("sample_rate = {}\n", self.audio.sample_rate));
        output.push_str(&format!("device = {:?}\n", self.audio.device));
        output.push_str(&format!("latency_us = {}\n", self.audio.latency_us));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = {:?}\n", self.telemetry.log_level));

        output
    }
}
