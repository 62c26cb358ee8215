//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, MorseConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/morse/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("morse/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("morse.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Overlay a TOML file onto `config`. Keys the file leaves out keep their
/// current value.
pub fn load_from_file(config: &mut MorseConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    overlay_toml(config, &contents, path)
}

/// Overlay a TOML document onto `config`.
pub(crate) fn overlay_toml(
    config: &mut MorseConfig,
    contents: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let field = Field { path, table: &table };

    if let Some(v) = field.integer("keyer", "wpm")? {
        config.keyer.wpm = v;
    }
    if let Some(v) = field.boolean("keyer", "farnsworth")? {
        config.keyer.farnsworth = v;
    }
    if let Some(v) = field.integer("keyer", "amplitude")? {
        config.keyer.amplitude = v;
    }
    if let Some(v) = field.float("keyer", "tone_frequency")? {
        config.keyer.tone_frequency = v;
    }

    if let Some(v) = field.integer("audio", "sample_rate")? {
        config.audio.sample_rate = v;
    }
    if let Some(v) = field.string("audio", "device")? {
        config.audio.device = v;
    }
    if let Some(v) = field.integer("audio", "latency_us")? {
        config.audio.latency_us = v;
    }

    if let Some(v) = field.string("telemetry", "log_level")? {
        config.telemetry.log_level = v;
    }

    Ok(())
}

/// Typed access to `[section] key` in a parsed file.
struct Field<'a> {
    path: &'a Path,
    table: &'a toml::Table,
}

impl Field<'_> {
    fn get(&self, section: &str, key: &str) -> Option<&toml::Value> {
        self.table
            .get(section)
            .and_then(|v| v.as_table())
            .and_then(|t| t.get(key))
    }

    fn invalid(&self, section: &str, key: &str, expected: &str) -> ConfigError {
        ConfigError::Invalid {
            key: format!("{section}.{key}"),
            message: format!("expected {expected} in {}", self.path.display()),
        }
    }

    fn integer<T: TryFrom<i64>>(&self, section: &str, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get(section, key) {
            None => Ok(None),
            Some(v) => v
                .as_integer()
                .and_then(|n| T::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(section, key, "a non-negative integer")),
        }
    }

    fn float(&self, section: &str, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.get(section, key) {
            None => Ok(None),
            Some(v) => v
                .as_float()
                .or_else(|| v.as_integer().map(|n| n as f64))
                .map(Some)
                .ok_or_else(|| self.invalid(section, key, "a number")),
        }
    }

    fn boolean(&self, section: &str, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.get(section, key) {
            None => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.invalid(section, key, "true or false")),
        }
    }

    fn string(&self, section: &str, key: &str) -> Result<Option<String>, ConfigError> {
        match self.get(section, key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.invalid(section, key, "a string")),
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(
    config: &mut MorseConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_overrides_from(config, sources, |key| env::var(key).ok())
}

/// Apply overrides looked up through `var`, so callers can supply something
/// other than the process environment.
pub fn apply_overrides_from<F>(
    config: &mut MorseConfig,
    sources: &mut ConfigSources,
    var: F,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut seen = |key: &str| {
        let value = var(key);
        if value.is_some() {
            sources.env_overrides.push(key.to_string());
        }
        value
    };

    if let Some(v) = seen("MORSE_WPM") {
        config.keyer.wpm = parse_env("MORSE_WPM", &v)?;
    }
    if let Some(v) = seen("MORSE_FARNSWORTH") {
        config.keyer.farnsworth = parse_flag("MORSE_FARNSWORTH", &v)?;
    }
    if let Some(v) = seen("MORSE_AMPLITUDE") {
        config.keyer.amplitude = parse_env("MORSE_AMPLITUDE", &v)?;
    }
    if let Some(v) = seen("MORSE_TONE_FREQUENCY") {
        config.keyer.tone_frequency = parse_env("MORSE_TONE_FREQUENCY", &v)?;
    }

    if let Some(v) = seen("MORSE_SAMPLE_RATE") {
        config.audio.sample_rate = parse_env("MORSE_SAMPLE_RATE", &v)?;
    }
    if let Some(v) = seen("MORSE_DEVICE") {
        config.audio.device = v;
    }
    if let Some(v) = seen("MORSE_LATENCY_US") {
        config.audio.latency_us = parse_env("MORSE_LATENCY_US", &v)?;
    }

    if let Some(v) = seen("MORSE_LOG_LEVEL") {
        config.telemetry.log_level = v;
    }
    // RUST_LOG wins over everything else
    if let Some(v) = seen("RUST_LOG") {
        config.telemetry.log_level = v;
    }

    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        message: format!("{value:?}: {e}"),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            message: format!("{value:?} is not a boolean"),
        }),
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        let (var_name, rest) = stripped.split_once('/').unwrap_or((stripped, ""));
        if let Ok(var_value) = env::var(var_name) {
            return PathBuf::from(var_value).join(rest);
        }
    }

    PathBuf::from(path)
}
