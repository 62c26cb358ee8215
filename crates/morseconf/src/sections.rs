//! Config sections and their compiled defaults.

use serde::{Deserialize, Serialize};

/// How the text is keyed: speed, spacing, volume and pitch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyerConfig {
    /// Words per minute, clamped by the session to 5..=60.
    /// Default: 18
    #[serde(default = "KeyerConfig::default_wpm")]
    pub wpm: u32,

    /// Farnsworth spacing below 18 WPM.
    /// Default: false
    #[serde(default)]
    pub farnsworth: bool,

    /// Volume in percent.
    /// Default: 85
    #[serde(default = "KeyerConfig::default_amplitude")]
    pub amplitude: u32,

    /// Tone pitch in Hz.
    /// Default: 800.0
    #[serde(default = "KeyerConfig::default_tone_frequency")]
    pub tone_frequency: f64,
}

impl KeyerConfig {
    fn default_wpm() -> u32 {
        18
    }

    fn default_amplitude() -> u32 {
        85
    }

    fn default_tone_frequency() -> f64 {
        800.0
    }
}

impl Default for KeyerConfig {
    fn default() -> Self {
        Self {
            wpm: Self::default_wpm(),
            farnsworth: false,
            amplitude: Self::default_amplitude(),
            tone_frequency: Self::default_tone_frequency(),
        }
    }
}

/// Playback device settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Default: 44100
    #[serde(default = "AudioConfig::default_sample_rate")]
    pub sample_rate: u32,

    /// ALSA PCM name.
    /// Default: "default"
    #[serde(default = "AudioConfig::default_device")]
    pub device: String,

    /// Requested device buffer length in microseconds.
    /// Default: 500000
    #[serde(default = "AudioConfig::default_latency_us")]
    pub latency_us: u64,
}

impl AudioConfig {
    fn default_sample_rate() -> u32 {
        44100
    }

    fn default_device() -> String {
        "default".to_string()
    }

    fn default_latency_us() -> u64 {
        500_000
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: Self::default_sample_rate(),
            device: Self::default_device(),
            latency_us: Self::default_latency_us(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive for the log subscriber.
    /// Default: "info"
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let keyer = KeyerConfig::default();
        assert_eq!(keyer.wpm, 18);
        assert!(!keyer.farnsworth);
        assert_eq!(keyer.amplitude, 85);
        assert_eq!(keyer.tone_frequency, 800.0);

        let audio = AudioConfig::default();
        assert_eq!(audio.sample_rate, 44100);
        assert_eq!(audio.device, "default");
        assert_eq!(audio.latency_us, 500_000);

        assert_eq!(TelemetryConfig::default().log_level, "info");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let keyer: KeyerConfig = toml::from_str("wpm = 25").unwrap();
        assert_eq!(keyer.wpm, 25);
        assert_eq!(keyer.amplitude, 85);
    }
}
