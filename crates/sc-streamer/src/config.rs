use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub capture: CaptureSettings,
    pub stats: StatsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Screen index to capture; out-of-range values fall back to 0.
    pub monitor: usize,
    /// Capture loop rate in ticks per second.
    pub fps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSettings {
    pub report_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureSettings {
                monitor: 0,
                fps: 30,
            },
            stats: StatsSettings {
                report_interval_secs: 10,
            },
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture.fps == 0 || self.capture.fps > 240 {
            anyhow::bail!("Invalid capture rate (must be 1-240 fps)");
        }

        if self.stats.report_interval_secs == 0 {
            anyhow::bail!("Invalid stats interval");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_fps_rejected() {
        let mut config = Config::default();
        config.capture.fps = 0;
        assert!(config.validate().is_err());

        config.capture.fps = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.capture.monitor = 1;
        config.capture.fps = 60;

        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.capture.monitor, 1);
        assert_eq!(parsed.capture.fps, 60);
        assert_eq!(parsed.stats.report_interval_secs, 10);
    }
}
