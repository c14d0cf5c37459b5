//! Scheduler configuration.
//!
//! Loaded from TOML or YAML (format picked by file extension) or built from
//! a preset.

use crate::error::{StriderError, StriderResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tick timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Fixed control period in milliseconds
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    /// Stop after this many ticks (None = run until stopped)
    #[serde(default)]
    pub max_ticks: Option<u64>,
    /// Sleep between ticks in `run`; off for simulations that should go as fast as possible
    #[serde(default = "default_true")]
    pub realtime: bool,
}

fn default_period_ms() -> u64 {
    20
}

fn default_true() -> bool {
    true
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            max_ticks: None,
            realtime: true,
        }
    }
}

/// Log verbosity switches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit a debug event for every initialize / end
    #[serde(default)]
    pub log_lifecycle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_name() -> String {
    "strider".to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl SchedulerConfig {
    /// 50 Hz real-time control loop
    pub fn standard() -> Self {
        Self {
            name: default_name(),
            timing: TimingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Same logical period, no sleeping, lifecycle events logged
    pub fn simulation() -> Self {
        Self {
            name: "strider-sim".to_string(),
            timing: TimingConfig {
                realtime: false,
                ..TimingConfig::default()
            },
            logging: LoggingConfig {
                log_lifecycle: true,
            },
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.timing.period_ms)
    }

    pub fn validate(&self) -> StriderResult<()> {
        if self.timing.period_ms == 0 {
            return Err(StriderError::config("timing.period_ms must be positive"));
        }
        if self.timing.max_ticks == Some(0) {
            return Err(StriderError::config("timing.max_ticks must be positive when set"));
        }
        Ok(())
    }

    /// Load a config file, picking the format from the extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> StriderResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml(&contents)?,
            Some("yaml") | Some("yml") => Self::from_yaml(&contents)?,
            _ => Self::from_toml(&contents).or_else(|_| Self::from_yaml(&contents))?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> StriderResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_yaml(contents: &str) -> StriderResult<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let standard = SchedulerConfig::standard();
        assert_eq!(standard.period(), Duration::from_millis(20));
        assert!(standard.timing.realtime);

        let sim = SchedulerConfig::simulation();
        assert!(!sim.timing.realtime);
        assert!(sim.logging.log_lifecycle);
        assert!(sim.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SchedulerConfig::from_toml("[timing]\nmax_ticks = 750\n").unwrap();
        assert_eq!(config.timing.period_ms, 20);
        assert_eq!(config.timing.max_ticks, Some(750));
        assert_eq!(config.name, "strider");
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = SchedulerConfig::from_yaml("timing:\n  period_ms: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(StriderError::Config(_))));
    }
}
