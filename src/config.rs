//! # Configuration Management
//!
//! This module handles loading and validating configuration from the rain-led.toml
//! file. It provides a centralized way to configure the forecast service, decision
//! threshold, refresh schedule, and GPIO pin assignments.
//!
//! The configuration is immutable once loaded: `main` builds one [`Config`] and moves
//! the pieces each component needs into it.

use crate::clock::RefreshPeriod;
use crate::error::ConfigError;
use crate::forecast::{Horizon, MAX_HOURLY_SAMPLES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "rain-led.toml";

/// Environment variable that overrides `forecast.api_key`
pub const API_KEY_ENV: &str = "RAIN_LED_API_KEY";

/// Application configuration loaded from rain-led.toml
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Forecast service configuration
    pub forecast: ForecastConfig,
    /// Rain decision configuration
    pub decision: DecisionConfig,
    /// Refresh and polling schedule
    pub schedule: ScheduleConfig,
    /// GPIO pin assignments
    pub hardware: HardwareConfig,
    /// Acknowledgement blink pattern
    pub blink: BlinkConfig,
}

/// Which forecast the decision is based on
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizonKind {
    /// Today's single PoP value
    Today,
    /// Maximum over the next `hours` hourly values
    #[default]
    Hourly,
}

/// Forecast service configuration
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Weather Underground API key (secret, never logged)
    pub api_key: String,
    /// Location query, e.g. "UK/Cambridge"
    pub location: String,
    /// Service root, without trailing slash
    pub base_url: String,
    /// Today's forecast or the hourly window
    pub horizon: HorizonKind,
    /// Hourly window length, capped at 12
    pub hours: u8,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ForecastConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastConfig")
            .field("api_key", &"[REDACTED]")
            .field("location", &self.location)
            .field("base_url", &self.base_url)
            .field("horizon", &self.horizon)
            .field("hours", &self.hours)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            api_key: String::new(),
            location: "UK/Cambridge".to_string(),
            base_url: "http://api.wunderground.com".to_string(),
            horizon: HorizonKind::Hourly,
            hours: MAX_HOURLY_SAMPLES,
            timeout_secs: 5,
        }
    }
}

impl ForecastConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Rain decision configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// LED lights when the peak PoP is strictly above this percentage
    pub threshold_percent: u8,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        DecisionConfig {
            threshold_percent: 30,
        }
    }
}

/// Refresh and polling schedule
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Hour-of-day or day-of-month rollover triggers a refresh
    pub refresh_period: RefreshPeriod,
    /// Tick cadence in milliseconds
    pub poll_interval_ms: u64,
    /// Cap for exponential retry backoff in seconds; 0 retries every tick
    pub max_backoff_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            refresh_period: RefreshPeriod::Hourly,
            poll_interval_ms: 500,
            max_backoff_secs: 0,
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_backoff(&self) -> Option<Duration> {
        (self.max_backoff_secs > 0).then(|| Duration::from_secs(self.max_backoff_secs))
    }
}

/// GPIO pin assignments (BCM numbering)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// LED output pin. BCM 4 is physical pin 7
    pub led_pin: u8,
    /// Button input pin. BCM 17 is physical pin 11
    pub button_pin: u8,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        HardwareConfig {
            led_pin: 4,
            button_pin: 17,
        }
    }
}

/// Blink pattern shown at startup and on each button press
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Number of on/off pulses
    pub count: u8,
    /// Duration of each on and each off phase in milliseconds
    pub timing_ms: u64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        BlinkConfig {
            count: 5,
            timing_ms: 100,
        }
    }
}

impl Config {
    /// Load configuration from specified path, apply the environment override, and validate.
    /// A missing file falls back to the defaults; an unreadable or malformed one is an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_with_key(path.as_ref(), std::env::var(API_KEY_ENV).ok())
    }

    fn load_with_key(path: &Path, api_key: Option<String>) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?.with_api_key_override(api_key);
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = Self::from_toml_str(&contents)?;
                info!(
                    path = %path.display(),
                    location = %config.forecast.location,
                    "loaded configuration"
                );
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Parse configuration without validating it
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Replace the API key when an override is present and non-empty
    pub fn with_api_key_override(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.forecast.api_key = key;
        }
        self
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decision.threshold_percent > 100 {
            return Err(ConfigError::Invalid(format!(
                "decision.threshold_percent must be 0-100, got {}",
                self.decision.threshold_percent
            )));
        }
        if self.forecast.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "forecast.api_key is empty; set it in the config file or {API_KEY_ENV}"
            )));
        }
        if self.forecast.location.trim().is_empty() {
            return Err(ConfigError::Invalid("forecast.location is empty".into()));
        }
        if self.forecast.horizon == HorizonKind::Hourly
            && !(1..=MAX_HOURLY_SAMPLES).contains(&self.forecast.hours)
        {
            return Err(ConfigError::Invalid(format!(
                "forecast.hours must be 1-{MAX_HOURLY_SAMPLES}, got {}",
                self.forecast.hours
            )));
        }
        if self.forecast.timeout_secs == 0 {
            return Err(ConfigError::Invalid("forecast.timeout_secs must be > 0".into()));
        }
        if self.schedule.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("schedule.poll_interval_ms must be > 0".into()));
        }
        if self.hardware.led_pin == self.hardware.button_pin {
            return Err(ConfigError::Invalid(format!(
                "hardware.led_pin and hardware.button_pin are both {}",
                self.hardware.led_pin
            )));
        }
        Ok(())
    }

    /// Forecast window requested on each refresh
    pub fn horizon(&self) -> Horizon {
        match self.forecast.horizon {
            HorizonKind::Today => Horizon::Today,
            HorizonKind::Hourly => Horizon::next_hours(self.forecast.hours),
        }
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
