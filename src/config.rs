//! Configuration for the Presence Sensor Agent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the sensor agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minimum interval between attention re-evaluations
    #[serde(with = "duration_ms")]
    pub attention_interval: Duration,

    /// Minimum interval between affect re-evaluations
    #[serde(with = "duration_ms")]
    pub affect_interval: Duration,

    /// Minimum interval between gesture re-evaluations
    #[serde(with = "duration_ms")]
    pub gesture_interval: Duration,

    /// How long a fired discrete gesture is held before re-evaluation
    #[serde(with = "duration_ms")]
    pub gesture_hold: Duration,

    /// Endpoint receiving periodic state reports
    pub report_url: String,

    /// Interval between state reports
    #[serde(with = "duration_ms")]
    pub report_interval: Duration,

    /// Whether frame processing is currently paused
    pub paused: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            attention_interval: Duration::from_millis(150),
            affect_interval: Duration::from_millis(400),
            gesture_interval: Duration::from_millis(50),
            gesture_hold: Duration::from_millis(1000),
            report_url: "http://localhost:3000/api/cv-event".to_string(),
            report_interval: Duration::from_secs(1),
            paused: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("presence-sensor-agent")
            .join("config.json")
    }

    /// Reject intervals that would make a classifier evaluate never or always.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("attention_interval", self.attention_interval),
            ("affect_interval", self.affect_interval),
            ("gesture_interval", self.gesture_interval),
            ("report_interval", self.report_interval),
        ];
        for (name, interval) in intervals {
            if interval.is_zero() {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        if self.report_url.is_empty() {
            return Err(ConfigError::Invalid("report_url must be set".to_string()));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration, in milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
