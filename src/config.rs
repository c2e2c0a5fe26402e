//! Configuration for the focus-nudge pipeline.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Main configuration bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA timezone the screenshots were captured in
    pub timezone: String,

    /// Directory where timeline and feedback artifacts are written
    pub artifacts_path: PathBuf,

    /// Segmentation and idle carving settings
    pub timeline: TimelineConfig,

    /// Trigger detector settings
    pub triggers: TriggerConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("focus-nudge");

        Self {
            timezone: "America/Los_Angeles".to_string(),
            artifacts_path: data_dir.join("artifacts"),
            timeline: TimelineConfig::default(),
            triggers: TriggerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit file, creating its directory.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("focus-nudge")
            .join("config.json")
    }

    /// Ensure the artifacts directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.artifacts_path)?;
        Ok(())
    }

    /// Parsed timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Check every tunable once, before any scan runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;
        self.timeline.validate()?;
        self.triggers.validate()
    }
}

/// Settings for the segment builder and idle carver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Minimum gap between adjacent frames before idle is considered
    pub idle_gap_minutes: i64,
    /// Image similarity at or above which a long gap counts as idle
    pub idle_similarity_threshold: f64,
    /// Minutes kept around each capture when carving idle
    pub idle_margin_minutes: i64,
    /// Capture cadence used when it cannot be inferred
    pub capture_interval_fallback_minutes: i64,
    /// Mean confidence below which a segment gets `low_confidence`
    pub low_confidence_threshold: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            idle_gap_minutes: 20,
            idle_similarity_threshold: 0.985,
            idle_margin_minutes: 5,
            capture_interval_fallback_minutes: 15,
            low_confidence_threshold: 0.60,
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_gap_minutes <= 0 {
            return Err(ConfigError::invalid(
                "idle_gap_minutes",
                "must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.idle_similarity_threshold) {
            return Err(ConfigError::invalid(
                "idle_similarity_threshold",
                "must be within [0, 1]",
            ));
        }
        if self.idle_margin_minutes < 0 {
            return Err(ConfigError::invalid(
                "idle_margin_minutes",
                "must not be negative",
            ));
        }
        if self.capture_interval_fallback_minutes <= 0 {
            return Err(ConfigError::invalid(
                "capture_interval_fallback_minutes",
                "must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.low_confidence_threshold) {
            return Err(ConfigError::invalid(
                "low_confidence_threshold",
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Settings for the trigger detectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Ascending consecutive-work minutes for focus levels L1..L3
    pub focus_thresholds: Vec<i64>,
    /// Cooldown per focus level key
    pub focus_cooldown_minutes: i64,
    /// Off-work minutes required before a return-to-work nudge
    pub min_offwork_minutes: i64,
    pub return_to_work_cooldown_minutes: i64,
    /// Length of each anomaly evaluation window
    pub anomaly_window_minutes: i64,
    /// Work/non-work flips per window that count as anomalous
    pub anomaly_switch_threshold: u32,
    pub anomaly_cooldown_minutes: i64,
    pub first_work_cooldown_minutes: i64,
    /// Activity labels treated as work (exact match)
    pub work_activity_set: BTreeSet<String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            focus_thresholds: vec![15, 25, 40],
            focus_cooldown_minutes: 60,
            min_offwork_minutes: 5,
            return_to_work_cooldown_minutes: 60,
            anomaly_window_minutes: 60,
            anomaly_switch_threshold: 6,
            anomaly_cooldown_minutes: 180,
            first_work_cooldown_minutes: 24 * 60,
            work_activity_set: ["Coding", "Writing/Reading"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Focus levels are reported as L1..L3.
pub const MAX_FOCUS_LEVELS: usize = 3;

impl TriggerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.focus_thresholds.is_empty() {
            return Err(ConfigError::invalid("focus_thresholds", "must not be empty"));
        }
        if self.focus_thresholds.len() > MAX_FOCUS_LEVELS {
            return Err(ConfigError::invalid(
                "focus_thresholds",
                "at most 3 levels are supported",
            ));
        }
        if self.focus_thresholds[0] <= 0 {
            return Err(ConfigError::invalid("focus_thresholds", "must be positive"));
        }
        if self.focus_thresholds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigError::invalid(
                "focus_thresholds",
                "must be strictly ascending",
            ));
        }
        if self.min_offwork_minutes < 0 {
            return Err(ConfigError::invalid(
                "min_offwork_minutes",
                "must not be negative",
            ));
        }
        if self.anomaly_window_minutes <= 0 {
            return Err(ConfigError::invalid(
                "anomaly_window_minutes",
                "must be positive",
            ));
        }
        if self.anomaly_switch_threshold == 0 {
            return Err(ConfigError::invalid(
                "anomaly_switch_threshold",
                "must be positive",
            ));
        }

        let cooldowns = [
            ("focus_cooldown_minutes", self.focus_cooldown_minutes),
            (
                "return_to_work_cooldown_minutes",
                self.return_to_work_cooldown_minutes,
            ),
            ("anomaly_cooldown_minutes", self.anomaly_cooldown_minutes),
            ("first_work_cooldown_minutes", self.first_work_cooldown_minutes),
        ];
        for (field, value) in cooldowns {
            if value <= 0 {
                return Err(ConfigError::invalid(field, "must be positive"));
            }
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: &str) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.to_string(),
        }
    }
}
