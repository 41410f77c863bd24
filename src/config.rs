use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::LogConfig;
use crate::sensors::MOTION_UPDATE_INTERVAL;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where login state is kept between runs
    pub settings_path: PathBuf,

    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Sampling behaviour of the tracking session
    pub sampling: SamplingSettings,

    /// Persistence gateway settings
    pub backend: BackendSettings,

    /// Simulated device used when no watch is attached
    pub simulation: SimulationSettings,

    /// Logging output
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingSettings {
    /// Device-motion update interval in milliseconds
    pub motion_interval_ms: u64,

    /// Seed for simulated metrics; entropy when absent
    pub random_seed: Option<u64>,

    /// Bundled JSON file that is read and logged on startup, never applied
    pub bundled_json: Option<PathBuf>,
}

/// Which record store backs the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Hosted REST backend
    Remote,
    /// SQLite file on this machine
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    pub store: StoreKind,

    /// Base URL of the hosted backend
    pub url: String,

    /// Public API key sent with every request
    pub anon_key: String,

    /// Table receiving activity summaries
    pub table: String,

    /// Database file used by the local store
    pub local_db_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    pub pedometer_available: bool,
    pub motion_available: bool,
    pub health_available: bool,
    pub grant_health_access: bool,

    /// Steps per minute produced by the simulated pedometer
    pub cadence_spm: f64,

    /// Metres per step
    pub stride_m: f64,

    /// Chance that a motion sample is a jump spike
    pub jump_probability: f64,

    pub fail_workout_begin: bool,
    pub fail_workout_finish: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            settings_path: Self::config_dir().join("settings.json"),
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            sampling: SamplingSettings::default(),
            backend: BackendSettings::default(),
            simulation: SimulationSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        SamplingSettings {
            motion_interval_ms: MOTION_UPDATE_INTERVAL.as_millis() as u64,
            random_seed: None,
            bundled_json: None,
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            store: StoreKind::Local,
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            table: "walking".to_string(),
            local_db_path: AppConfig::config_dir().join("activities.db"),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            pedometer_available: true,
            motion_available: true,
            health_available: true,
            grant_health_access: true,
            cadence_spm: 110.0,
            stride_m: 0.75,
            jump_probability: 0.05,
            fail_workout_begin: false,
            fail_workout_finish: false,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Directory holding config, settings and the local database
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vitalrs")
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(Self::default_config_path())
    }

    /// Load from `path`, falling back to defaults. A missing file is silent;
    /// a file that fails to parse or validate is reported with its cause.
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Ignoring config {}, using defaults: {:#}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }

    /// Reject values the tracker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sampling.motion_interval_ms == 0 {
            anyhow::bail!("sampling.motion_interval_ms must be greater than zero");
        }
        if self.backend.table.trim().is_empty() {
            anyhow::bail!("backend.table must not be empty");
        }
        if self.backend.store == StoreKind::Remote && self.backend.url.trim().is_empty() {
            anyhow::bail!("backend.url is required for the remote store");
        }
        if !(0.0..=1.0).contains(&self.simulation.jump_probability) {
            anyhow::bail!("simulation.jump_probability must be within 0..=1");
        }
        Ok(())
    }

    pub fn motion_interval(&self) -> Duration {
        Duration::from_millis(self.sampling.motion_interval_ms)
    }
}

/// Read a bundled JSON file and log its contents
///
/// The document is only inspected, never applied. Returns the parsed value when
/// the file holds a JSON object.
pub fn log_bundled_json<P: AsRef<Path>>(path: P) -> Result<Option<serde_json::Value>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read bundled JSON: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse bundled JSON: {}", path.display()))?;

    if value.is_object() {
        tracing::info!(path = %path.display(), json = %value, "Bundled configuration");
        Ok(Some(value))
    } else {
        tracing::warn!(path = %path.display(), "Given JSON is not a valid dictionary object");
        Ok(None)
    }
}
