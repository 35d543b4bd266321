use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::ConfigError;
use crate::kernel::log::DEFAULT_LOG_CAPACITY;
use crate::kernel::time::TICK_MS;

/// Env var naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "AGRIPULSE_CONFIG";
pub const MODEL_ENV: &str = "AGRIPULSE_MODEL";
/// Checked in order; the first non-empty value wins.
pub const API_KEY_ENVS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_ms: u64,
    pub alert_ttl_ms: u64,
    pub log_capacity: usize,
    pub detection_probability: f64,
    pub joystick_probability: f64,
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            alert_ttl_ms: 5_000,
            log_capacity: DEFAULT_LOG_CAPACITY,
            detection_probability: 0.05,
            joystick_probability: 0.03,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-3-pro-preview".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl Config {
    /// File named by `AGRIPULSE_CONFIG` (if any), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_path(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// `lookup` abstracts the environment so tests stay hermetic.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = API_KEY_ENVS.iter().find_map(|k| present(k)) {
            self.model.api_key = Some(key);
        }
        if let Some(model) = present(MODEL_ENV) {
            self.model.model = model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.tick_ms == 0 {
            return Err(ConfigError::Invalid("simulation.tick_ms must be positive".into()));
        }
        for (name, p) in [
            ("detection_probability", sim.detection_probability),
            ("joystick_probability", sim.joystick_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!("simulation.{} must be within [0, 1], got {}", name, p)));
            }
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::Invalid("model.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}
