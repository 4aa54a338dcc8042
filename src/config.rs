use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::engine::{DEFAULT_NEURAL_INTENSITY, DEFAULT_XP};

const APP_NAME: &str = "odyssey";
const CONFIG_FILE: &str = "config.json";

/// Timing and seed values for the [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a batch of changes may collect before it is flushed.
    pub flush_debounce_ms: u64,
    /// How long the XP alert stays visible after the latest award.
    pub xp_alert_ms: u64,
    /// Interval between simulated status lines while a project is active.
    pub status_pulse_ms: u64,
    /// XP a brand new learner starts with.
    pub initial_xp: u64,
    /// Starting value of the sidebar intensity slider (0 to 100).
    pub neural_intensity: u8,
    /// Number of tasks requested per project generation.
    pub tasks_per_generation: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flush_debounce_ms: 250,
            xp_alert_ms: 3000,
            status_pulse_ms: 15_000,
            initial_xp: DEFAULT_XP,
            neural_intensity: DEFAULT_NEURAL_INTENSITY,
            tasks_per_generation: 1,
        }
    }
}

impl EngineConfig {
    pub fn flush_debounce(&self) -> Duration {
        Duration::from_millis(self.flush_debounce_ms)
    }

    pub fn xp_alert(&self) -> Duration {
        Duration::from_millis(self.xp_alert_ms)
    }

    pub fn status_pulse(&self) -> Duration {
        Duration::from_millis(self.status_pulse_ms)
    }
}

/// Service-level configuration for the `odyssey` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file; defaults to the platform data directory.
    pub db_path: Option<PathBuf>,
    /// Base URL of the generation service (from ODYSSEY_GENERATOR_URL)
    pub generator_url: Option<String>,
    /// Bearer token for the generation service (from ODYSSEY_GENERATOR_KEY)
    #[serde(skip_serializing)]
    pub generator_key: Option<String>,
    /// Real-time interval at which the engine clock is advanced.
    pub tick_ms: u64,
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            generator_url: None,
            generator_key: None,
            tick_ms: 100,
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides.
    pub fn load() -> Self {
        Self::load_file().with_env()
    }

    /// The config file alone, without environment overrides. Returns
    /// defaults if the file doesn't exist or fails to parse.
    pub fn load_file() -> Self {
        match get_config_path().and_then(|path| Self::read_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    fn read_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply `ODYSSEY_*` environment variables on top of this config.
    pub fn with_env(mut self) -> Self {
        if let Ok(path) = std::env::var("ODYSSEY_DB_PATH") {
            self.db_path = Some(PathBuf::from(path));
        }
        if let Ok(url) = std::env::var("ODYSSEY_GENERATOR_URL") {
            self.generator_url = Some(url);
        }
        if let Ok(key) = std::env::var("ODYSSEY_GENERATOR_KEY") {
            self.generator_key = Some(key);
        }
        self
    }

    /// Save this configuration to the user's config file.
    pub fn save(&self) -> Result<()> {
        self.write_to(&get_config_path()?)
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
