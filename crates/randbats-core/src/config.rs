//! Application configuration management.
//!
//! Configuration is stored at `~/.config/pokemon-randbats/config.json`.
//! Every field has a default, so a missing or partial file is fine.
//! `RANDBATS_*` environment variables override the file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::formats::{RANDBATS_FORMATS, SMOGON_FORMATS};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "pokemon-randbats";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Upstream set data
pub const DEFAULT_RANDBATS_BASE_URL: &str = "https://raw.githubusercontent.com/pkmn/randbats/main/data";

/// Upstream per-Pokemon probability stats
pub const DEFAULT_STATS_BASE_URL: &str =
    "https://raw.githubusercontent.com/pkmn/randbats/main/data/stats";

/// GitHub contents API, used for file shas
pub const DEFAULT_METADATA_BASE_URL: &str =
    "https://api.github.com/repos/pkmn/randbats/contents/data";

/// Smogon competitive sets
pub const DEFAULT_SMOGON_BASE_URL: &str = "https://pkmn.github.io/smogon/data/sets";

/// Data is refreshed once it is older than this.
pub const DEFAULT_UPDATE_INTERVAL_HOURS: u64 = 24;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Keeps us polite toward raw.githubusercontent.com.
const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache_dir: Option<PathBuf>,
    /// Read-only fallback data shipped next to the binary.
    pub bundled_dir: Option<PathBuf>,
    pub formats: Vec<String>,
    pub smogon_formats: Vec<String>,
    pub auto_update: bool,
    pub update_interval_hours: u64,
    pub request_timeout_secs: u64,
    pub max_concurrent_downloads: usize,
    pub randbats_base_url: String,
    pub stats_base_url: String,
    pub metadata_base_url: String,
    pub smogon_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            bundled_dir: None,
            formats: RANDBATS_FORMATS.iter().map(|f| f.to_string()).collect(),
            smogon_formats: Vec::new(),
            auto_update: true,
            update_interval_hours: DEFAULT_UPDATE_INTERVAL_HOURS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            randbats_base_url: DEFAULT_RANDBATS_BASE_URL.to_string(),
            stats_base_url: DEFAULT_STATS_BASE_URL.to_string(),
            metadata_base_url: DEFAULT_METADATA_BASE_URL.to_string(),
            smogon_base_url: DEFAULT_SMOGON_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load from the config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply `RANDBATS_*` overrides. Takes a lookup so tests don't touch the process env.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("RANDBATS_CACHE_DIR").filter(|s| !s.is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = var("RANDBATS_BUNDLED_DIR").filter(|s| !s.is_empty()) {
            self.bundled_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = var("RANDBATS_AUTO_UPDATE") {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.auto_update = true,
                "0" | "false" | "no" | "off" => self.auto_update = false,
                other => warn!(value = other, "Ignoring invalid RANDBATS_AUTO_UPDATE"),
            }
        }
        if let Some(value) = var("RANDBATS_UPDATE_INTERVAL_HOURS") {
            match value.trim().parse::<u64>() {
                Ok(hours) if hours > 0 => self.update_interval_hours = hours,
                _ => warn!(value = %value, "Ignoring invalid RANDBATS_UPDATE_INTERVAL_HOURS"),
            }
        }
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_hours.max(1).saturating_mul(3600))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Every Smogon tier when none were configured.
    pub fn smogon_formats_or_all(&self) -> Vec<String> {
        if self.smogon_formats.is_empty() {
            SMOGON_FORMATS.iter().map(|f| f.to_string()).collect()
        } else {
            self.smogon_formats.clone()
        }
    }
}
