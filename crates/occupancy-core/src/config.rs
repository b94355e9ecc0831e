//! Application configuration management.
//!
//! Every option has a default, so a missing or partial config file is fine.
//! Configuration is stored at `~/.config/occupancy/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::FacilityId;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "occupancy";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_SOURCE_URL: &str = "https://app.wof.de/besucher/";
const DEFAULT_PROBE_URL: &str = "https://www.apple.com/library/test/success.html";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serve cached readings when the network is unreachable.
    pub offline_mode_enabled: bool,
    pub color_coding_enabled: bool,
    pub timestamp_enabled: bool,
    /// Facility used when no valid identifier is requested.
    pub default_facility: FacilityId,
    pub cache_max_age_minutes: u32,
    pub refresh_interval_minutes: u32,
    pub cleanup_interval_hours: u32,
    pub cleanup_max_age_days: u32,
    pub probe_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub source_url: String,
    pub probe_url: String,
    /// Text the probe response must contain to count as "online".
    pub probe_marker: String,
    /// Label preceding the facility number in the listing ("WOF 3").
    pub facility_label: String,
    pub facility_delimiter: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            offline_mode_enabled: true,
            color_coding_enabled: true,
            timestamp_enabled: true,
            default_facility: FacilityId::MIN,
            cache_max_age_minutes: 60,
            refresh_interval_minutes: 15,
            cleanup_interval_hours: 24,
            cleanup_max_age_days: 7,
            probe_timeout_secs: 5,
            fetch_timeout_secs: 30,
            source_url: DEFAULT_SOURCE_URL.to_string(),
            probe_url: DEFAULT_PROBE_URL.to_string(),
            probe_marker: "Success".to_string(),
            facility_label: "WOF".to_string(),
            facility_delimiter: ';',
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn cache_max_age(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.cache_max_age_minutes))
    }

    pub fn refresh_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.refresh_interval_minutes))
    }

    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.cleanup_interval_hours) * 3600)
    }

    pub fn cleanup_max_age(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.cleanup_max_age_days))
    }

    pub fn probe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_timeout_secs)
    }
}
