use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::ResolutionFilter;

/// User settings persisted across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub min_width: f64,
    pub min_height: f64,
    pub launch_at_login: bool,
}

impl Settings {
    pub fn filter(&self) -> ResolutionFilter {
        ResolutionFilter::new(self.min_width, self.min_height)
    }
}

/// JSON-file backed settings storage. Writes are last-write-wins.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$CONFIG_DIR/shydock/settings.json`
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(Self::new(dir.join("shydock").join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to defaults if the file is missing or unreadable.
    pub fn load(&self) -> Settings {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No settings at {:?}, using defaults", self.path);
                return Settings::default();
            }
            Err(e) => {
                tracing::warn!("Failed to read settings {:?}: {}", self.path, e);
                return Settings::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring corrupt settings {:?}: {}", self.path, e);
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {:?}", dir))?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("Failed to write {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))?;

        tracing::debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

/// Timing knobs for the reconciliation loop and the automation bridge.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Wait after an apply lands before trusting a state query
    pub settle_delay: Duration,
    /// Quiet period that collapses a burst of display reconfiguration events
    pub debounce: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Upper bound for a verification read including bridge retries
    pub verify_timeout: Duration,
    /// How often accessibility trust is re-checked; it can be granted or
    /// revoked while the daemon runs
    pub permission_poll: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(100),
            debounce: Duration::from_millis(200),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            verify_timeout: Duration::from_secs(5),
            permission_poll: Duration::from_secs(2),
        }
    }
}
