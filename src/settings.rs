//! Host settings
//!
//! Persisted separately from the progression save as a small JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::consts::TICK_INTERVAL_MS;

/// Demo host settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Milliseconds between ticks
    pub tick_interval_ms: u64,
    /// RNG seed; the same seed replays the same rounds
    pub seed: u64,
    /// Rounds the demo plays before exiting
    pub rounds: u32,
    /// Sleep between ticks instead of running flat out
    pub realtime: bool,
    /// Autopilot vehicle speed (points per tick)
    pub autopilot_speed: f32,
    /// Give up on a round after this many ticks
    pub max_ticks_per_round: u64,
    /// Progression save file; platform data dir when unset
    pub save_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            seed: 0xEC0_u64,
            rounds: 3,
            realtime: false,
            autopilot_speed: 14.0,
            max_ticks_per_round: 20_000,
            save_path: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        if let Ok(json) = fs::read_to_string(path) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::warn!("Ignoring bad settings in {}: {}", path.display(), e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing settings")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Where progress is saved
    pub fn resolve_save_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.save_path {
            return Ok(path.clone());
        }
        let proj = ProjectDirs::from("com", "ecoventure", "EcoVenture")
            .context("could not resolve project directories")?;
        Ok(proj.data_local_dir().join("save.json"))
    }
}
