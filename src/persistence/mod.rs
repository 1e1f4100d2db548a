//! Save/load of the progression snapshot
//!
//! Features:
//! - Versioned JSON envelope
//! - Atomic replace (write tmp, rename over save)
//! - Corruption detection: unreadable or foreign saves start fresh

use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::ProgressionState;

/// Bump when the save layout changes incompatibly
pub const SAVE_VERSION: u32 = 1;

/// On-disk envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub progression: ProgressionState,
}

impl SaveFile {
    pub fn new(progression: ProgressionState) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: Utc::now(),
            progression,
        }
    }
}

/// Where the progression snapshot lives between runs
pub trait SnapshotStore {
    /// Previous snapshot, `None` on first run or after corruption
    fn load(&self) -> Result<Option<ProgressionState>>;
    fn save(&self, state: &ProgressionState) -> Result<()>;
}

/// JSON file on local disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<ProgressionState>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No save at {}, starting fresh", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        match serde_json::from_str::<SaveFile>(&json) {
            Ok(save) if save.version == SAVE_VERSION => {
                log::info!(
                    "Loaded save from {} (level {}, {} coins)",
                    self.path.display(),
                    save.progression.max_unlocked_level,
                    save.progression.coins
                );
                Ok(Some(save.progression))
            }
            Ok(save) => {
                log::warn!(
                    "Save version {} not supported (expected {}), starting fresh",
                    save.version,
                    SAVE_VERSION
                );
                Ok(None)
            }
            Err(e) => {
                log::warn!("Save at {} is corrupted ({}), starting fresh", self.path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, state: &ProgressionState) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(&SaveFile::new(state.clone()))
            .context("serializing save")?;
        fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;

        log::info!("Progress saved to {}", self.path.display());
        Ok(())
    }
}

/// Keeps the last snapshot in memory. For tests and hosts without storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RefCell<Option<ProgressionState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<ProgressionState>> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&self, state: &ProgressionState) -> Result<()> {
        *self.slot.borrow_mut() = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::ActivityEntry;
    use chrono::NaiveDate;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("eco-venture-test-{}", std::process::id()))
            .join(format!("{name}.json"))
    }

    fn sample() -> ProgressionState {
        let day = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        let mut p = ProgressionState::new();
        p.record_high_score(12);
        p.unlock_next_level();
        p.log_activity(
            ActivityEntry::new(vec![1, 2, 3], "picked up litter", Utc::now()),
            day,
            day,
        );
        p
    }

    #[test]
    fn test_file_store_round_trip() {
        let store = JsonFileStore::new(temp_path("round_trip"));
        let state = sample();
        store.save(&state).unwrap();

        let loaded = store.load().unwrap().expect("save present");
        assert_eq!(loaded, state);
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_missing_file_is_fresh_start() {
        let store = JsonFileStore::new(temp_path("missing"));
        let _ = fs::remove_file(store.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupted_file_is_fresh_start() {
        let path = temp_path("corrupted");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().unwrap().is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_future_version_is_fresh_start() {
        let path = temp_path("future");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut save = SaveFile::new(sample());
        save.version = SAVE_VERSION + 1;
        fs::write(&path, serde_json::to_vec(&save).unwrap()).unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().unwrap().is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_bonus_signal_not_persisted() {
        let store = MemoryStore::new();
        let mut state = ProgressionState::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for n in 0..7 {
            state.record_play(start + chrono::Days::new(n));
        }
        assert!(state.bonus_pending());

        // Through JSON, as the file store does
        let json = serde_json::to_string(&SaveFile::new(state)).unwrap();
        let save: SaveFile = serde_json::from_str(&json).unwrap();
        assert!(!save.progression.bonus_pending());

        store.save(&save.progression).unwrap();
        assert_eq!(store.load().unwrap(), Some(save.progression));
    }
}
