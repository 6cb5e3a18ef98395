//! File-backed lifetime statistics.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use super::stats::PersistentStats;

/// Version written in every stats file. Files with another version are ignored.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stats file i/o: {0}")]
    Io(#[from] io::Error),
    #[error("stats file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported stats file version {found}, expected {}", FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },
}

#[derive(serde::Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StatsFile {
    version: u32,
    stats: PersistentStats,
}

/// Lifetime statistics kept in memory and rewritten wholesale after every change.
///
/// Persistence problems never reach the learner: an unreadable file loads as zeros
/// and a failed write is logged and reported through the `saved` flag of [`StatsStore::update`].
#[derive(Debug)]
pub struct StatsStore {
    path: PathBuf,
    stats: PersistentStats,
}

impl StatsStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let stats = match Self::read(&path) {
            Ok(Some(stats)) => {
                info!("Loaded lifetime stats from {}", path.display());
                stats
            }
            Ok(None) => {
                info!("No stats file at {}, starting from zero", path.display());
                PersistentStats::default()
            }
            Err(e) => {
                warn!("Ignoring stats file {}: {}", path.display(), e);
                PersistentStats::default()
            }
        };
        Self { path, stats }
    }

    /// Reads a stats file. `Ok(None)` when there is no file yet.
    pub fn read(path: &Path) -> Result<Option<PersistentStats>, StoreError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let probe: VersionProbe = serde_json::from_str(&json)?;
        if probe.version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: probe.version,
            });
        }
        let file: StatsFile = serde_json::from_str(&json)?;
        Ok(Some(file.stats))
    }

    pub fn stats(&self) -> &PersistentStats {
        &self.stats
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counts a new session. Returns whether the change reached the disk.
    pub fn begin_session(&mut self) -> bool {
        let ((), saved) = self.update(|stats| stats.sessions_played += 1);
        saved
    }

    /// Mutates the lifetime record and flushes it right away.
    pub fn update<R>(&mut self, mutate: impl FnOnce(&mut PersistentStats) -> R) -> (R, bool) {
        let result = mutate(&mut self.stats);
        let saved = match self.flush() {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save stats to {}: {}", self.path.display(), e);
                false
            }
        };
        (result, saved)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&StatsFile {
            version: FORMAT_VERSION,
            stats: self.stats,
        })?;

        let mut temp_path = OsString::from(self.path.as_os_str());
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        debug!("Saved stats to {}", self.path.display());
        Ok(())
    }
}
