// Copyright 2025 Lifelog Contributors (https://github.com/lifelog-dev/lifelog)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Persisted per-source read offsets
//!
//! Maps each tailed file path to its last-observed byte size, persisted as
//! a JSON document and replaced atomically on every flush. Persisting the
//! map (rather than keeping it process-local) means a restart neither
//! re-captures bytes already in the archive nor misses growth that
//! happened while the monitor was down.

use crate::error::CaptureResult;
use lifelog_core::atomic_write;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persisted path -> last-observed-size map.
#[derive(Debug)]
pub struct OffsetStore {
    path: PathBuf,
    offsets: BTreeMap<PathBuf, u64>,
}

impl OffsetStore {
    /// Load the store from disk. A missing file starts empty; an
    /// unreadable or corrupt file is treated as empty with a warning,
    /// trading duplicate capture for availability.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let offsets = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(err) => {
                    warn!("Corrupt offset store {:?} ({}), starting empty", path, err);
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!("Unreadable offset store {:?} ({}), starting empty", path, err);
                BTreeMap::new()
            }
        };
        Self { path, offsets }
    }

    /// Last observed size for a file, 0 if never seen.
    pub fn get(&self, file: &Path) -> u64 {
        self.offsets.get(file).copied().unwrap_or(0)
    }

    /// Record a new observed size in memory. Call [`OffsetStore::flush`]
    /// after the poll cycle to persist.
    pub fn set(&mut self, file: &Path, size: u64) {
        self.offsets.insert(file.to_path_buf(), size);
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Persist the map atomically (write temp, rename). Entries for
    /// files that no longer exist are pruned first, so the map tracks
    /// the live source set rather than growing forever.
    pub fn flush(&mut self) -> CaptureResult<()> {
        self.offsets.retain(|path, _| path.exists());
        let json = serde_json::to_vec_pretty(&self.offsets)?;
        atomic_write(&self.path, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = OffsetStore::load(dir.path().join("offsets.json"));
        assert!(store.is_empty());
        assert_eq!(store.get(Path::new("/nowhere")), 0);
    }

    #[test]
    fn test_flush_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offsets.json");
        let history = dir.path().join("bash_history");
        let transcript = dir.path().join("agent.jsonl");
        std::fs::write(&history, vec![b'x'; 4096]).unwrap();
        std::fs::write(&transcript, vec![b'y'; 128]).unwrap();

        let mut store = OffsetStore::load(&path);
        store.set(&history, 4096);
        store.set(&transcript, 128);
        store.flush().unwrap();

        let reloaded = OffsetStore::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(&history), 4096);
        assert_eq!(reloaded.get(&transcript), 128);
    }

    #[test]
    fn test_flush_prunes_vanished_files() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("keep.log");
        std::fs::write(&keep, "x\n").unwrap();
        let gone = dir.path().join("gone.log");

        let mut store = OffsetStore::load(dir.path().join("offsets.json"));
        store.set(&keep, 2);
        store.set(&gone, 7);
        store.flush().unwrap();

        let reloaded = OffsetStore::load(dir.path().join("offsets.json"));
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&keep), 2);
        assert_eq!(reloaded.get(&gone), 0);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offsets.json");
        std::fs::write(&path, "{ definitely not json").unwrap();

        let store = OffsetStore::load(&path);
        assert!(store.is_empty());
    }
}
