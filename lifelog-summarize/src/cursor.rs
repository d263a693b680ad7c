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

//! Persisted summary cursor
//!
//! A single byte offset into the raw archive marking "bytes already
//! summarized". The file contains the decimal offset and nothing else,
//! and is replaced atomically so a concurrent reader never observes a
//! partially-written value. The cursor is monotonically non-decreasing
//! across successful cycles; the one exception is rotation, which shrinks
//! the archive underneath it — reads clamp to the current archive size
//! and treat rotated-away bytes as already summarized.

use crate::error::SummarizeResult;
use lifelog_core::atomic_write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persisted single-offset store.
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw persisted offset. Missing file reads as 0; an unreadable or
    /// non-numeric file also reads as 0 with a warning — resummarizing
    /// from the start costs API calls but never crashes the monitor.
    pub fn load(&self) -> u64 {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => match contents.trim().parse() {
                Ok(offset) => offset,
                Err(_) => {
                    warn!(
                        "Non-numeric cursor file {:?} ({:?}), treating as 0",
                        self.path,
                        contents.trim()
                    );
                    0
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => 0,
            Err(err) => {
                warn!("Unreadable cursor file {:?} ({}), treating as 0", self.path, err);
                0
            }
        }
    }

    /// Offset clamped to the current archive size. Rotation does not
    /// adjust the cursor, so after the archive shrinks the persisted
    /// value can point past end-of-file.
    pub fn load_clamped(&self, archive_size: u64) -> u64 {
        let cursor = self.load();
        if cursor > archive_size {
            warn!(
                "Cursor {} is past archive end {}, clamping (archive was rotated)",
                cursor, archive_size
            );
            archive_size
        } else {
            cursor
        }
    }

    /// Persist a new offset atomically.
    pub fn store(&self, offset: u64) -> SummarizeResult<()> {
        atomic_write(&self.path, offset.to_string().as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = CursorStore::new(dir.path().join("summary.cursor"));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_store_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CursorStore::new(dir.path().join("summary.cursor"));
        store.store(48_213).unwrap();
        assert_eq!(store.load(), 48_213);
        // File contents are exactly the decimal integer.
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "48213"
        );
    }

    #[test]
    fn test_corrupt_file_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.cursor");
        std::fs::write(&path, "not a number\n").unwrap();
        assert_eq!(CursorStore::new(path).load(), 0);
    }

    #[test]
    fn test_clamped_to_archive_size() {
        let dir = tempfile::tempdir().unwrap();
        let store = CursorStore::new(dir.path().join("summary.cursor"));
        store.store(1000).unwrap();

        assert_eq!(store.load_clamped(400), 400);
        assert_eq!(store.load_clamped(1000), 1000);
        assert_eq!(store.load_clamped(5000), 1000);
    }

    #[test]
    fn test_whitespace_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.cursor");
        std::fs::write(&path, "  777\n").unwrap();
        assert_eq!(CursorStore::new(path).load(), 777);
    }
}
