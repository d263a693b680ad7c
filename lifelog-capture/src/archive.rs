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

//! Archive and session-log writer
//!
//! Appends well-formed records to the raw archive and, when enabled,
//! mirrors them into a per-day session log. Strictly append-only: nothing
//! here seeks backward or rewrites prior bytes; only the rotation manager
//! ever replaces the archive.

use crate::error::CaptureResult;
use chrono::Local;
use lifelog_core::Record;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Append-only writer for the raw archive and per-day session logs.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    archive_path: PathBuf,
    session_log_dir: Option<PathBuf>,
}

impl ArchiveWriter {
    /// `session_log_dir = None` disables the per-day mirror.
    pub fn new(archive_path: impl Into<PathBuf>, session_log_dir: Option<PathBuf>) -> Self {
        Self {
            archive_path: archive_path.into(),
            session_log_dir,
        }
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Current archive size in bytes (0 if it does not exist yet).
    pub fn archive_size(&self) -> u64 {
        std::fs::metadata(&self.archive_path)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Append one record to the archive (and the day's session log),
    /// returning the archive size after the append. A session-log failure
    /// is logged and swallowed: the mirror is pure fan-out and must never
    /// block archival.
    pub fn append(&self, record: &Record) -> CaptureResult<u64> {
        let rendered = record.render();
        let size = Self::append_to(&self.archive_path, rendered.as_bytes())?;

        if let Some(dir) = &self.session_log_dir {
            let session = dir.join(format!("session-{}.log", Local::now().format("%Y-%m-%d")));
            if let Err(err) = Self::append_to(&session, rendered.as_bytes()) {
                warn!("Failed to mirror record to session log {:?}: {}", session, err);
            }
        }
        Ok(size)
    }

    fn append_to(path: &Path, bytes: &[u8]) -> CaptureResult<u64> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(bytes)?;
        Ok(file.metadata()?.len())
    }
}
