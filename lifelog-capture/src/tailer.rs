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

//! Position-tracked tailing
//!
//! For each tailed file the tailer compares the current size against the
//! last observed size and reads exactly the appended byte range
//! `[last, current)`. Offsets advance before results are returned, so a
//! byte range is read at most once per offset-store state.
//!
//! Shrunken files (truncated or externally rotated) reset their offset to
//! 0: the whole current content is treated as new on the next cycle rather
//! than silently never being read again.

use crate::error::CaptureResult;
use crate::offsets::OffsetStore;
use lifelog_core::{Source, SourceKind};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Newly-appended content read from one file.
#[derive(Debug, Clone)]
pub struct TailedChunk {
    /// File the bytes came from.
    pub path: PathBuf,
    /// Basename used to tag the archive record.
    pub source_name: String,
    /// The appended bytes, lossily decoded as UTF-8.
    pub content: String,
}

/// Per-source delta reader over a persisted [`OffsetStore`].
#[derive(Debug)]
pub struct Tailer {
    offsets: OffsetStore,
    recency_window: Duration,
}

impl Tailer {
    pub fn new(offsets: OffsetStore, recency_window_mins: u64) -> Self {
        Self {
            offsets,
            recency_window: Duration::from_secs(recency_window_mins * 60),
        }
    }

    /// Poll one source, returning a chunk per file that grew. Unreadable
    /// files are skipped for this cycle with a warning; they stay tracked
    /// and are retried next cycle.
    pub fn poll_source(&mut self, source: &Source) -> Vec<TailedChunk> {
        let files = match source.kind {
            SourceKind::File => vec![source.path.clone()],
            SourceKind::Directory => self.expand_directory(&source.path),
        };

        let mut chunks = Vec::new();
        for file in files {
            match self.poll_file(&file) {
                Ok(Some(chunk)) => chunks.push(chunk),
                Ok(None) => {}
                Err(err) => warn!("Failed to tail {:?}: {}", file, err),
            }
        }
        chunks
    }

    /// Persist offsets after a poll cycle.
    pub fn flush_offsets(&mut self) -> CaptureResult<()> {
        self.offsets.flush()
    }

    fn poll_file(&mut self, path: &Path) -> CaptureResult<Option<TailedChunk>> {
        let current_size = std::fs::metadata(path)?.len();
        let last_size = self.offsets.get(path);

        if current_size == last_size {
            return Ok(None);
        }
        if current_size < last_size {
            warn!(
                "{:?} shrank ({} -> {} bytes), treating as replaced and rereading from 0",
                path, last_size, current_size
            );
            self.offsets.set(path, 0);
            return Ok(None);
        }

        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(last_size))?;
        let mut buf = Vec::with_capacity((current_size - last_size) as usize);
        file.take(current_size - last_size).read_to_end(&mut buf)?;

        self.offsets.set(path, current_size);

        let content = String::from_utf8_lossy(&buf).into_owned();
        if content.trim().is_empty() {
            // Pure-whitespace growth is tracked but not archived.
            return Ok(None);
        }

        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Ok(Some(TailedChunk {
            path: path.to_path_buf(),
            source_name,
            content,
        }))
    }

    /// Expand a directory source into member files passing the name
    /// allowlist and the recency window. Agent transcript trees keep
    /// sessions one subdirectory down (one per project), so direct
    /// subdirectories are scanned as well; nothing deeper.
    fn expand_directory(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        self.collect_members(dir, 1, &mut files);
        files.sort();
        files
    }

    fn collect_members(&self, dir: &Path, depth: usize, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Failed to read source directory {:?}: {}", dir, err);
                return;
            }
        };

        let now = SystemTime::now();
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(meta) = entry.metadata() else { continue };
            if meta.is_dir() {
                if depth > 0 {
                    self.collect_members(&path, depth - 1, files);
                }
                continue;
            }
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !Self::name_allowed(&name) {
                continue;
            }
            let recent = meta
                .modified()
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok())
                .map(|age| age <= self.recency_window)
                // Unreadable mtime: keep the file rather than dropping it.
                .unwrap_or(true);
            if recent {
                files.push(path);
            } else {
                debug!(
                    "Skipping {:?}: not modified within the last {} min",
                    path,
                    self.recency_window.as_secs() / 60
                );
            }
        }
    }

    /// Name allowlist for directory members.
    fn name_allowed(name: &str) -> bool {
        name.ends_with(".log")
            || name.ends_with(".jsonl")
            || name.ends_with(".txt")
            || name.to_lowercase().contains("history")
    }
}
