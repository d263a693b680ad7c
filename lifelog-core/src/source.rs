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

//! Capture source descriptors
//!
//! A source is a file or directory configured (or auto-detected) as an
//! input. Sources are ephemeral: the registry recomputes the concrete list
//! every poll cycle, and directory sources expand to their member files at
//! poll time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// A single append-only file.
    File,
    /// A directory whose recently-modified member files are tailed.
    Directory,
}

/// A file or directory to capture from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Absolute path; identity of the source.
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl Source {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: SourceKind::File,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: SourceKind::Directory,
        }
    }

    /// Build a source from a path that exists on disk, picking the kind
    /// from its metadata.
    pub fn from_path(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        if meta.is_dir() {
            Some(Self::directory(path))
        } else if meta.is_file() {
            Some(Self::file(path))
        } else {
            None
        }
    }

    /// Basename used to tag records in the archive.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_name_is_basename() {
        let source = Source::file("/home/user/.bash_history");
        assert_eq!(source.name(), ".bash_history");
    }

    #[test]
    fn test_from_path_picks_kind() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("activity.log");
        std::fs::write(&file, "x\n").unwrap();

        assert_eq!(Source::from_path(dir.path()).unwrap().kind, SourceKind::Directory);
        assert_eq!(Source::from_path(&file).unwrap().kind, SourceKind::File);
        assert!(Source::from_path(&dir.path().join("missing")).is_none());
    }
}
