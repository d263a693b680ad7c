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

//! Filesystem helpers shared by the capture and summarization paths.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Replace `path` atomically: write the full contents to a sibling temp
/// file, fsync, then rename over the target. A crash mid-write leaves
/// either the old file or the new one, never a half-written file.
/// Parent directories are created as needed.
pub fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_sibling(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(err) => {
            // Leave no stray temp file behind on failure.
            let _ = fs::remove_file(&tmp);
            Err(err)
        }
    }
}

fn temp_sibling(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_write_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("cursor");

        atomic_write(&path, b"100").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "100");

        atomic_write(&path, b"250").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "250");

        // No temp file left around after a successful replace.
        assert!(!path.with_file_name("cursor.tmp").exists());
    }
}
