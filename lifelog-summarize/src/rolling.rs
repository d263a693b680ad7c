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

//! Rolling summary document
//!
//! Append-only markdown document of past incremental summaries. Created
//! with a fixed header on first use, then grows forever: the core never
//! rewrites or truncates it (unlike the overview, which is replaced in
//! place). Each entry is reproduced in this exact wire format:
//!
//! ```text
//!
//! ---
//! ### <YYYY-MM-DD HH:MM:SS>
//! _Summarized <N> lines of new activity_
//!
//! <generated summary text>
//! ```

use crate::error::SummarizeResult;
use chrono::Local;
use lifelog_core::TIMESTAMP_FORMAT;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Header written when the document is first created.
const DOCUMENT_HEADER: &str =
    "# Activity Summary\n\nIncremental summaries of captured activity, newest last.\n";

/// Appender for the rolling summary document.
#[derive(Debug, Clone)]
pub struct RollingSummaryWriter {
    path: PathBuf,
}

impl RollingSummaryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped entry.
    pub fn append_entry(&self, lines_summarized: usize, summary: &str) -> SummarizeResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let is_new = !self.path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if is_new {
            file.write_all(DOCUMENT_HEADER.as_bytes())?;
        }

        let entry = format!(
            "\n---\n### {}\n_Summarized {} lines of new activity_\n\n{}\n",
            Local::now().format(TIMESTAMP_FORMAT),
            lines_summarized,
            summary.trim_end()
        );
        file.write_all(entry.as_bytes())?;
        Ok(())
    }
}
