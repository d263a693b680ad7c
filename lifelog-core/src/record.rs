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

//! Archive record wire format
//!
//! The raw archive and the per-day session logs are ordered sequences of
//! records. A record is one header line followed by raw content lines,
//! terminated by the next header or end-of-file:
//!
//! ```text
//! --- [<source-basename>] <YYYY-MM-DD HH:MM:SS> ---
//! <raw content line 1>
//! <raw content line 2>
//! ```
//!
//! The header line is the only framing in the format, so both the rotation
//! manager and the overview generator rely on [`Record::is_header_line`] to
//! find record boundaries. The format must be reproduced byte-for-byte for
//! compatibility with existing archives.

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Every record header starts with this prefix.
pub const HEADER_PREFIX: &str = "--- [";
/// Every record header ends with this suffix.
pub const HEADER_SUFFIX: &str = " ---";
/// Timestamp format used in record headers and rolling summary entries.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One timestamped, source-tagged unit of captured content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Basename of the source the content was read from.
    pub source: String,
    /// Local capture time.
    pub timestamp: DateTime<Local>,
    /// Raw captured bytes, line-oriented, not necessarily newline-terminated.
    pub content: String,
}

impl Record {
    /// Create a record stamped with the current local time.
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            timestamp: Local::now(),
            content: content.into(),
        }
    }

    /// Render the header line, without a trailing newline.
    pub fn header(&self) -> String {
        format!(
            "{}{}] {}{}",
            HEADER_PREFIX,
            self.source,
            self.timestamp.format(TIMESTAMP_FORMAT),
            HEADER_SUFFIX
        )
    }

    /// Render the full record: header line plus content, always
    /// newline-terminated so the next append starts on a fresh line.
    pub fn render(&self) -> String {
        let mut out = self.header();
        out.push('\n');
        out.push_str(&self.content);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    /// Whether a line is a record header.
    ///
    /// The check is shape-based (prefix + `] ` separator + suffix) rather
    /// than a full timestamp parse, since rotation only needs to locate a
    /// boundary, not validate it.
    pub fn is_header_line(line: &str) -> bool {
        let line = line.trim_end_matches(['\r', '\n']);
        line.starts_with(HEADER_PREFIX)
            && line.ends_with(HEADER_SUFFIX)
            && line[HEADER_PREFIX.len()..line.len() - HEADER_SUFFIX.len()].contains("] ")
    }

    /// Parse a header line into (source, timestamp). Returns `None` for
    /// non-header lines or headers with an unparseable timestamp.
    pub fn parse_header(line: &str) -> Option<(String, DateTime<Local>)> {
        if !Self::is_header_line(line) {
            return None;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        let inner = &line[HEADER_PREFIX.len()..line.len() - HEADER_SUFFIX.len()];
        // Source basenames may themselves contain "] ", so split on the
        // last occurrence: the timestamp never contains it.
        let split = inner.rfind("] ")?;
        let source = &inner[..split];
        let stamp = &inner[split + 2..];
        let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        let local = naive.and_local_timezone(Local).single()?;
        Some((source.to_string(), local))
    }
}
