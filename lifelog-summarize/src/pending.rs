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

//! Pending-buffer computation
//!
//! The pending buffer is the byte range `[cursor, archive_size)` of the
//! raw archive, capped to the maximum transmit size. The cap is aligned
//! back to the last newline inside it so a partial line is never sent;
//! whatever falls beyond the cap stays pending for the next cycle, since
//! the cursor advances only by bytes actually transmitted.

use crate::error::SummarizeResult;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// A transmit-ready slice of the archive.
#[derive(Debug, Clone)]
pub struct PendingBuffer {
    /// Archive offset the slice starts at (the effective cursor).
    pub start: u64,
    /// Bytes to transmit; the cursor advances by exactly this much on
    /// success.
    pub sent_bytes: u64,
    /// Pending bytes beyond the cap, left for later cycles.
    pub remaining_bytes: u64,
    /// Number of lines in `text`.
    pub line_count: usize,
    /// The capped pending content, lossily decoded as UTF-8.
    pub text: String,
}

/// Outcome of a pending-buffer computation.
#[derive(Debug, Clone)]
pub enum PendingStatus {
    /// Nothing past the cursor (or no archive yet).
    Empty,
    /// Fewer pending lines than the configured minimum; not worth an
    /// external call.
    BelowThreshold { pending_lines: usize },
    /// A capped slice ready to transmit.
    Ready(PendingBuffer),
}

/// Compute the pending buffer for one cycle. `cursor` must already be
/// clamped to the archive size.
pub fn compute_pending(
    archive: &Path,
    cursor: u64,
    min_lines: usize,
    max_transmit_bytes: u64,
) -> SummarizeResult<PendingStatus> {
    let size = match std::fs::metadata(archive) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(PendingStatus::Empty)
        }
        Err(err) => return Err(err.into()),
    };
    if size <= cursor {
        return Ok(PendingStatus::Empty);
    }

    let pending_len = size - cursor;
    // Only the capped window is ever transmitted, so only that much is
    // read. Reading exactly to the cap is also enough for the threshold
    // check: a window that fills the cap always has at least min_lines.
    let window_len = pending_len.min(max_transmit_bytes);

    let mut file = File::open(archive)?;
    file.seek(SeekFrom::Start(cursor))?;
    let mut buf = Vec::with_capacity(window_len as usize);
    file.take(window_len).read_to_end(&mut buf)?;

    let capped = pending_len > window_len;
    let sent_len = if capped {
        // Align the cut back to the last whole line. A single line longer
        // than the cap is sent as-is, mid-line, rather than stalling the
        // cursor forever.
        match buf.iter().rposition(|b| *b == b'\n') {
            Some(last_newline) => last_newline + 1,
            None => buf.len(),
        }
    } else {
        buf.len()
    };
    buf.truncate(sent_len);

    let text = String::from_utf8_lossy(&buf).into_owned();
    let line_count = text.lines().count();

    if !capped && line_count < min_lines {
        return Ok(PendingStatus::BelowThreshold {
            pending_lines: line_count,
        });
    }

    Ok(PendingStatus::Ready(PendingBuffer {
        start: cursor,
        sent_bytes: sent_len as u64,
        remaining_bytes: pending_len - sent_len as u64,
        line_count,
        text,
    }))
}
