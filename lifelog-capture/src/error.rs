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

//! Capture error types

use thiserror::Error;

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors that can occur on the ingestion path
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No usable sources at startup. Fatal: a monitor with nothing to
    /// watch would silently do nothing useful.
    #[error("No capture sources resolved; configure [sources].paths or enable auto_detect")]
    NoSources,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Offset store (de)serialization error
    #[error("Offset store error: {0}")]
    OffsetStore(String),
}

impl From<serde_json::Error> for CaptureError {
    fn from(e: serde_json::Error) -> Self {
        CaptureError::OffsetStore(e.to_string())
    }
}
