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

//! Lifelog Capture
//!
//! The synchronous ingestion path: resolve sources, tail newly-appended
//! bytes, append well-formed records to the raw archive (and per-day
//! session logs), and keep the archive inside its size bound via
//! header-aligned rotation.
//!
//! ```text
//! SourceRegistry -> Tailer -> ArchiveWriter -> (RotationManager watches size)
//!                     |
//!                OffsetStore (persisted path -> byte offset)
//! ```
//!
//! Everything here is plain `std::fs` I/O driven by the single-threaded
//! monitor loop. The archive append path assumes a single writer process;
//! that assumption is operational, not enforced by a lock.

pub mod archive;
pub mod error;
pub mod offsets;
pub mod registry;
pub mod rotation;
pub mod tailer;

pub use archive::ArchiveWriter;
pub use error::{CaptureError, CaptureResult};
pub use offsets::OffsetStore;
pub use registry::SourceRegistry;
pub use rotation::{rotate_if_needed, RotationOutcome};
pub use tailer::{Tailer, TailedChunk};
