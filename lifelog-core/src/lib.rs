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

//! Lifelog Core
//!
//! Fundamental types shared across the capture and summarization paths:
//! the archive record format, source descriptors, and the monitor
//! configuration loaded once at startup and passed by value everywhere.

pub mod config;
pub mod error;
pub mod fsutil;
pub mod record;
pub mod source;

pub use config::{
    ArchiveConfig, MonitorConfig, OverviewConfig, SourcesConfig, SummaryConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use fsutil::atomic_write;
pub use record::{Record, HEADER_PREFIX, HEADER_SUFFIX, TIMESTAMP_FORMAT};
pub use source::{Source, SourceKind};
