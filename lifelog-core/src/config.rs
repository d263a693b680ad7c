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

//! Monitor configuration
//!
//! A single immutable [`MonitorConfig`] is built at startup (TOML file,
//! then `LIFELOG_*` environment overrides, then CLI flags) and passed by
//! parameter to every component. There is no global settings namespace.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub overview: OverviewConfig,
}

/// Archive, session log and rotation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    /// Path of the raw append-only archive.
    #[serde(default = "default_archive_path")]
    pub path: PathBuf,

    /// Maximum archive size in bytes before rotation (0 = rotation disabled).
    #[serde(default = "default_max_archive_bytes")]
    pub max_bytes: u64,

    /// Run the rotation check every Nth poll cycle.
    #[serde(default = "default_rotation_check_every")]
    pub rotation_check_every: u32,

    /// Mirror records into per-day session logs.
    #[serde(default = "default_session_logs")]
    pub session_logs: bool,

    /// Directory for `session-YYYY-MM-DD.log` files.
    #[serde(default = "default_session_log_dir")]
    pub session_log_dir: PathBuf,

    /// Persisted per-source offset store (path -> last observed size).
    #[serde(default = "default_offsets_path")]
    pub offsets_path: PathBuf,
}

/// Input source settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Explicitly configured files or directories.
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Also probe conventional locations (shell history files, agent
    /// transcript directories under `$HOME`).
    #[serde(default = "default_auto_detect")]
    pub auto_detect: bool,

    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Directory-source members are skipped unless modified within this
    /// many minutes. A liveness bound: files older than the window are
    /// logged at debug level, not captured.
    #[serde(default = "default_recency_window_mins")]
    pub recency_window_mins: u64,
}

/// Incremental summarization settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummaryConfig {
    /// Master switch for the summarization cycle.
    #[serde(default = "default_summary_enabled")]
    pub enabled: bool,

    /// Provider id: "openai" or "anthropic".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier passed to the provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key literal. Checked before `api_key_file` and the provider's
    /// conventional environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// File containing the API key as its entire contents.
    #[serde(default)]
    pub api_key_file: Option<PathBuf>,

    /// Skip the external call when fewer pending lines than this.
    #[serde(default = "default_min_pending_lines")]
    pub min_pending_lines: usize,

    /// Cap on bytes sent per cycle; the cursor only advances past bytes
    /// actually transmitted.
    #[serde(default = "default_max_transmit_bytes")]
    pub max_transmit_bytes: u64,

    /// Run the summarization check every Nth poll cycle.
    #[serde(default = "default_summary_check_every")]
    pub summary_check_every: u32,

    /// Timeout for a single summarization round trip.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Rolling summary document path.
    #[serde(default = "default_summary_path")]
    pub summary_path: PathBuf,

    /// Persisted summary cursor path.
    #[serde(default = "default_cursor_path")]
    pub cursor_path: PathBuf,
}

/// Static overview settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverviewConfig {
    #[serde(default = "default_overview_enabled")]
    pub enabled: bool,

    /// Overview document, replaced in place on each regeneration.
    #[serde(default = "default_overview_path")]
    pub path: PathBuf,

    /// Regenerate when the document is older than this many seconds.
    #[serde(default = "default_overview_interval_secs")]
    pub interval_secs: u64,

    /// Line cap for the generated document.
    #[serde(default = "default_overview_max_lines")]
    pub max_lines: usize,
}

/// Base data directory: `$XDG_DATA_HOME/lifelog` (or the platform
/// equivalent), falling back to the working directory.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lifelog")
}

fn default_archive_path() -> PathBuf {
    data_dir().join("archive.log")
}

fn default_max_archive_bytes() -> u64 {
    100 * 1024 * 1024
}

fn default_rotation_check_every() -> u32 {
    20
}

fn default_session_logs() -> bool {
    true
}

fn default_session_log_dir() -> PathBuf {
    data_dir().join("sessions")
}

fn default_offsets_path() -> PathBuf {
    data_dir().join("offsets.json")
}

fn default_auto_detect() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_recency_window_mins() -> u64 {
    60
}

fn default_summary_enabled() -> bool {
    true
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_min_pending_lines() -> usize {
    10
}

fn default_max_transmit_bytes() -> u64 {
    50 * 1024
}

fn default_summary_check_every() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_summary_path() -> PathBuf {
    data_dir().join("summary.md")
}

fn default_cursor_path() -> PathBuf {
    data_dir().join("summary.cursor")
}

fn default_overview_enabled() -> bool {
    true
}

fn default_overview_path() -> PathBuf {
    data_dir().join("overview.md")
}

fn default_overview_interval_secs() -> u64 {
    6 * 60 * 60
}

fn default_overview_max_lines() -> usize {
    400
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: default_archive_path(),
            max_bytes: default_max_archive_bytes(),
            rotation_check_every: default_rotation_check_every(),
            session_logs: default_session_logs(),
            session_log_dir: default_session_log_dir(),
            offsets_path: default_offsets_path(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            paths: vec![],
            auto_detect: default_auto_detect(),
            poll_interval_secs: default_poll_interval_secs(),
            recency_window_mins: default_recency_window_mins(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: default_summary_enabled(),
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_key_file: None,
            min_pending_lines: default_min_pending_lines(),
            max_transmit_bytes: default_max_transmit_bytes(),
            summary_check_every: default_summary_check_every(),
            request_timeout_secs: default_request_timeout_secs(),
            summary_path: default_summary_path(),
            cursor_path: default_cursor_path(),
        }
    }
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            enabled: default_overview_enabled(),
            path: default_overview_path(),
            interval_secs: default_overview_interval_secs(),
            max_lines: default_overview_max_lines(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            archive: ArchiveConfig::default(),
            sources: SourcesConfig::default(),
            summary: SummaryConfig::default(),
            overview: OverviewConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration: TOML file (if given and present), then
    /// environment overrides. A missing file falls back to defaults with
    /// a warning rather than failing, matching operator expectations for
    /// a long-running monitor.
    pub fn load(config_file: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        config.merge_with_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `LIFELOG_*` environment overrides. Env takes priority over
    /// file values; only variables that are actually set are applied.
    fn merge_with_env(&mut self) {
        if let Ok(path) = std::env::var("LIFELOG_ARCHIVE_PATH") {
            self.archive.path = PathBuf::from(path);
        }
        if let Ok(max) = std::env::var("LIFELOG_MAX_ARCHIVE_BYTES") {
            match max.parse() {
                Ok(bytes) => self.archive.max_bytes = bytes,
                Err(_) => {
                    tracing::warn!("Ignoring non-numeric LIFELOG_MAX_ARCHIVE_BYTES: {}", max)
                }
            }
        }
        if let Ok(interval) = std::env::var("LIFELOG_POLL_INTERVAL_SECS") {
            match interval.parse() {
                Ok(secs) => self.sources.poll_interval_secs = secs,
                Err(_) => {
                    tracing::warn!("Ignoring non-numeric LIFELOG_POLL_INTERVAL_SECS: {}", interval)
                }
            }
        }
        if let Ok(enabled) = std::env::var("LIFELOG_SUMMARY_ENABLED") {
            self.summary.enabled = matches!(enabled.as_str(), "1" | "true" | "yes");
        }
        if let Ok(model) = std::env::var("LIFELOG_MODEL") {
            self.summary.model = model;
        }
        if let Ok(provider) = std::env::var("LIFELOG_PROVIDER") {
            self.summary.provider = provider;
        }
    }

    /// Reject configurations the monitor cannot run with.
    fn validate(&self) -> ConfigResult<()> {
        if self.sources.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sources.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.archive.rotation_check_every == 0 {
            return Err(ConfigError::Invalid(
                "archive.rotation_check_every must be at least 1".to_string(),
            ));
        }
        if self.summary.summary_check_every == 0 {
            return Err(ConfigError::Invalid(
                "summary.summary_check_every must be at least 1".to_string(),
            ));
        }
        if self.summary.enabled && self.summary.max_transmit_bytes == 0 {
            return Err(ConfigError::Invalid(
                "summary.max_transmit_bytes must be nonzero when summarization is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
