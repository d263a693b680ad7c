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

//! Source registry
//!
//! Resolves configured and auto-detected input paths into the concrete
//! list of sources to poll. The list is ephemeral: it is recomputed every
//! cycle, so sources that appear after startup (a new shell history file,
//! a new transcript directory) are picked up without a restart.

use crate::error::{CaptureError, CaptureResult};
use lifelog_core::{Source, SourcesConfig};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Resolves the set of sources to poll.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    explicit: Vec<PathBuf>,
    auto_detect: bool,
}

impl SourceRegistry {
    pub fn from_config(config: &SourcesConfig) -> Self {
        Self {
            explicit: config.paths.clone(),
            auto_detect: config.auto_detect,
        }
    }

    /// Resolve the current source list. Explicitly configured paths that
    /// do not exist are skipped with a warning; auto-detected candidates
    /// are probed silently. Returns [`CaptureError::NoSources`] when
    /// nothing resolves, which the caller treats as fatal at startup.
    pub fn resolve(&self) -> CaptureResult<Vec<Source>> {
        let mut seen = BTreeSet::new();
        let mut sources = Vec::new();

        for path in &self.explicit {
            match Source::from_path(path) {
                Some(source) => {
                    if seen.insert(source.path.clone()) {
                        sources.push(source);
                    }
                }
                None => warn!("Configured source {:?} does not exist, skipping", path),
            }
        }

        if self.auto_detect {
            for path in Self::auto_detect_candidates() {
                if let Some(source) = Source::from_path(&path) {
                    if seen.insert(source.path.clone()) {
                        debug!("Auto-detected source {:?}", source.path);
                        sources.push(source);
                    }
                }
            }
        }

        if sources.is_empty() {
            return Err(CaptureError::NoSources);
        }
        // Resolution runs every poll cycle, so keep the happy path quiet.
        debug!("Resolved {} capture source(s)", sources.len());
        Ok(sources)
    }

    /// Conventional locations probed when auto-detection is enabled:
    /// shell history files and agent transcript directories under `$HOME`.
    fn auto_detect_candidates() -> Vec<PathBuf> {
        let Some(home) = dirs::home_dir() else {
            return Vec::new();
        };
        vec![
            home.join(".bash_history"),
            home.join(".zsh_history"),
            home.join(".local/share/fish/fish_history"),
            home.join(".claude/projects"),
            home.join(".codex/sessions"),
        ]
    }
}
