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

//! Static overview generation
//!
//! Unlike the rolling summary, the overview is a whole-archive digest that
//! is replaced in place. The core's responsibility is small: track the
//! document's age, and when it goes stale feed the full archive to an
//! [`OverviewGenerator`]. The generator itself is a collaborator boundary;
//! [`PatternOverview`] is the built-in implementation, a plain pattern
//! extractor (directories, files, command tallies, recent tail) with a
//! fixed line cap.

use crate::error::SummarizeResult;
use lifelog_core::{atomic_write, OverviewConfig, Record};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Collaborator boundary: full archive text in, overview document out.
pub trait OverviewGenerator: Send + Sync {
    fn generate(&self, archive_text: &str) -> String;
}

/// Built-in pattern-extraction overview.
pub struct PatternOverview {
    max_lines: usize,
    dir_pattern: Regex,
    file_pattern: Regex,
}

/// How many of each extracted item the overview lists.
const TOP_N: usize = 20;
/// Recent raw lines shown at the bottom of the document.
const TAIL_LINES: usize = 40;

impl PatternOverview {
    pub fn new(max_lines: usize) -> Self {
        Self {
            max_lines,
            // Absolute or home-relative paths ending in a directory-ish
            // component.
            dir_pattern: Regex::new(r"(?:^|\s)((?:~|/)[\w@.+-]+(?:/[\w@.+-]+)+)/?").unwrap(),
            // Tokens that look like file names with an extension.
            file_pattern: Regex::new(r"\b([\w-]+\.[A-Za-z0-9]{1,8})\b").unwrap(),
        }
    }

    fn tally<'a>(iter: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in iter {
            *counts.entry(item).or_insert(0) += 1;
        }
        let mut sorted: Vec<(String, usize)> =
            counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.truncate(TOP_N);
        sorted
    }

    /// First token of content lines that looks like a command name.
    fn command_tally(content_lines: &[&str]) -> Vec<(String, usize)> {
        Self::tally(content_lines.iter().filter_map(|line| {
            let first = line.split_whitespace().next()?;
            let plausible = first.len() >= 2
                && first.len() <= 24
                && first
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
            plausible.then_some(first)
        }))
    }
}

impl OverviewGenerator for PatternOverview {
    fn generate(&self, archive_text: &str) -> String {
        let content_lines: Vec<&str> = archive_text
            .lines()
            .filter(|line| !Record::is_header_line(line))
            .collect();

        let dirs = Self::tally(
            content_lines
                .iter()
                .flat_map(|line| self.dir_pattern.captures_iter(line))
                .filter_map(|cap| cap.get(1).map(|m| m.as_str())),
        );
        let files = Self::tally(
            content_lines
                .iter()
                .flat_map(|line| self.file_pattern.captures_iter(line))
                .filter_map(|cap| cap.get(1).map(|m| m.as_str())),
        );
        let commands = Self::command_tally(&content_lines);

        let mut out = String::from("# Activity Overview\n");
        push_section(&mut out, "Directories", &dirs);
        push_section(&mut out, "Files", &files);
        push_section(&mut out, "Commands", &commands);

        out.push_str("\n## Recent activity\n");
        let tail_start = content_lines.len().saturating_sub(TAIL_LINES);
        for line in &content_lines[tail_start..] {
            out.push_str(line);
            out.push('\n');
        }

        // Hard cap with an explicit truncation marker.
        let lines: Vec<&str> = out.lines().collect();
        if lines.len() > self.max_lines {
            let mut capped = lines[..self.max_lines].join("\n");
            capped.push_str("\n… (truncated)\n");
            capped
        } else {
            out
        }
    }
}

fn push_section(out: &mut String, title: &str, items: &[(String, usize)]) {
    out.push_str(&format!("\n## {}\n", title));
    if items.is_empty() {
        out.push_str("(none)\n");
    }
    for (item, count) in items {
        out.push_str(&format!("- {} ({})\n", item, count));
    }
}

/// Tracks staleness and drives regeneration.
pub struct OverviewTask {
    config: OverviewConfig,
    generator: Box<dyn OverviewGenerator>,
}

impl OverviewTask {
    pub fn new(config: OverviewConfig) -> Self {
        let generator = Box::new(PatternOverview::new(config.max_lines));
        Self::with_generator(config, generator)
    }

    pub fn with_generator(config: OverviewConfig, generator: Box<dyn OverviewGenerator>) -> Self {
        Self { config, generator }
    }

    /// Whether the overview document is missing or older than the
    /// configured interval.
    pub fn is_stale(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        let age = std::fs::metadata(&self.config.path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|mtime| SystemTime::now().duration_since(mtime).ok());
        match age {
            Some(age) => age > Duration::from_secs(self.config.interval_secs),
            // Missing document (or unreadable mtime): regenerate.
            None => true,
        }
    }

    /// Regenerate if stale, replacing the document atomically. Returns
    /// whether a regeneration happened.
    pub fn regenerate_if_stale(&self, archive: &Path) -> SummarizeResult<bool> {
        if !self.is_stale() {
            return Ok(false);
        }
        let archive_text = match std::fs::read_to_string(archive) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(false);
            }
            Err(err) => {
                warn!("Failed to read archive for overview: {}", err);
                return Err(err.into());
            }
        };
        let document = self.generator.generate(&archive_text);
        atomic_write(&self.config.path, document.as_bytes())?;
        info!("Regenerated overview at {:?}", self.config.path);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_archive() -> String {
        let mut text = String::new();
        for i in 0..3 {
            text.push_str(&format!("--- [bash_history] 2025-03-14 09:2{}:00 ---\n", i));
            text.push_str("cd /home/user/projects/lifelog\n");
            text.push_str("cargo test --workspace\n");
            text.push_str("vim src/main.rs\n");
        }
        text
    }

    #[test]
    fn test_pattern_overview_extracts_sections() {
        let overview = PatternOverview::new(400).generate(&sample_archive());
        assert!(overview.starts_with("# Activity Overview\n"));
        assert!(overview.contains("- /home/user/projects/lifelog (3)"));
        assert!(overview.contains("- main.rs (3)"));
        assert!(overview.contains("- cargo (3)"));
        assert!(overview.contains("- cd (3)"));
        // Header lines are not treated as activity.
        assert!(!overview.contains("## Recent activity\n--- ["));
    }

    #[test]
    fn test_line_cap_with_marker() {
        let mut text = String::new();
        for i in 0..500 {
            text.push_str(&format!("command-{} /some/path/dir{}\n", i, i));
        }
        let overview = PatternOverview::new(50).generate(&text);
        assert!(overview.lines().count() <= 51);
        assert!(overview.ends_with("… (truncated)\n"));
    }

    #[test]
    fn test_regenerate_and_staleness() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.log");
        std::fs::write(&archive, sample_archive()).unwrap();

        let config = OverviewConfig {
            enabled: true,
            path: dir.path().join("overview.md"),
            interval_secs: 3600,
            max_lines: 400,
        };
        let task = OverviewTask::new(config.clone());

        // Missing document is stale; regeneration writes it.
        assert!(task.is_stale());
        assert!(task.regenerate_if_stale(&archive).unwrap());
        assert!(std::fs::read_to_string(&config.path)
            .unwrap()
            .starts_with("# Activity Overview"));

        // Fresh document is not stale; nothing rewritten.
        assert!(!task.is_stale());
        assert!(!task.regenerate_if_stale(&archive).unwrap());
    }

    #[test]
    fn test_disabled_is_never_stale() {
        let dir = tempfile::tempdir().unwrap();
        let config = OverviewConfig {
            enabled: false,
            path: dir.path().join("overview.md"),
            interval_secs: 0,
            max_lines: 400,
        };
        assert!(!OverviewTask::new(config).is_stale());
    }

    #[test]
    fn test_missing_archive_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let config = OverviewConfig {
            enabled: true,
            path: dir.path().join("overview.md"),
            interval_secs: 3600,
            max_lines: 400,
        };
        let task = OverviewTask::new(config);
        assert!(!task.regenerate_if_stale(&dir.path().join("archive.log")).unwrap());
    }
}
