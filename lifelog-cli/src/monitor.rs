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

//! The monitor loop: poll sources, append to the archive, and every Nth
//! cycle run rotation and the summarization state machine. Everything is
//! cooperative on one task; a slow summarization call delays the next
//! poll rather than racing it.

use anyhow::{Context, Result};
use lifelog_capture::{
    rotate_if_needed, ArchiveWriter, OffsetStore, RotationOutcome, SourceRegistry, Tailer,
};
use lifelog_core::{MonitorConfig, Record};
use lifelog_summarize::{build_client, CycleOutcome, OverviewTask, Summarizer};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Run the monitor loop until Ctrl-C (or once, with `--once`).
pub async fn run(config: MonitorConfig, once: bool) -> Result<()> {
    let registry = SourceRegistry::from_config(&config.sources);
    // A monitor with nothing to watch at startup is a misconfiguration;
    // mid-run the list is recomputed every cycle and may be transiently
    // empty without killing the loop.
    let sources = registry.resolve().context("no capture sources available")?;
    info!("Monitoring {} source(s)", sources.len());
    for source in &sources {
        debug!("Source: {:?}", source);
    }

    let offsets = OffsetStore::load(&config.archive.offsets_path);
    let mut tailer = Tailer::new(offsets, config.sources.recency_window_mins);

    let session_log_dir = config
        .archive
        .session_logs
        .then(|| config.archive.session_log_dir.clone());
    let writer = ArchiveWriter::new(&config.archive.path, session_log_dir);

    let summarizer = if config.summary.enabled {
        match build_client(&config.summary) {
            Ok(client) => {
                info!(
                    "Summarization enabled ({} / {})",
                    config.summary.provider,
                    client.model_name()
                );
                Some(Summarizer::new(&config.summary, client))
            }
            Err(err) => {
                warn!("Summarization unavailable, capturing only: {}", err);
                None
            }
        }
    } else {
        info!("Summarization disabled");
        None
    };
    let overview = OverviewTask::new(config.overview.clone());

    let poll_interval = Duration::from_secs(config.sources.poll_interval_secs);
    let mut cycle: u64 = 0;

    loop {
        cycle += 1;
        capture_cycle(&mut tailer, &writer, &registry);

        if cycle % u64::from(config.archive.rotation_check_every) == 0 {
            match rotate_if_needed(writer.archive_path(), config.archive.max_bytes) {
                Ok(RotationOutcome::Rotated { old_size, new_size }) => {
                    info!("Rotated archive: {} -> {} bytes", old_size, new_size);
                }
                Ok(RotationOutcome::Skipped) => {}
                Err(err) => error!("Rotation check failed: {}", err),
            }
        }

        if cycle % u64::from(config.summary.summary_check_every) == 0 {
            if let Some(summarizer) = &summarizer {
                summarize_cycle(summarizer, &config).await;
            }
            match overview.regenerate_if_stale(writer.archive_path()) {
                Ok(true) => info!("Regenerated overview"),
                Ok(false) => {}
                Err(err) => error!("Overview regeneration failed: {}", err),
            }
        }

        if once {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    if let Err(err) = tailer.flush_offsets() {
        warn!("Failed to flush offsets on shutdown: {}", err);
    }
    Ok(())
}

/// Poll every source and append whatever grew. The source list is
/// recomputed each cycle, so files and directories that appear after
/// startup are picked up without a restart. Per-source failures are
/// logged and skipped; one unreadable file must not stall the others.
fn capture_cycle(tailer: &mut Tailer, writer: &ArchiveWriter, registry: &SourceRegistry) {
    let sources = match registry.resolve() {
        Ok(sources) => sources,
        Err(err) => {
            // Sources can vanish mid-run (deleted logs, unmounted home).
            warn!("No sources this cycle: {}", err);
            return;
        }
    };

    let mut appended = 0usize;
    for source in &sources {
        for chunk in tailer.poll_source(source) {
            let record = Record::new(chunk.source_name, chunk.content);
            match writer.append(&record) {
                Ok(_) => appended += 1,
                Err(err) => error!("Failed to archive chunk from {:?}: {}", chunk.path, err),
            }
        }
    }
    if appended > 0 {
        info!("Archived {} record(s)", appended);
    }
    if let Err(err) = tailer.flush_offsets() {
        warn!("Failed to persist offsets: {}", err);
    }
}

/// One summarization attempt inside the monitor loop. Errors are logged
/// and the loop carries on; the cursor never moves on failure, so the
/// same window is retried next time.
async fn summarize_cycle(summarizer: &Summarizer, config: &MonitorConfig) {
    match summarizer.run_cycle(&config.archive.path).await {
        Ok(CycleOutcome::Summarized {
            lines,
            bytes_sent,
            remaining_bytes,
        }) => {
            info!(
                "Summarized {} line(s) ({} bytes, {} still pending)",
                lines, bytes_sent, remaining_bytes
            );
        }
        Ok(CycleOutcome::BelowThreshold { pending_lines }) => {
            debug!("{} pending line(s), waiting for more", pending_lines);
        }
        Ok(CycleOutcome::Idle) => {}
        Err(err) => error!("Summarization cycle failed: {}", err),
    }
}

/// `lifelog summarize`: one cycle as a standalone process. Unlike the
/// monitor loop, missing credentials are fatal here because the user
/// asked for a summary explicitly.
pub async fn summarize_once(config: MonitorConfig) -> Result<()> {
    let client = build_client(&config.summary).context("cannot build summarization client")?;
    let summarizer = Summarizer::new(&config.summary, client);

    match summarizer.run_cycle(&config.archive.path).await? {
        CycleOutcome::Summarized {
            lines,
            bytes_sent,
            remaining_bytes,
        } => {
            println!(
                "Summarized {} line(s) ({} bytes sent, {} bytes still pending)",
                lines, bytes_sent, remaining_bytes
            );
        }
        CycleOutcome::BelowThreshold { pending_lines } => {
            println!(
                "Only {} pending line(s), below the threshold of {}",
                pending_lines, config.summary.min_pending_lines
            );
        }
        CycleOutcome::Idle => println!("Nothing pending past the summary cursor"),
    }
    Ok(())
}

/// `lifelog status`: archive size, cursor position and tracked sources.
pub fn status(config: &MonitorConfig) -> Result<()> {
    let archive_size = std::fs::metadata(&config.archive.path)
        .map(|m| m.len())
        .unwrap_or(0);
    let cursor = lifelog_summarize::CursorStore::new(&config.summary.cursor_path)
        .load()
        .min(archive_size);
    let offsets = OffsetStore::load(&config.archive.offsets_path);

    println!("Archive:          {:?}", config.archive.path);
    println!("Archive size:     {} bytes", archive_size);
    println!("Summary cursor:   {} bytes", cursor);
    println!("Pending:          {} bytes", archive_size - cursor);
    println!("Tracked sources:  {}", offsets.len());
    println!("Rolling summary:  {:?}", config.summary.summary_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifelog_core::SourcesConfig;

    #[test]
    fn test_sources_appearing_mid_run_are_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let history = dir.path().join("bash_history");
        std::fs::write(&history, "ls\n").unwrap();
        let late = dir.path().join("zsh_history");

        let config = SourcesConfig {
            paths: vec![history.clone(), late.clone()],
            auto_detect: false,
            ..SourcesConfig::default()
        };
        let registry = SourceRegistry::from_config(&config);
        let writer = ArchiveWriter::new(dir.path().join("archive.log"), None);
        let mut tailer = Tailer::new(OffsetStore::load(dir.path().join("offsets.json")), 60);

        capture_cycle(&mut tailer, &writer, &registry);
        let archive = std::fs::read_to_string(writer.archive_path()).unwrap();
        assert!(archive.contains("ls"));

        // A configured file that did not exist at startup appears later
        // and is captured without a restart.
        std::fs::write(&late, "cargo run\n").unwrap();
        capture_cycle(&mut tailer, &writer, &registry);
        let archive = std::fs::read_to_string(writer.archive_path()).unwrap();
        assert!(archive.contains("cargo run"));
    }

    #[test]
    fn test_cycle_with_no_resolvable_sources_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let config = SourcesConfig {
            paths: vec![dir.path().join("never_created")],
            auto_detect: false,
            ..SourcesConfig::default()
        };
        let registry = SourceRegistry::from_config(&config);
        let writer = ArchiveWriter::new(dir.path().join("archive.log"), None);
        let mut tailer = Tailer::new(OffsetStore::load(dir.path().join("offsets.json")), 60);

        capture_cycle(&mut tailer, &writer, &registry);
        assert!(!writer.archive_path().exists());
    }
}
