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

//! The summarization cycle
//!
//! One cycle walks: load the clamped cursor, compute the pending buffer,
//! and if a transmit-ready slice exists, send it and commit. The commit
//! order matters: the rolling entry is appended first, then the cursor is
//! persisted. If the process dies between the two the same range is
//! summarized again next cycle — the design prefers a duplicate entry
//! over a silent gap. Any failure before the commit leaves the cursor
//! untouched so the next cycle retries the same (or larger) range.

use crate::client::LlmClient;
use crate::cursor::CursorStore;
use crate::error::SummarizeResult;
use crate::pending::{compute_pending, PendingStatus};
use crate::rolling::RollingSummaryWriter;
use lifelog_core::SummaryConfig;
use std::path::Path;
use tracing::{debug, info};

/// What one summarization cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing pending past the cursor.
    Idle,
    /// Pending delta too small to be worth an external call.
    BelowThreshold { pending_lines: usize },
    /// A slice was summarized and committed.
    Summarized {
        lines: usize,
        bytes_sent: u64,
        /// Capped-off bytes still pending; the next cycle picks them up.
        remaining_bytes: u64,
    },
}

/// Drives the per-cycle state machine against a pluggable [`LlmClient`].
pub struct Summarizer {
    cursor: CursorStore,
    rolling: RollingSummaryWriter,
    client: Box<dyn LlmClient>,
    min_pending_lines: usize,
    max_transmit_bytes: u64,
}

impl Summarizer {
    pub fn new(config: &SummaryConfig, client: Box<dyn LlmClient>) -> Self {
        Self {
            cursor: CursorStore::new(&config.cursor_path),
            rolling: RollingSummaryWriter::new(&config.summary_path),
            client,
            min_pending_lines: config.min_pending_lines,
            max_transmit_bytes: config.max_transmit_bytes,
        }
    }

    /// Run one cycle against the archive. Errors from the external call
    /// propagate without advancing the cursor.
    pub async fn run_cycle(&self, archive: &Path) -> SummarizeResult<CycleOutcome> {
        let archive_size = std::fs::metadata(archive).map(|m| m.len()).unwrap_or(0);
        let cursor = self.cursor.load_clamped(archive_size);
        if cursor < self.cursor.load() {
            // Rotation moved the end of the archive below the cursor.
            // Persist the clamp now, so growth after this point is
            // measured from the rotated end rather than the stale offset.
            self.cursor.store(cursor)?;
        }

        let pending = compute_pending(
            archive,
            cursor,
            self.min_pending_lines,
            self.max_transmit_bytes,
        )?;

        let buffer = match pending {
            PendingStatus::Empty => {
                debug!("Nothing pending (cursor {} of {})", cursor, archive_size);
                return Ok(CycleOutcome::Idle);
            }
            PendingStatus::BelowThreshold { pending_lines } => {
                debug!(
                    "{} pending line(s), below threshold of {}",
                    pending_lines, self.min_pending_lines
                );
                return Ok(CycleOutcome::BelowThreshold { pending_lines });
            }
            PendingStatus::Ready(buffer) => buffer,
        };

        let prompt = build_prompt(&buffer.text);
        let summary = self.client.complete(prompt).await?;

        self.rolling.append_entry(buffer.line_count, &summary)?;
        self.cursor.store(buffer.start + buffer.sent_bytes)?;

        info!(
            "Summarized {} line(s) ({} bytes) with {}, {} byte(s) still pending",
            buffer.line_count,
            buffer.sent_bytes,
            self.client.model_name(),
            buffer.remaining_bytes
        );
        Ok(CycleOutcome::Summarized {
            lines: buffer.line_count,
            bytes_sent: buffer.sent_bytes,
            remaining_bytes: buffer.remaining_bytes,
        })
    }
}

fn build_prompt(pending: &str) -> String {
    format!(
        "The following is recently captured activity from shell history, log files \
         and AI-agent transcripts. Each block starts with a `--- [source] timestamp ---` \
         header. Write a short summary (a few sentences, or a brief bullet list) of what \
         was worked on. Mention notable commands, projects, files and errors. Do not \
         repeat raw log lines.\n\n{}",
        pending
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fake capability: counts calls, optionally fails.
    struct FakeClient {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl LlmClient for FakeClient {
        async fn complete(&self, prompt: String) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.contains("recently captured activity"));
            if self.fail {
                Err(LlmError::Api("synthetic failure".to_string()))
            } else {
                Ok("A summary.".to_string())
            }
        }

        fn model_name(&self) -> &str {
            "fake"
        }
    }

    fn setup(dir: &Path, fail: bool) -> (Summarizer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = SummaryConfig {
            summary_path: dir.join("summary.md"),
            cursor_path: dir.join("summary.cursor"),
            ..SummaryConfig::default()
        };
        let client = Box::new(FakeClient {
            calls: calls.clone(),
            fail,
        });
        (Summarizer::new(&config, client), calls)
    }

    fn write_lines(path: &Path, n: usize) {
        let mut contents = String::new();
        for i in 0..n {
            contents.push_str(&format!("line {}\n", i));
        }
        std::fs::write(path, contents).unwrap();
    }

    #[tokio::test]
    async fn test_empty_archive_is_idle_without_call() {
        let dir = tempfile::tempdir().unwrap();
        let (summarizer, calls) = setup(dir.path(), false);

        let outcome = summarizer.run_cycle(&dir.path().join("archive.log")).await.unwrap();
        assert_eq!(outcome, CycleOutcome::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_below_threshold_makes_no_call() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.log");
        write_lines(&archive, 3);
        let (summarizer, calls) = setup(dir.path(), false);

        let outcome = summarizer.run_cycle(&archive).await.unwrap();
        assert_eq!(outcome, CycleOutcome::BelowThreshold { pending_lines: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        // Cursor file untouched.
        assert!(!dir.path().join("summary.cursor").exists());
    }

    #[tokio::test]
    async fn test_burst_summarized_in_one_call() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.log");
        write_lines(&archive, 200);
        let size = std::fs::metadata(&archive).unwrap().len();
        let (summarizer, calls) = setup(dir.path(), false);

        let outcome = summarizer.run_cycle(&archive).await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Summarized {
                lines: 200,
                bytes_sent: size,
                remaining_bytes: 0
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("summary.cursor")).unwrap(),
            size.to_string()
        );
        let rolling = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
        assert!(rolling.contains("_Summarized 200 lines of new activity_"));
        assert_eq!(rolling.matches("---\n### ").count(), 1);

        // Re-running with no growth is idle.
        let outcome = summarizer.run_cycle(&archive).await.unwrap();
        assert_eq!(outcome, CycleOutcome::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_leaves_cursor_and_summary_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.log");
        write_lines(&archive, 50);
        let (summarizer, calls) = setup(dir.path(), true);

        let result = summarizer.run_cycle(&archive).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!dir.path().join("summary.cursor").exists());
        assert!(!dir.path().join("summary.md").exists());
    }

    #[tokio::test]
    async fn test_capped_range_caught_up_over_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.log");
        write_lines(&archive, 500);
        let size = std::fs::metadata(&archive).unwrap().len();

        let calls = Arc::new(AtomicUsize::new(0));
        let config = SummaryConfig {
            summary_path: dir.path().join("summary.md"),
            cursor_path: dir.path().join("summary.cursor"),
            max_transmit_bytes: 1000,
            ..SummaryConfig::default()
        };
        let summarizer = Summarizer::new(
            &config,
            Box::new(FakeClient {
                calls: calls.clone(),
                fail: false,
            }),
        );

        let mut last_cursor = 0u64;
        let mut cycles = 0;
        loop {
            let outcome = summarizer.run_cycle(&archive).await.unwrap();
            let cursor: u64 = std::fs::read_to_string(dir.path().join("summary.cursor"))
                .map(|s| s.parse().unwrap())
                .unwrap_or(0);
            // Monotonic cursor across successful cycles.
            assert!(cursor >= last_cursor);
            last_cursor = cursor;
            cycles += 1;
            assert!(cycles < 100, "cap catch-up did not terminate");
            match outcome {
                CycleOutcome::Summarized { remaining_bytes, .. } if remaining_bytes > 0 => {}
                _ => break,
            }
        }
        // Fully caught up; the tail under the threshold stays pending.
        let final_outcome = summarizer.run_cycle(&archive).await.unwrap();
        assert!(matches!(
            final_outcome,
            CycleOutcome::Idle | CycleOutcome::BelowThreshold { .. }
        ));
        assert!(last_cursor <= size);
        assert!(calls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_cursor_past_rotated_archive_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.log");
        write_lines(&archive, 100);
        let (summarizer, _) = setup(dir.path(), false);
        summarizer.run_cycle(&archive).await.unwrap();

        // Rotation shrinks the archive underneath the cursor.
        write_lines(&archive, 20);

        // Clamped to the new end: rotated-away bytes count as summarized,
        // the shrunken archive is not re-summarized.
        let outcome = summarizer.run_cycle(&archive).await.unwrap();
        assert_eq!(outcome, CycleOutcome::Idle);
        let rolling = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
        assert_eq!(rolling.matches("---\n### ").count(), 1);

        // New growth past the clamped end is summarized normally.
        let mut contents = std::fs::read_to_string(&archive).unwrap();
        for i in 0..30 {
            contents.push_str(&format!("post-rotation line {}\n", i));
        }
        std::fs::write(&archive, contents).unwrap();
        let outcome = summarizer.run_cycle(&archive).await.unwrap();
        assert!(matches!(outcome, CycleOutcome::Summarized { .. }));
    }
}
