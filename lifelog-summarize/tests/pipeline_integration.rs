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

//! Full-pipeline tests: capture into the archive, rotate, and summarize
//! incrementally with a fake text-generation capability.

use async_trait::async_trait;
use lifelog_capture::{rotate_if_needed, ArchiveWriter, OffsetStore, Tailer};
use lifelog_core::{Record, Source, SummaryConfig};
use lifelog_summarize::{CycleOutcome, LlmClient, LlmError, Summarizer};
use std::io::Write;
use std::path::Path;

struct EchoLineCount;

#[async_trait]
impl LlmClient for EchoLineCount {
    async fn complete(&self, prompt: String) -> Result<String, LlmError> {
        Ok(format!("Observed {} prompt bytes of activity.", prompt.len()))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

fn summarizer(dir: &Path) -> Summarizer {
    let config = SummaryConfig {
        summary_path: dir.join("summary.md"),
        cursor_path: dir.join("summary.cursor"),
        ..SummaryConfig::default()
    };
    Summarizer::new(&config, Box::new(EchoLineCount))
}

#[tokio::test]
async fn capture_then_summarize_then_capture_again() {
    let dir = tempfile::tempdir().unwrap();
    let history = dir.path().join("bash_history");
    let archive_path = dir.path().join("archive.log");

    let mut lines = String::new();
    for i in 0..40 {
        lines.push_str(&format!("git commit -m 'change {}'\n", i));
    }
    std::fs::write(&history, &lines).unwrap();

    let source = Source::file(&history);
    let writer = ArchiveWriter::new(&archive_path, None);
    let mut tailer = Tailer::new(OffsetStore::load(dir.path().join("offsets.json")), 60);

    for chunk in tailer.poll_source(&source) {
        writer.append(&Record::new(chunk.source_name, chunk.content)).unwrap();
    }

    let summarizer = summarizer(dir.path());
    let outcome = summarizer.run_cycle(&archive_path).await.unwrap();
    let CycleOutcome::Summarized { lines: summarized, remaining_bytes, .. } = outcome else {
        panic!("expected a summarized outcome, got {:?}", outcome);
    };
    // Header line plus 40 content lines.
    assert_eq!(summarized, 41);
    assert_eq!(remaining_bytes, 0);

    // Quiet period: nothing new to summarize.
    assert_eq!(
        summarizer.run_cycle(&archive_path).await.unwrap(),
        CycleOutcome::Idle
    );

    // More activity arrives and is summarized from the cursor onward.
    let mut handle = std::fs::OpenOptions::new().append(true).open(&history).unwrap();
    for i in 0..20 {
        handle.write_all(format!("cargo test --package pkg{}\n", i).as_bytes()).unwrap();
    }
    drop(handle);
    for chunk in tailer.poll_source(&source) {
        writer.append(&Record::new(chunk.source_name, chunk.content)).unwrap();
    }

    let outcome = summarizer.run_cycle(&archive_path).await.unwrap();
    let CycleOutcome::Summarized { lines: summarized, .. } = outcome else {
        panic!("expected a summarized outcome, got {:?}", outcome);
    };
    assert_eq!(summarized, 21);

    let rolling = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert_eq!(rolling.matches("_Summarized ").count(), 2);
}

#[tokio::test]
async fn rotation_between_cycles_never_breaks_summarization() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("archive.log");
    let writer = ArchiveWriter::new(&archive_path, None);
    let summarizer = summarizer(dir.path());

    for i in 0..100 {
        writer
            .append(&Record::new("agent.jsonl", format!("event {} payload payload", i)))
            .unwrap();
    }
    assert!(matches!(
        summarizer.run_cycle(&archive_path).await.unwrap(),
        CycleOutcome::Summarized { .. }
    ));

    // Rotate hard enough to land the archive end below the cursor.
    let size = std::fs::metadata(&archive_path).unwrap().len();
    rotate_if_needed(&archive_path, size / 4).unwrap();

    // The cycle clamps and idles rather than failing or re-summarizing.
    assert_eq!(
        summarizer.run_cycle(&archive_path).await.unwrap(),
        CycleOutcome::Idle
    );

    // Fresh post-rotation activity is picked up normally.
    for i in 0..30 {
        writer
            .append(&Record::new("agent.jsonl", format!("fresh event {}", i)))
            .unwrap();
    }
    assert!(matches!(
        summarizer.run_cycle(&archive_path).await.unwrap(),
        CycleOutcome::Summarized { .. }
    ));
}
