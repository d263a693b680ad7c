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

//! Lifelog Summarize
//!
//! The incremental summarization path: a persisted byte cursor marks how
//! far into the raw archive summaries have progressed; each cycle the
//! not-yet-summarized range is extracted, capped, sent to an external
//! text-generation capability, and the result appended to the rolling
//! summary document. The cursor only advances after a successful call,
//! and only by the bytes actually transmitted, so failures retry the same
//! range and capped bytes are caught up on later cycles.
//!
//! The static overview lives here too: a collaborator trait plus a
//! built-in pattern extractor, regenerated whenever the document goes
//! stale.

pub mod client;
pub mod cursor;
pub mod error;
pub mod overview;
pub mod pending;
pub mod rolling;
pub mod summarizer;

pub use client::{build_client, AnthropicClient, LlmClient, LlmError, OpenAiClient};
pub use cursor::CursorStore;
pub use error::{SummarizeError, SummarizeResult};
pub use overview::{OverviewGenerator, OverviewTask, PatternOverview};
pub use pending::{compute_pending, PendingBuffer, PendingStatus};
pub use rolling::RollingSummaryWriter;
pub use summarizer::{CycleOutcome, Summarizer};
