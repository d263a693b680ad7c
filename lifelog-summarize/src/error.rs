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

//! Summarization error types

use crate::client::LlmError;
use thiserror::Error;

/// Result type for summarization operations
pub type SummarizeResult<T> = Result<T, SummarizeError>;

/// Errors that can occur on the summarization path
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// External text-generation capability failed; the cursor is left
    /// unchanged and the next cycle retries the same range.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}
