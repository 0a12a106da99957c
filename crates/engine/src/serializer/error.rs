// shtrace - Shader Debug-Trace Replay
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
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

use thiserror::Error;

/// Reasons a serialized trace is rejected.
///
/// Any of these means the input is unusable as a whole; no partially read trace is
/// ever returned.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Not JSON, wrong shape, a missing required field, or a number outside its type.
    #[error("malformed trace JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input declares a format version this reader does not understand.
    #[error("unsupported trace version {found:?} (expected {expected:?})")]
    UnsupportedVersion {
        /// Version string found in the input.
        found: String,
        /// Version this reader produces.
        expected: &'static str,
    },

    /// A `slots`, `uniforms` or `functions` entry carries a negative index.
    #[error("{table} entry has negative index {index}")]
    NegativeIndex {
        /// Which table.
        table: &'static str,
        /// The offending index.
        index: i32,
    },

    /// A table index is so large that growing the table to fit it is refused.
    #[error("{table} entry index {index} exceeds the limit of {limit}")]
    IndexTooLarge {
        /// Which table.
        table: &'static str,
        /// The offending index.
        index: i32,
        /// Largest accepted table length.
        limit: usize,
    },

    /// A slot's `kind` is not a known number kind.
    #[error("{table} entry {index} has invalid kind {kind}")]
    InvalidNumberKind {
        /// Which table.
        table: &'static str,
        /// Index of the entry.
        index: i32,
        /// The raw kind value.
        kind: i32,
    },

    /// A trace entry is an empty array.
    #[error("trace entry {position} has no opcode")]
    EmptyTraceEntry {
        /// Index of the entry in the `trace` array.
        position: usize,
    },

    /// A trace entry carries more data words than an event can hold.
    #[error("trace entry {position} has {count} data words (at most {max})")]
    TooManyDataWords {
        /// Index of the entry in the `trace` array.
        position: usize,
        /// Number of data words found.
        count: usize,
        /// Maximum accepted.
        max: usize,
    },

    /// A trace entry's opcode is not a known operation.
    #[error("trace entry {position} has invalid opcode {opcode}")]
    InvalidOpcode {
        /// Index of the entry in the `trace` array.
        position: usize,
        /// The raw opcode.
        opcode: i32,
    },
}

/// Failure while writing a trace.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The JSON encoder or the underlying writer failed.
    #[error("failed to write trace JSON: {0}")]
    Json(#[from] serde_json::Error),
}
