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

use crate::{FunctionId, SlotId};

/// Violations of the trace model invariants, detected while building or validating a trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// A raw value does not name a known [`crate::TraceOp`].
    #[error("invalid trace opcode {0}")]
    InvalidOpcode(i32),

    /// A raw value does not name a known [`crate::NumberKind`].
    #[error("invalid number kind {0}")]
    InvalidNumberKind(i32),

    /// A `Var` event references a slot that was never registered.
    #[error("event {position} writes slot {slot}, but only {slot_count} slots exist")]
    SlotOutOfRange {
        /// Index of the offending event.
        position: usize,
        /// The raw slot word found in the event.
        slot: i32,
        /// Number of registered slots.
        slot_count: usize,
    },

    /// An `Enter`/`Exit` event references a function that was never registered.
    #[error("event {position} references function {function}, but only {function_count} functions exist")]
    FunctionOutOfRange {
        /// Index of the offending event.
        position: usize,
        /// The raw function word found in the event.
        function: i32,
        /// Number of registered functions.
        function_count: usize,
    },

    /// A slot claims to hold the return value of a function that does not exist.
    #[error("slot {slot} holds the return value of unknown function {function}")]
    ReturnValueOutOfRange {
        /// The slot carrying the bad flag.
        slot: SlotId,
        /// The function it points at.
        function: FunctionId,
    },

    /// An `Exit` does not match the innermost open `Enter`.
    #[error("event {position} exits function {function} while {expected:?} is innermost")]
    UnbalancedExit {
        /// Index of the offending event.
        position: usize,
        /// Function named by the `Exit`.
        function: i32,
        /// Innermost open function, if any.
        expected: Option<FunctionId>,
    },

    /// The trace ends while a function is still open.
    #[error("function {function} is entered but never exited")]
    UnterminatedCall {
        /// The innermost function left open.
        function: FunctionId,
    },
}
