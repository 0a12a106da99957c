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

use shtrace_common::{FunctionId, SlotId};
use thiserror::Error;

/// Errors surfaced by the [`crate::Player`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// The trace contradicts itself. The session cannot continue; reset the player,
    /// ideally with a different trace.
    #[error("corrupt trace: {0}")]
    CorruptTrace(#[from] CorruptTrace),

    /// A query named a stack frame that does not exist.
    #[error("stack frame {frame} does not exist (stack depth is {depth})")]
    FrameOutOfRange {
        /// The requested frame, 0 being the outermost call.
        frame: usize,
        /// The current stack depth.
        depth: usize,
    },
}

/// Inconsistencies detected while replaying a trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorruptTrace {
    /// Execution was asked to run past the last event.
    #[error("event {position} requested, but the trace has {len} events")]
    CursorOutOfRange {
        /// Requested event.
        position: usize,
        /// Number of events.
        len: usize,
    },

    /// A `Var` event names a slot that does not exist.
    #[error("event {position} writes slot {slot}, but the trace has {slot_count} slots")]
    SlotOutOfRange {
        /// Offending event.
        position: usize,
        /// Raw slot word.
        slot: i32,
        /// Number of slots.
        slot_count: usize,
    },

    /// An `Enter` or `Exit` event names a function that does not exist.
    #[error("event {position} references function {function}, but the trace has {function_count} functions")]
    FunctionOutOfRange {
        /// Offending event.
        position: usize,
        /// Raw function word.
        function: i32,
        /// Number of functions.
        function_count: usize,
    },

    /// An `Exit` does not match the innermost call.
    #[error("event {position} exits function {function}, but function {innermost} is innermost")]
    MismatchedExit {
        /// Offending event.
        position: usize,
        /// Function named by the `Exit`.
        function: FunctionId,
        /// Function of the top stack frame.
        innermost: FunctionId,
    },

    /// An `Exit` arrived with no call in progress.
    #[error("event {position} exits function {function} with no call in progress")]
    ExitFromGlobalFrame {
        /// Offending event.
        position: usize,
        /// Function named by the `Exit`.
        function: FunctionId,
    },

    /// A return value was written with no caller to receive it.
    #[error("event {position} writes return-value slot {slot} outside of any call")]
    ReturnValueWithoutCaller {
        /// Offending event.
        position: usize,
        /// The return-value slot.
        slot: SlotId,
    },
}
